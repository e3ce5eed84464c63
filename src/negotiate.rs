//! Resolution and frame rate negotiation.
//!
//! [`resolve`] matches a user request against a [`ModeCatalog`]. It never
//! fails: unavailable values fall back deterministically, and every fallback
//! is logged and recorded in [`Negotiated::fallbacks`].

use std::fmt;
use std::str::FromStr;

use crate::modes::{FrameRate, ModeCatalog, Resolution, VideoMode};

/// Requested resolution: `auto` or an explicit size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionRequest {
    #[default]
    Auto,
    Exact(Resolution),
}

impl FromStr for ResolutionRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(ResolutionRequest::Auto)
        } else {
            s.parse().map(ResolutionRequest::Exact)
        }
    }
}

impl fmt::Display for ResolutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionRequest::Auto => f.write_str("auto"),
            ResolutionRequest::Exact(r) => r.fmt(f),
        }
    }
}

/// Requested frame rate: `auto` or an explicit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameRateRequest {
    #[default]
    Auto,
    Exact(FrameRate),
}

impl FromStr for FrameRateRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(FrameRateRequest::Auto)
        } else {
            s.parse().map(FrameRateRequest::Exact)
        }
    }
}

impl fmt::Display for FrameRateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameRateRequest::Auto => f.write_str("auto"),
            FrameRateRequest::Exact(r) => r.fmt(f),
        }
    }
}

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeRequest {
    pub resolution: ResolutionRequest,
    pub frame_rate: FrameRateRequest,
}

/// A requested value that could not be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The catalog is the synthetic stand-in for a failed device query
    SyntheticCatalog,
    Resolution {
        requested: Resolution,
        chosen: Resolution,
    },
    FrameRate {
        requested: FrameRate,
        chosen: FrameRate,
        resolution: Resolution,
    },
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::SyntheticCatalog => write!(
                f,
                "Device reported no supported modes; using {}",
                VideoMode::synthetic()
            ),
            Fallback::Resolution { requested, chosen } => write!(
                f,
                "Resolution {} is not available; using {}",
                requested, chosen
            ),
            Fallback::FrameRate {
                requested,
                chosen,
                resolution,
            } => write!(
                f,
                "Frame rate {} fps is not available at {}; using {} fps",
                requested, resolution, chosen
            ),
        }
    }
}

/// Outcome of negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub mode: VideoMode,
    pub fallbacks: Vec<Fallback>,
}

impl Negotiated {
    /// True if the result matches the request without any substitution.
    pub fn is_exact(&self) -> bool {
        self.fallbacks.is_empty()
    }
}

/// Resolve `request` against `catalog`.
pub fn resolve(request: &ModeRequest, catalog: &ModeCatalog) -> Negotiated {
    let mut fallbacks = Vec::new();

    if catalog.is_fallback() {
        fallbacks.push(Fallback::SyntheticCatalog);
    }

    let resolution = match request.resolution {
        ResolutionRequest::Auto => catalog.largest_resolution(),
        ResolutionRequest::Exact(requested) if catalog.contains_resolution(requested) => requested,
        ResolutionRequest::Exact(requested) => {
            let chosen = catalog.largest_resolution();
            fallbacks.push(Fallback::Resolution { requested, chosen });
            chosen
        }
    };

    let rates = catalog.frame_rates_for(resolution);
    let frame_rate = match request.frame_rate {
        FrameRateRequest::Auto => {
            if rates.contains(&FrameRate::THIRTY) {
                FrameRate::THIRTY
            } else {
                rates.iter().copied().max().unwrap_or(FrameRate::THIRTY)
            }
        }
        FrameRateRequest::Exact(requested) if rates.contains(&requested) => requested,
        FrameRateRequest::Exact(requested) => {
            let chosen = rates.first().copied().unwrap_or(FrameRate::THIRTY);
            fallbacks.push(Fallback::FrameRate {
                requested,
                chosen,
                resolution,
            });
            chosen
        }
    };

    for fallback in &fallbacks {
        log::warn!("{}", fallback);
    }

    Negotiated {
        mode: VideoMode::new(resolution, frame_rate),
        fallbacks,
    }
}
