//! CLI argument parsing with clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::FalseyValueParser;
use clap::{ArgGroup, Parser, Subcommand};

use screenrec::config::Overrides;
use screenrec::negotiate::{FrameRateRequest, ResolutionRequest};
use screenrec::selection::SelectionMode;

/// Parse `auto` or WIDTHxHEIGHT
fn parse_resolution(s: &str) -> Result<ResolutionRequest, String> {
    s.parse()
}

/// Parse `auto` or a positive frame rate
fn parse_framerate(s: &str) -> Result<FrameRateRequest, String> {
    s.parse()
}

/// Parse a duration given as SS, MM:SS or HH:MM:SS (seconds may be fractional)
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let invalid = || format!("Invalid duration '{}'. Use SS, MM:SS or HH:MM:SS", s);

    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }

    let (whole, seconds) = parts.split_at(parts.len() - 1);
    let seconds: f64 = seconds[0].parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 || (!whole.is_empty() && seconds >= 60.0) {
        return Err(invalid());
    }

    let mut total = 0u64;
    for (i, part) in whole.iter().enumerate() {
        let value: u64 = part.parse().map_err(|_| invalid())?;
        // Minutes must stay below 60 when hours are given
        if i > 0 && value >= 60 {
            return Err(invalid());
        }
        total = total
            .checked_mul(60)
            .and_then(|t| t.checked_add(value))
            .ok_or_else(invalid)?;
    }

    let whole_secs = total.checked_mul(60).ok_or_else(invalid)?;
    let duration = Duration::try_from_secs_f64(seconds)
        .ok()
        .and_then(|fraction| Duration::from_secs(whole_secs).checked_add(fraction))
        .ok_or_else(invalid)?;
    if duration.is_zero() {
        return Err("Duration must be greater than 0".to_string());
    }
    Ok(duration)
}

/// Configure and launch AVFoundation screen recordings
#[derive(Parser, Debug)]
#[command(name = "screenrec")]
#[command(version, about = "Configure and launch screen recordings with FFmpeg")]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "EXAMPLES:
    # Record the default screen device, negotiating size and frame rate
    screenrec -o demo.mp4

    # Pick a monitor from a menu, record 30 seconds with microphone 0
    screenrec --monitor -a 0 -t 30

    # Drag out an area and record it with HEVC
    screenrec --area -c hevc_videotoolbox -q 65

    # Show the FFmpeg command instead of running it
    screenrec --window --dry-run")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub record: RecordArgs,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
#[command(group(
    ArgGroup::new("selection")
        .args(["monitor", "area", "window"])
        .multiple(false)
))]
pub struct RecordArgs {
    /// Output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Video device index (see list-devices)
    #[arg(short, long)]
    pub device: Option<u32>,

    /// Audio device index or name
    #[arg(short, long)]
    pub audio: Option<String>,

    /// Capture resolution: auto or WIDTHxHEIGHT
    #[arg(short, long, value_parser = parse_resolution)]
    pub resolution: Option<ResolutionRequest>,

    /// Capture frame rate: auto or frames per second
    #[arg(short, long, value_parser = parse_framerate)]
    pub framerate: Option<FrameRateRequest>,

    /// Quality scalar for codecs other than libx264
    #[arg(short, long)]
    pub quality: Option<u32>,

    /// Constant rate factor for libx264 (0-51)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=51))]
    pub crf: Option<u8>,

    /// FFmpeg video encoder
    #[arg(short, long)]
    pub codec: Option<String>,

    /// Encoder preset for libx264
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Stop after this long: SS, MM:SS or HH:MM:SS
    #[arg(short = 't', long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Choose a monitor from a menu
    #[arg(long)]
    pub monitor: bool,

    /// Drag out an area of the screen to record
    #[arg(long)]
    pub area: bool,

    /// Click a window to record
    #[arg(long)]
    pub window: bool,

    /// Print the FFmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the dependency check
    #[arg(long, env = "SCREENREC_SKIP_DEPS", value_parser = FalseyValueParser::new())]
    pub skip_deps: bool,

    /// Do not render monitor thumbnails
    #[arg(long, env = "SCREENREC_NO_PREVIEW", value_parser = FalseyValueParser::new())]
    pub no_preview: bool,
}

impl RecordArgs {
    /// The requested selection flow, if any. Clap guarantees at most one.
    pub fn selection_mode(&self) -> Option<SelectionMode> {
        if self.monitor {
            Some(SelectionMode::Monitor)
        } else if self.area {
            Some(SelectionMode::Area)
        } else if self.window {
            Some(SelectionMode::Window)
        } else {
            None
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            device: self.device,
            audio_device: self.audio.clone(),
            resolution: self.resolution,
            framerate: self.framerate,
            codec: self.codec.clone(),
            crf: self.crf,
            preset: self.preset.clone(),
            quality: self.quality,
            output: self.output.clone(),
            duration: self.duration,
            no_preview: self.no_preview,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List AVFoundation video and audio devices
    ListDevices,
    /// List the capture modes of a device
    ListModes {
        /// Video device index (defaults to the configured device)
        #[arg(short, long)]
        device: Option<u32>,
    },
    /// Check dependencies and Screen Recording permission
    Check,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Create default config file
    Init,
}
