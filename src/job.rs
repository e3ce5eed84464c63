//! Capture job descriptors.
//!
//! [`assemble`] merges the negotiated mode, the selected target and the
//! encoding parameters into a [`CaptureJobDescriptor`]. The descriptor is
//! built once, never mutated, and rendered into FFmpeg arguments by
//! [`CaptureJobDescriptor::to_args`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::modes::VideoMode;
use crate::selection::Region;

/// The codec that takes a CRF + preset pair rather than a quality scalar.
pub const DEFAULT_CODEC: &str = "libx264";

/// Encoding choices from settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingParams {
    pub codec: String,
    /// Constant rate factor, used by the default codec only
    pub crf: u8,
    /// Speed/efficiency preset, used by the default codec only
    pub preset: String,
    /// Quality scalar for other codecs; `None` keeps the codec's defaults
    pub quality: Option<u32>,
    pub audio_device: Option<String>,
    pub output: PathBuf,
    pub duration: Option<Duration>,
}

/// Codec family, used to pick the container-level codec tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecFamily {
    Av1,
    Avc,
    Hevc,
}

impl CodecFamily {
    /// Classify an FFmpeg encoder name. Unknown encoders are treated as AVC.
    pub fn from_codec(codec: &str) -> Self {
        let codec = codec.to_ascii_lowercase();
        if codec.contains("av1") {
            CodecFamily::Av1
        } else if codec.contains("hevc") || codec.contains("265") {
            CodecFamily::Hevc
        } else {
            CodecFamily::Avc
        }
    }

    /// Four-character tag written to the container for player compatibility.
    pub fn tag(&self) -> &'static str {
        match self {
            CodecFamily::Av1 => "av01",
            CodecFamily::Avc => "avc1",
            CodecFamily::Hevc => "hvc1",
        }
    }
}

/// How output quality is expressed to the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualitySettings {
    CrfPreset { crf: u8, preset: String },
    Scalar(u32),
    CodecDefault,
}

/// Everything the external encoder needs for one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureJobDescriptor {
    device: u32,
    audio_device: Option<String>,
    region: Option<Region>,
    mode: VideoMode,
    codec: String,
    codec_family: CodecFamily,
    quality: QualitySettings,
    output: PathBuf,
    duration: Option<Duration>,
}

/// Build the descriptor. Pure and deterministic.
pub fn assemble(
    device: u32,
    region: Option<Region>,
    mode: VideoMode,
    params: &EncodingParams,
) -> CaptureJobDescriptor {
    let quality = if params.codec == DEFAULT_CODEC {
        QualitySettings::CrfPreset {
            crf: params.crf,
            preset: params.preset.clone(),
        }
    } else {
        match params.quality {
            Some(q) => QualitySettings::Scalar(q),
            None => QualitySettings::CodecDefault,
        }
    };

    CaptureJobDescriptor {
        device,
        audio_device: params.audio_device.clone(),
        region,
        mode,
        codec: params.codec.clone(),
        codec_family: CodecFamily::from_codec(&params.codec),
        quality,
        output: params.output.clone(),
        duration: params.duration,
    }
}

/// Format a duration for FFmpeg's `-t`, in seconds.
fn format_seconds(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
    }
}

impl CaptureJobDescriptor {
    pub fn device(&self) -> u32 {
        self.device
    }

    pub fn audio_device(&self) -> Option<&str> {
        self.audio_device.as_deref()
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn mode(&self) -> VideoMode {
        self.mode
    }

    pub fn codec(&self) -> &str {
        &self.codec
    }

    pub fn codec_tag(&self) -> &'static str {
        self.codec_family.tag()
    }

    pub fn quality(&self) -> &QualitySettings {
        &self.quality
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// AVFoundation input spec: `video:audio`, with `none` for no audio.
    pub fn input_spec(&self) -> String {
        format!(
            "{}:{}",
            self.device,
            self.audio_device.as_deref().unwrap_or("none")
        )
    }

    /// FFmpeg arguments (excluding the `ffmpeg` command itself).
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".to_string(),
            "-f".to_string(),
            "avfoundation".to_string(),
            "-capture_cursor".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            self.mode.frame_rate.to_string(),
            "-video_size".to_string(),
            self.mode.resolution.to_string(),
            "-i".to_string(),
            self.input_spec(),
        ];

        if let Some(region) = self.region {
            args.push("-vf".to_string());
            args.push(region.crop_filter());
        }

        if let Some(duration) = self.duration {
            args.push("-t".to_string());
            args.push(format_seconds(duration));
        }

        args.push("-c:v".to_string());
        args.push(self.codec.clone());
        match &self.quality {
            QualitySettings::CrfPreset { crf, preset } => {
                args.extend([
                    "-crf".to_string(),
                    crf.to_string(),
                    "-preset".to_string(),
                    preset.clone(),
                ]);
            }
            QualitySettings::Scalar(q) => {
                args.extend(["-q:v".to_string(), q.to_string()]);
            }
            QualitySettings::CodecDefault => {}
        }
        args.extend([
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-tag:v".to_string(),
            self.codec_tag().to_string(),
        ]);

        if self.audio_device.is_some() {
            args.extend(["-c:a".to_string(), "aac".to_string()]);
        }

        args.extend([
            "-movflags".to_string(),
            "+faststart".to_string(),
            self.output.to_string_lossy().into_owned(),
        ]);
        args
    }

    /// Single shell-ready command line, as printed by `--dry-run`.
    pub fn command_line(&self) -> String {
        std::iter::once("ffmpeg".to_string())
            .chain(self.to_args().iter().map(|a| shell_quote(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+@,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
