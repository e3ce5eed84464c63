//! Configuration handling for screenrec.
//!
//! Defaults may come from `<config dir>/screenrec/config.toml` (or a custom path
//! via `--config`). CLI flags, the config file and built-in defaults are
//! merged once into an immutable [`Settings`] value that is passed to every
//! component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::job::{EncodingParams, DEFAULT_CODEC};
use crate::negotiate::{FrameRateRequest, ModeRequest, ResolutionRequest};
use crate::permissions::{DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_BUDGET};

pub const DEFAULT_DEVICE: u32 = 1;
pub const DEFAULT_SCREEN_THRESHOLD: u32 = 4;
pub const DEFAULT_CRF: u8 = 23;
pub const DEFAULT_PRESET: &str = "medium";
pub const DEFAULT_OUTPUT: &str = "screen-recording.mp4";
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_RENDERERS: [&str; 2] = ["imgcat", "viu"];

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub encoding: EncodingConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    pub device: Option<u32>,
    pub audio_device: Option<String>,
    pub screen_device_threshold: Option<u32>,
    /// `auto` or WIDTHxHEIGHT
    pub resolution: Option<String>,
    /// `auto` or frames per second
    pub framerate: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EncodingConfig {
    pub codec: Option<String>,
    pub crf: Option<u8>,
    pub preset: Option<String>,
    pub quality: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    pub timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SelectionConfig {
    pub tool_timeout_secs: Option<u64>,
    pub renderers: Option<Vec<String>>,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file '{}' does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used and a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                Self::load_file(path)
            }
            None => {
                let path = default_path();
                if path.exists() {
                    Self::load_file(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("screenrec").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/screenrec/config.toml")
        })
}

/// Values supplied on the command line. `None` defers to the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub device: Option<u32>,
    pub audio_device: Option<String>,
    pub resolution: Option<ResolutionRequest>,
    pub framerate: Option<FrameRateRequest>,
    pub codec: Option<String>,
    pub crf: Option<u8>,
    pub preset: Option<String>,
    pub quality: Option<u32>,
    pub output: Option<PathBuf>,
    pub duration: Option<Duration>,
    pub no_preview: bool,
}

/// Immutable settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub device: u32,
    pub screen_device_threshold: u32,
    pub request: ModeRequest,
    pub encoding: EncodingParams,
    pub probe_timeout: Duration,
    pub poll_interval: Duration,
    pub tool_timeout: Duration,
    pub renderers: Vec<String>,
    pub preview: bool,
}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message,
    }
}

impl Settings {
    /// Merge settings: CLI > config file > built-in defaults.
    pub fn merge(cli: Overrides, cfg: &Config) -> Result<Self, ConfigError> {
        let resolution = match cli.resolution {
            Some(r) => r,
            None => cfg
                .capture
                .resolution
                .as_deref()
                .map(str::parse::<ResolutionRequest>)
                .transpose()
                .map_err(|e| invalid("capture.resolution", e))?
                .unwrap_or_default(),
        };

        let frame_rate = match cli.framerate {
            Some(f) => f,
            None => cfg
                .capture
                .framerate
                .as_deref()
                .map(str::parse::<FrameRateRequest>)
                .transpose()
                .map_err(|e| invalid("capture.framerate", e))?
                .unwrap_or_default(),
        };

        let poll_ms = cfg
            .probe
            .poll_interval_ms
            .unwrap_or(DEFAULT_POLL_INTERVAL.as_millis() as u64);
        if poll_ms == 0 {
            return Err(invalid("probe.poll_interval_ms", "must be greater than 0".to_string()));
        }

        let encoding = EncodingParams {
            codec: cli
                .codec
                .or_else(|| cfg.encoding.codec.clone())
                .unwrap_or_else(|| DEFAULT_CODEC.to_string()),
            crf: cli.crf.or(cfg.encoding.crf).unwrap_or(DEFAULT_CRF),
            preset: cli
                .preset
                .or_else(|| cfg.encoding.preset.clone())
                .unwrap_or_else(|| DEFAULT_PRESET.to_string()),
            quality: cli.quality.or(cfg.encoding.quality),
            audio_device: cli
                .audio_device
                .or_else(|| cfg.capture.audio_device.clone()),
            output: cli.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            duration: cli.duration,
        };

        Ok(Settings {
            device: cli.device.or(cfg.capture.device).unwrap_or(DEFAULT_DEVICE),
            screen_device_threshold: cfg
                .capture
                .screen_device_threshold
                .unwrap_or(DEFAULT_SCREEN_THRESHOLD),
            request: ModeRequest {
                resolution,
                frame_rate,
            },
            encoding,
            probe_timeout: cfg
                .probe
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_PROBE_BUDGET),
            poll_interval: Duration::from_millis(poll_ms),
            tool_timeout: cfg
                .selection
                .tool_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TOOL_TIMEOUT),
            renderers: cfg
                .selection
                .renderers
                .clone()
                .unwrap_or_else(|| DEFAULT_RENDERERS.iter().map(|r| r.to_string()).collect()),
            preview: !cli.no_preview,
        })
    }
}

/// Default config file written by `screenrec config init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# screenrec configuration

[capture]
# AVFoundation video device index (see `screenrec list-devices`)
device = 1
# Audio device index or name (omit for no audio)
# audio_device = "0"
# Devices at or above this index are treated as screens
screen_device_threshold = 4
# "auto" or WIDTHxHEIGHT
resolution = "auto"
# "auto" or frames per second
framerate = "auto"

[encoding]
codec = "libx264"
# Constant rate factor and preset (libx264 only)
crf = 23
preset = "medium"
# Quality scalar for other codecs, e.g. hevc_videotoolbox
# quality = 65

[probe]
# Budget for the Screen Recording permission probe
timeout_ms = 2000
poll_interval_ms = 100

[selection]
# Maximum time an interactive picker may stay open
tool_timeout_secs = 300
# Terminal image renderers tried in order for monitor previews
renderers = ["imgcat", "viu"]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{FrameRate, Resolution};
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::merge(Overrides::default(), &Config::default()).unwrap();
        assert_eq!(settings.device, DEFAULT_DEVICE);
        assert_eq!(settings.screen_device_threshold, 4);
        assert_eq!(settings.request, ModeRequest::default());
        assert_eq!(settings.encoding.codec, "libx264");
        assert_eq!(settings.encoding.crf, 23);
        assert_eq!(settings.probe_timeout, Duration::from_secs(2));
        assert_eq!(settings.poll_interval, Duration::from_millis(100));
        assert_eq!(settings.renderers, vec!["imgcat", "viu"]);
        assert!(settings.preview);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let cfg: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        let settings = Settings::merge(Overrides::default(), &cfg).unwrap();
        assert_eq!(settings.device, DEFAULT_DEVICE);
        assert_eq!(settings.encoding.preset, "medium");
        assert_eq!(settings.tool_timeout, DEFAULT_TOOL_TIMEOUT);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cfg: Config = toml::from_str(
            r#"
[capture]
device = 3
resolution = "1280x720"
framerate = "60"

[encoding]
codec = "hevc_videotoolbox"
quality = 70
"#,
        )
        .unwrap();
        let cli = Overrides {
            device: Some(5),
            framerate: Some(FrameRateRequest::Auto),
            no_preview: true,
            ..Default::default()
        };
        let settings = Settings::merge(cli, &cfg).unwrap();
        assert_eq!(settings.device, 5);
        assert_eq!(
            settings.request.resolution,
            ResolutionRequest::Exact(Resolution::HD)
        );
        assert_eq!(settings.request.frame_rate, FrameRateRequest::Auto);
        assert_eq!(settings.encoding.codec, "hevc_videotoolbox");
        assert_eq!(settings.encoding.quality, Some(70));
        assert!(!settings.preview);
    }

    #[test]
    fn test_config_framerate_is_parsed() {
        let cfg: Config = toml::from_str("[capture]\nframerate = \"24\"\n").unwrap();
        let settings = Settings::merge(Overrides::default(), &cfg).unwrap();
        assert_eq!(
            settings.request.frame_rate,
            FrameRateRequest::Exact(FrameRate::from_fps(24).unwrap())
        );
    }

    #[test]
    fn test_invalid_config_value() {
        let cfg: Config = toml::from_str("[capture]\nresolution = \"huge\"\n").unwrap();
        let err = Settings::merge(Overrides::default(), &cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "capture.resolution"));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let cfg: Config = toml::from_str("[probe]\npoll_interval_ms = 0\n").unwrap();
        assert!(Settings::merge(Overrides::default(), &cfg).is_err());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/screenrec.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture]\naudio_device = \"0\"").unwrap();
        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.capture.audio_device.as_deref(), Some("0"));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture]\nwebcam = true").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
