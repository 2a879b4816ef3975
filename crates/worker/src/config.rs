use std::path::PathBuf;
use std::time::Duration;

use stance_core::{SizingRule, SurfaceGeometry};
use stance_live::LoopConfig;

/// A configuration value that is missing or does not parse.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Worker configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the
/// inputs each binary needs (`FRAMES_DIR` for live, `ANALYSIS_JSON` or
/// `VIDEO_FILENAME` for replay), which are checked by the binary.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Analyzer base URL (default: `http://localhost:8000`).
    pub analyzer_url: String,
    /// Time between live captures (default: 1000 ms).
    pub capture_interval: Duration,
    /// Concurrent analyzer requests allowed (default: `4`).
    pub max_in_flight: usize,
    /// Per-request analyzer timeout (default: 30 s).
    pub request_timeout: Duration,
    /// Directory of stills replayed as the live camera.
    pub frames_dir: Option<PathBuf>,
    /// Where overlay PNGs are written (default: `overlays`).
    pub output_dir: PathBuf,
    /// How long the live binary runs before tearing down (default: 10 s).
    pub live_duration: Duration,
    /// Saved `/analyze` response to replay.
    pub analysis_json: Option<PathBuf>,
    /// Uploaded video to request analysis for when no JSON is given.
    pub video_filename: Option<String>,
    /// Native resolution of the recorded video.
    pub native: Option<SurfaceGeometry>,
    /// Rendered size of the overlaid video, recorded or live.
    pub displayed: Option<SurfaceGeometry>,
    /// Which of the two sizes the overlay tracks (default: `native`).
    pub sizing: SizingRule,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `ANALYZER_URL`         | `http://localhost:8000` |
    /// | `CAPTURE_INTERVAL_MS`  | `1000`                  |
    /// | `MAX_IN_FLIGHT`        | `4`                     |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `FRAMES_DIR`           | --                      |
    /// | `OUTPUT_DIR`           | `overlays`              |
    /// | `LIVE_DURATION_SECS`   | `10`                    |
    /// | `ANALYSIS_JSON`        | --                      |
    /// | `VIDEO_FILENAME`       | --                      |
    /// | `NATIVE_WIDTH`/`NATIVE_HEIGHT`   | --            |
    /// | `DISPLAY_WIDTH`/`DISPLAY_HEIGHT` | --            |
    /// | `SIZING`               | `native`                |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let analyzer_url = lookup("ANALYZER_URL").unwrap_or_else(|| "http://localhost:8000".into());

        let capture_interval =
            Duration::from_millis(parse_or(&lookup, "CAPTURE_INTERVAL_MS", 1000u64)?);
        let max_in_flight: usize = parse_or(&lookup, "MAX_IN_FLIGHT", 4)?;
        if max_in_flight == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_IN_FLIGHT",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        let request_timeout = Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?);
        let live_duration = Duration::from_secs(parse_or(&lookup, "LIVE_DURATION_SECS", 10u64)?);

        let frames_dir = lookup("FRAMES_DIR").map(PathBuf::from);
        let output_dir = lookup("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("overlays"));
        let analysis_json = lookup("ANALYSIS_JSON").map(PathBuf::from);
        let video_filename = lookup("VIDEO_FILENAME").filter(|s| !s.trim().is_empty());

        let native = geometry(&lookup, "NATIVE_WIDTH", "NATIVE_HEIGHT")?;
        let displayed = geometry(&lookup, "DISPLAY_WIDTH", "DISPLAY_HEIGHT")?;

        let sizing = match lookup("SIZING") {
            Some(value) => match SizingRule::from_name(value.trim()) {
                Ok(rule) => rule,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "SIZING",
                        reason: e.to_string(),
                        value,
                    })
                }
            },
            None => SizingRule::default(),
        };
        if sizing == SizingRule::DisplayedSize && displayed.is_none() {
            return Err(ConfigError::Invalid {
                var: "SIZING",
                value: "displayed".into(),
                reason: "requires DISPLAY_WIDTH and DISPLAY_HEIGHT".into(),
            });
        }

        Ok(Self {
            analyzer_url,
            capture_interval,
            max_in_flight,
            request_timeout,
            frames_dir,
            output_dir,
            live_duration,
            analysis_json,
            video_filename,
            native,
            displayed,
            sizing,
        })
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            interval: self.capture_interval,
            max_in_flight: self.max_in_flight,
        }
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        },
    }
}

/// Both dimensions or neither.
fn geometry<F>(
    lookup: &F,
    width_var: &'static str,
    height_var: &'static str,
) -> Result<Option<SurfaceGeometry>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match (lookup(width_var), lookup(height_var)) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Missing(height_var)),
        (None, Some(_)) => Err(ConfigError::Missing(width_var)),
        (Some(_), Some(_)) => {
            let width: u32 = parse_or(lookup, width_var, 0)?;
            let height: u32 = parse_or(lookup, height_var, 0)?;
            Ok(Some(SurfaceGeometry::new(width, height)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<WorkerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.analyzer_url, "http://localhost:8000");
        assert_eq!(cfg.capture_interval, Duration::from_millis(1000));
        assert_eq!(cfg.max_in_flight, 4);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.live_duration, Duration::from_secs(10));
        assert_eq!(cfg.output_dir, PathBuf::from("overlays"));
        assert_eq!(cfg.sizing, SizingRule::NativeResolution);
        assert!(cfg.native.is_none());
        assert!(cfg.frames_dir.is_none());
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("CAPTURE_INTERVAL_MS", "250"),
            ("MAX_IN_FLIGHT", "2"),
            ("NATIVE_WIDTH", "1280"),
            ("NATIVE_HEIGHT", "720"),
            ("DISPLAY_WIDTH", "640"),
            ("DISPLAY_HEIGHT", "360"),
            ("SIZING", "displayed"),
            ("FRAMES_DIR", "/tmp/frames"),
        ])
        .unwrap();
        assert_eq!(cfg.loop_config().interval, Duration::from_millis(250));
        assert_eq!(cfg.loop_config().max_in_flight, 2);
        assert_eq!(cfg.native, Some(SurfaceGeometry::new(1280, 720)));
        assert_eq!(cfg.displayed, Some(SurfaceGeometry::new(640, 360)));
        assert_eq!(cfg.sizing, SizingRule::DisplayedSize);
        assert_eq!(cfg.frames_dir, Some(PathBuf::from("/tmp/frames")));
    }

    #[test]
    fn invalid_number_is_rejected() {
        assert_matches!(
            config(&[("CAPTURE_INTERVAL_MS", "soon")]),
            Err(ConfigError::Invalid { var: "CAPTURE_INTERVAL_MS", .. })
        );
    }

    #[test]
    fn zero_in_flight_is_rejected() {
        assert_matches!(
            config(&[("MAX_IN_FLIGHT", "0")]),
            Err(ConfigError::Invalid { var: "MAX_IN_FLIGHT", .. })
        );
    }

    #[test]
    fn half_a_geometry_is_missing_the_other_half() {
        assert_matches!(
            config(&[("DISPLAY_WIDTH", "640")]),
            Err(ConfigError::Missing("DISPLAY_HEIGHT"))
        );
    }

    #[test]
    fn displayed_sizing_needs_a_display_size() {
        assert_matches!(
            config(&[("SIZING", "displayed"), ("NATIVE_WIDTH", "1280"), ("NATIVE_HEIGHT", "720")]),
            Err(ConfigError::Invalid { var: "SIZING", .. })
        );
    }

    #[test]
    fn unknown_sizing_is_rejected() {
        assert_matches!(
            config(&[("SIZING", "stretched")]),
            Err(ConfigError::Invalid { var: "SIZING", .. })
        );
    }
}
