//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/kerneltrace/kerneltrace.toml`
//! 3. Local config: `<log_dir>/.kerneltrace.toml` (next to the log being read)
//! 4. Environment variables: `KERNELTRACE_*` prefix

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Output format of the render plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlanFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for PlanFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanFormat::Text => f.write_str("text"),
            PlanFormat::Json => f.write_str("json"),
        }
    }
}

/// Raw settings for intermediate parsing (all optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub output_dir: Option<PathBuf>,
    pub frame_duration_ms: Option<u64>,
    pub parallel_rounds: Option<bool>,
    pub format: Option<PlanFormat>,
}

/// Unified configuration for kerneltrace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory render artifacts are resolved against (default: log_run_viz)
    pub output_dir: PathBuf,
    /// Duration of one animation frame in milliseconds
    pub frame_duration_ms: u64,
    /// Process rounds concurrently
    pub parallel_rounds: bool,
    /// Default plan output format
    pub format: PlanFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("log_run_viz"),
            frame_duration_ms: 900,
            parallel_rounds: false,
            format: PlanFormat::Text,
        }
    }
}

/// Get the XDG config directory for kerneltrace.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "kerneltrace").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("kerneltrace.toml"))
}

/// Get the path to the local config file in a log directory.
pub fn local_config_path(log_dir: &Path) -> PathBuf {
    log_dir.join(".kerneltrace.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path; unexpandable input is kept as is.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.output_dir.to_string_lossy().as_ref());
        self.output_dir = PathBuf::from(expanded);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            output_dir: overlay
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            frame_duration_ms: overlay.frame_duration_ms.unwrap_or(self.frame_duration_ms),
            parallel_rounds: overlay.parallel_rounds.unwrap_or(self.parallel_rounds),
            format: overlay.format.unwrap_or(self.format),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `log_dir` - Optional directory of the log for local config
    pub fn load(log_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config next to the log
        if let Some(dir) = log_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply KERNELTRACE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("KERNELTRACE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("output_dir") {
            settings.output_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("frame_duration_ms") {
            settings.frame_duration_ms = val.parse().map_err(|_| ApplicationError::Config {
                message: format!("KERNELTRACE_FRAME_DURATION_MS is not a number: {}", val),
            })?;
        }
        if let Ok(val) = config.get_string("parallel_rounds") {
            settings.parallel_rounds = parse_bool_override("KERNELTRACE_PARALLEL_ROUNDS", &val)?;
        }
        if let Ok(val) = config.get_string("format") {
            settings.format = parse_format_override("KERNELTRACE_FORMAT", &val)?;
        }

        Ok(settings)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}

/// Same spellings the `config` crate accepts for booleans, case-insensitive.
fn parse_bool_override(name: &str, val: &str) -> Result<bool, ApplicationError> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApplicationError::Config {
            message: format!("{} is not a boolean: {}", name, val),
        }),
    }
}

fn parse_format_override(name: &str, val: &str) -> Result<PlanFormat, ApplicationError> {
    PlanFormat::from_str(val.trim(), true).map_err(|_| ApplicationError::Config {
        message: format!("{} is not a plan format: {}", name, val),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_merge_with_keeps_unspecified() {
        let base = Settings::default();
        let overlay = RawSettings {
            frame_duration_ms: Some(250),
            ..Default::default()
        };
        let merged = base.merge_with(&overlay);
        assert_eq!(merged.frame_duration_ms, 250);
        assert_eq!(merged.output_dir, base.output_dir);
        assert_eq!(merged.format, PlanFormat::Text);
    }

    #[rstest]
    #[case("JSON", PlanFormat::Json)]
    #[case("text", PlanFormat::Text)]
    #[case(" Json ", PlanFormat::Json)]
    fn test_format_override(#[case] val: &str, #[case] expected: PlanFormat) {
        assert_eq!(parse_format_override("KERNELTRACE_FORMAT", val).unwrap(), expected);
    }

    #[test]
    fn test_format_override_rejects_unknown() {
        let err = parse_format_override("KERNELTRACE_FORMAT", "yaml").unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Config { ref message } if message == "KERNELTRACE_FORMAT is not a plan format: yaml"
        ));
    }

    #[rstest]
    #[case("true", true)]
    #[case("ON", true)]
    #[case("1", true)]
    #[case("false", false)]
    #[case("No", false)]
    #[case("0", false)]
    fn test_bool_override(#[case] val: &str, #[case] expected: bool) {
        assert_eq!(
            parse_bool_override("KERNELTRACE_PARALLEL_ROUNDS", val).unwrap(),
            expected
        );
    }

    #[rstest]
    #[case("garbage")]
    #[case("")]
    #[case("2")]
    fn test_bool_override_rejects_garbage(#[case] val: &str) {
        let err = parse_bool_override("KERNELTRACE_PARALLEL_ROUNDS", val).unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Config { ref message }
                if message.starts_with("KERNELTRACE_PARALLEL_ROUNDS is not a boolean")
        ));
    }

    #[test]
    fn test_plan_format_display_matches_value_names() {
        for format in PlanFormat::value_variants() {
            let name = format.to_possible_value().map(|v| v.get_name().to_string());
            assert_eq!(name, Some(format.to_string()));
        }
    }
}
