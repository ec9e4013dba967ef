//! Analyzer configuration.
//!
//! The enclosing CLI hands the frontend a JSON document; everything here is
//! validated before any lowering begins so configuration errors surface as
//! plain strings, not mid-collection failures. Unknown keys are tolerated
//! and `pythonCmdArgs` stays opaque.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::lower::LowerOptions;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    None,
    ResultOnly,
    #[default]
    Reduced,
    Full,
}

impl LogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::None => LevelFilter::OFF,
            LogLevel::ResultOnly => LevelFilter::ERROR,
            LogLevel::Reduced => LevelFilter::INFO,
            LogLevel::Full => LevelFilter::TRACE,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub entry_path: PathBuf,
    pub pytea_lib_path: PathBuf,
    #[serde(default)]
    pub config_path: Option<PathBuf>,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default, rename = "extractIR")]
    pub extract_ir: bool,
    #[serde(default = "default_true")]
    pub ignore_assert: bool,
    #[serde(default)]
    pub immediate_constraint_check: bool,
    #[serde(default)]
    pub python_cmd_args: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub python_subcommand: String,
}

impl Config {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Parsing configuration JSON")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Reading config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("In config {}", path.display()))
    }

    /// Checked once, before collection starts.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.entry_path.as_os_str().is_empty(),
            "entryPath is required"
        );
        ensure!(
            self.entry_path.is_file(),
            "entry script {} does not exist",
            self.entry_path.display()
        );
        ensure!(
            self.pytea_lib_path.is_dir(),
            "library path {} is not a directory",
            self.pytea_lib_path.display()
        );
        Ok(())
    }

    pub fn lower_options(&self) -> LowerOptions {
        LowerOptions {
            ignore_assert: self.ignore_assert,
        }
    }
}

/// Process exit codes used by the enclosing CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Clean,
    ErrorsReported,
    Fatal,
    ConfigError,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::ErrorsReported => 1,
            ExitStatus::Fatal => 2,
            ExitStatus::ConfigError => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_configuration() {
        let config = Config::from_json_str(
            r#"{
                "entryPath": "tests/fixtures/project/main.py",
                "pyteaLibPath": "tests/fixtures/pylib",
                "logLevel": "result-only",
                "extractIR": true,
                "ignoreAssert": false,
                "pythonCmdArgs": {"batch_size": 16},
                "pythonSubcommand": "python3"
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.log_level, LogLevel::ResultOnly);
        assert!(config.extract_ir);
        assert!(!config.ignore_assert);
        assert!(!config.lower_options().ignore_assert);
        assert_eq!(config.python_subcommand, "python3");
        assert_eq!(
            config.python_cmd_args.get("batch_size"),
            Some(&serde_json::json!(16))
        );
    }

    #[test]
    fn assertions_are_ignored_by_default() {
        let config = Config::from_json_str(
            r#"{"entryPath": "a.py", "pyteaLibPath": "lib"}"#,
        )
        .expect("config should parse");

        assert!(config.ignore_assert);
        assert_eq!(config.log_level, LogLevel::Reduced);
    }

    #[test]
    fn bad_json_surfaces_as_config_error() {
        let error = Config::from_json_str("{not json").expect_err("must fail");
        assert!(error.to_string().contains("Parsing configuration"));
    }

    #[test]
    fn missing_entry_fails_validation() {
        let config = Config::from_json_str(
            r#"{"entryPath": "no/such/file.py", "pyteaLibPath": "tests/fixtures/pylib"}"#,
        )
        .expect("config should parse");

        let error = config.validate().expect_err("validation must fail");
        assert!(error.to_string().contains("does not exist"));
    }

    #[test]
    fn exit_codes_match_cli_contract() {
        assert_eq!(ExitStatus::Clean.code(), 0);
        assert_eq!(ExitStatus::ErrorsReported.code(), 1);
        assert_eq!(ExitStatus::Fatal.code(), 2);
        assert_eq!(ExitStatus::ConfigError.code(), 3);
    }

    #[test]
    fn log_levels_map_onto_tracing_filters() {
        assert_eq!(LogLevel::None.level_filter(), LevelFilter::OFF);
        assert_eq!(LogLevel::Full.level_filter(), LevelFilter::TRACE);
    }
}
