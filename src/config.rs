//! Configuration management for multifmt.
//!
//! This module provides the immutable [`Config`] value that drives a run.
//! It is assembled once at startup from:
//! - TOML files (`multifmt.toml`)
//! - CLI arguments (which override file settings)
//! - The `GO15VENDOREXPERIMENT` environment variable
//!
//! Config files are auto-discovered by searching the user's home directory
//! and every ancestor of the working directory, unless `--config` names one.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cli::CliArgs;
use crate::error::PipelineError;
use crate::process::Pipeline;
use crate::resolve::SkipSet;
use crate::tool::ToolChain;

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["multifmt.toml"];

/// Formatter used when neither the CLI nor a config file names one
pub const DEFAULT_FORMATTER: &str = "gofmt";

/// Environment variable enabling Go vendoring for spawned tools
pub const VENDOR_ENV: &str = "GO15VENDOREXPERIMENT";

/// Directory name skipped when vendoring is enabled
pub const VENDOR_DIR: &str = "vendor";

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

/// Settings read from `multifmt.toml`.
///
/// All fields are optional so merging can tell "explicitly set" from
/// "not specified".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileSettings {
    /// Formatter specs, e.g. `["gofmt -s", "goimports"]`
    pub formatters: Option<Vec<String>>,
    /// Extra directory names to skip (merged across files)
    #[serde(default)]
    pub skip: Vec<String>,
    pub vendor: Option<bool>,
    pub to_source: Option<bool>,
    pub jobs: Option<usize>,
}

impl FileSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load settings from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Overlay `other` on top of `self`
    fn merge(&mut self, other: Self) {
        if other.formatters.is_some() {
            self.formatters = other.formatters;
        }
        for name in other.skip {
            if !self.skip.contains(&name) {
                self.skip.push(name);
            }
        }
        if other.vendor.is_some() {
            self.vendor = other.vendor;
        }
        if other.to_source.is_some() {
            self.to_source = other.to_source;
        }
        if other.jobs.is_some() {
            self.jobs = other.jobs;
        }
    }

    /// Discover config files for a working directory
    ///
    /// Returns the home directory config first, then every ancestor from the
    /// root down to `start_dir` (least specific first).
    #[must_use]
    pub fn discover_config_files(start_dir: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        let mut ancestors: Vec<&Path> = start_dir.ancestors().collect();
        ancestors.reverse();

        for ancestor in ancestors {
            for config_name in CONFIG_FILE_NAMES {
                let config_path = ancestor.join(config_name);
                if config_path.is_file() && !config_files.contains(&config_path) {
                    config_files.push(config_path);
                }
            }
        }

        config_files
    }

    /// Load and merge every discovered config file.
    ///
    /// Unreadable or malformed files are reported and skipped.
    #[must_use]
    pub fn from_discovered_files(start_dir: &Path) -> Self {
        let mut settings = Self::default();
        for path in Self::discover_config_files(start_dir) {
            match Self::from_toml_file(&path) {
                Ok(found) => {
                    debug!("Loaded config file {}", path.display());
                    settings.merge(found);
                }
                Err(e) => warn!("{e:#}"),
            }
        }
        settings
    }
}

/// Everything a run needs, fixed before any work starts
#[derive(Debug, Clone)]
pub struct Config {
    /// Formatters to run, in order
    pub chain: ToolChain,
    /// Write results back to the source files instead of stdout
    pub write_back: bool,
    /// Directory names pruned from `...` expansion
    pub skip: SkipSet,
    /// Whether vendoring support is on
    pub vendor: bool,
    /// Extra environment variables for spawned tools
    pub env: Vec<(String, String)>,
    /// Path arguments; empty means standard input
    pub paths: Vec<String>,
    /// Parallel targets (1 = sequential, 0 = automatic)
    pub jobs: usize,
    /// Debug output enabled
    pub debug: bool,
}

impl Config {
    /// Build the run configuration from CLI arguments, config files and the
    /// process environment
    pub fn build(args: &CliArgs) -> anyhow::Result<Self> {
        let file_settings = if let Some(path) = &args.config {
            debug!("Using explicit config file: {}", path.display());
            FileSettings::from_toml_file(path)?
        } else {
            let cwd = std::env::current_dir().context("failed to get current directory")?;
            FileSettings::from_discovered_files(&cwd)
        };

        let vendor_env = std::env::var(VENDOR_ENV).ok();
        Ok(Self::from_parts(args, file_settings, vendor_env.as_deref()))
    }

    /// Combine already loaded inputs. CLI values win over file settings.
    #[must_use]
    pub fn from_parts(args: &CliArgs, file: FileSettings, vendor_env: Option<&str>) -> Self {
        let chain = if !args.formatters.is_empty() {
            ToolChain::parse(&args.formatters)
        } else if let Some(formatters) = &file.formatters {
            ToolChain::parse(formatters)
        } else {
            ToolChain::parse([DEFAULT_FORMATTER])
        };

        let mut skip: SkipSet = file.skip.into_iter().collect();
        skip.extend(args.skip.iter().cloned());

        let vendor = args.vendor || file.vendor == Some(true) || vendor_env == Some("1");
        let mut env = Vec::new();
        if vendor {
            skip.insert(VENDOR_DIR);
            env.push((VENDOR_ENV.to_string(), "1".to_string()));
        }

        Self {
            chain,
            write_back: args.to_source || file.to_source == Some(true),
            skip,
            vendor,
            env,
            paths: args.paths.clone(),
            jobs: args.jobs.or(file.jobs).unwrap_or(1),
            debug: args.debug,
        }
    }

    /// Reject configurations that cannot run at all
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.chain.is_empty() {
            return Err(PipelineError::Configuration(
                "no formatters defined".to_string(),
            ));
        }
        if self.write_back && self.is_stdin_mode() {
            return Err(PipelineError::Configuration(
                "could not write to source if reading from stdin".to_string(),
            ));
        }
        Ok(())
    }

    /// No path arguments means the chain runs over standard input
    #[must_use]
    pub fn is_stdin_mode(&self) -> bool {
        self.paths.is_empty()
    }

    #[must_use]
    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(&self.chain).with_env(&self.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_args_from;
    use crate::tool::Tool;
    use tempfile::TempDir;

    fn commands(config: &Config) -> Vec<String> {
        config.chain.iter().map(Tool::to_string).collect()
    }

    #[test]
    fn test_default_formatter() {
        let args = parse_args_from(["multifmt"]);
        let config = Config::from_parts(&args, FileSettings::default(), None);
        assert_eq!(commands(&config), ["gofmt"]);
        assert!(!config.write_back);
        assert!(!config.vendor);
        assert!(config.skip.is_empty());
        assert_eq!(config.jobs, 1);
        assert!(config.is_stdin_mode());
    }

    #[test]
    fn test_cli_formatters_override_file() {
        let args = parse_args_from(["multifmt", "-f", "gofmt -s", "--fmt", "goimports", "."]);
        let file = FileSettings {
            formatters: Some(vec!["goreturns".to_string()]),
            ..Default::default()
        };
        let config = Config::from_parts(&args, file, None);
        assert_eq!(commands(&config), ["gofmt -s", "goimports"]);
    }

    #[test]
    fn test_file_formatters_used_without_cli() {
        let args = parse_args_from(["multifmt", "."]);
        let file = FileSettings {
            formatters: Some(vec!["goimports".to_string(), "goremovelines -w".to_string()]),
            ..Default::default()
        };
        let config = Config::from_parts(&args, file, None);
        assert_eq!(commands(&config), ["goimports", "goremovelines -w"]);
    }

    #[test]
    fn test_skip_is_merged() {
        let args = parse_args_from(["multifmt", "-s", "testdata", "./..."]);
        let file = FileSettings {
            skip: vec!["node_modules".to_string()],
            ..Default::default()
        };
        let config = Config::from_parts(&args, file, None);
        assert!(config.skip.contains("testdata"));
        assert!(config.skip.contains("node_modules"));
        assert_eq!(config.skip.len(), 2);
    }

    #[test]
    fn test_vendor_flag() {
        let args = parse_args_from(["multifmt", "--vendor", "./..."]);
        let config = Config::from_parts(&args, FileSettings::default(), None);
        assert!(config.vendor);
        assert!(config.skip.contains(VENDOR_DIR));
        assert_eq!(
            config.env,
            vec![(VENDOR_ENV.to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_vendor_from_environment() {
        let args = parse_args_from(["multifmt", "./..."]);
        let enabled = Config::from_parts(&args, FileSettings::default(), Some("1"));
        let disabled = Config::from_parts(&args, FileSettings::default(), Some("0"));
        assert!(enabled.vendor);
        assert!(enabled.skip.contains(VENDOR_DIR));
        assert!(!disabled.vendor);
        assert!(disabled.env.is_empty());
    }

    #[test]
    fn test_jobs_precedence() {
        let file = FileSettings {
            jobs: Some(8),
            ..Default::default()
        };
        let from_file = Config::from_parts(&parse_args_from(["multifmt"]), file.clone(), None);
        let from_cli = Config::from_parts(&parse_args_from(["multifmt", "-j", "2"]), file, None);
        assert_eq!(from_file.jobs, 8);
        assert_eq!(from_cli.jobs, 2);
    }

    #[test]
    fn test_validate_no_formatters() {
        let args = parse_args_from(["multifmt", "-f", " ", "."]);
        let config = Config::from_parts(&args, FileSettings::default(), None);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_validate_write_back_with_stdin() {
        let args = parse_args_from(["multifmt", "-w"]);
        let config = Config::from_parts(&args, FileSettings::default(), None);
        assert!(config.validate().is_err());

        let args = parse_args_from(["multifmt", "-w", "main.go"]);
        let config = Config::from_parts(&args, FileSettings::default(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let settings = FileSettings::from_toml_str(
            r#"
            formatters = ["gofmt -s", "goimports"]
            skip = ["testdata"]
            vendor = true
            jobs = 4
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.formatters,
            Some(vec!["gofmt -s".to_string(), "goimports".to_string()])
        );
        assert_eq!(settings.skip, ["testdata"]);
        assert_eq!(settings.vendor, Some(true));
        assert_eq!(settings.to_source, None);
        assert_eq!(settings.jobs, Some(4));
    }

    #[test]
    fn test_parse_toml_rejects_bad_types() {
        assert!(FileSettings::from_toml_str("formatters = 3").is_err());
    }

    #[test]
    fn test_merge_preserves_unset() {
        let mut base = FileSettings {
            formatters: Some(vec!["gofmt".to_string()]),
            skip: vec!["testdata".to_string()],
            jobs: Some(2),
            ..Default::default()
        };
        base.merge(FileSettings {
            skip: vec!["testdata".to_string(), "gen".to_string()],
            to_source: Some(true),
            ..Default::default()
        });
        assert_eq!(base.formatters, Some(vec!["gofmt".to_string()]));
        assert_eq!(base.skip, ["testdata", "gen"]);
        assert_eq!(base.jobs, Some(2));
        assert_eq!(base.to_source, Some(true));
    }

    #[test]
    fn test_discovered_files_nearest_wins() {
        let tmp = TempDir::new().unwrap();
        let outer = tmp.path();
        let inner = outer.join("project");
        std::fs::create_dir_all(&inner).unwrap();
        std::fs::write(
            outer.join("multifmt.toml"),
            "formatters = [\"gofmt\"]\nskip = [\"a\"]\njobs = 3\n",
        )
        .unwrap();
        std::fs::write(
            inner.join("multifmt.toml"),
            "formatters = [\"goimports\"]\nskip = [\"b\"]\n",
        )
        .unwrap();

        let settings = FileSettings::from_discovered_files(&inner);
        assert_eq!(settings.formatters, Some(vec!["goimports".to_string()]));
        assert!(settings.skip.contains(&"a".to_string()));
        assert!(settings.skip.contains(&"b".to_string()));
        assert_eq!(settings.jobs, Some(3));
    }

    #[test]
    fn test_malformed_discovered_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("multifmt.toml"), "formatters = [").unwrap();
        let settings = FileSettings::from_discovered_files(tmp.path());
        assert_eq!(settings.formatters, None);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let args = parse_args_from(["multifmt", "-c", "/nonexistent/multifmt.toml"]);
        assert!(Config::build(&args).is_err());
    }
}
