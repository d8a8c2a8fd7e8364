//! Command-line interface for multifmt.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// CLI arguments parsed from command line
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Formatter specs (`command arg...`), in the order given
    pub formatters: Vec<String>,

    /// Write result to the source file instead of stdout
    pub to_source: bool,

    /// Directory names to skip when expanding `...`
    pub skip: Vec<String>,

    /// Enable vendoring support
    pub vendor: bool,

    /// Enable debug output
    pub debug: bool,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Number of files formatted in parallel (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Paths to format; empty means stdin
    pub paths: Vec<String>,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("multifmt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run multiple formatters in one command")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .help("Print version")
                .action(ArgAction::Version),
        )
        .arg(
            Arg::new("paths")
                .help("Paths to format. <path>/... will recurse. Reads stdin when omitted")
                .value_name("PATH")
                .num_args(1..)
                .required(false),
        )
        .arg(
            Arg::new("fmt")
                .short('f')
                .long("fmt")
                .help("Formatter to call, repeat to chain (e.g. --fmt=gofmt --fmt=goremovelines) [default: gofmt]")
                .value_name("CMD")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("to-source")
                .short('w')
                .long("to-source")
                .help("Write result to (source) file instead of stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("skip")
                .short('s')
                .long("skip")
                .help("Skip directories with this name when expanding '...' (can be repeated)")
                .value_name("DIR")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("vendor")
                .long("vendor")
                .help("Enable vendoring support (skips 'vendor' directories and sets GO15VENDOREXPERIMENT=1)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Display debug messages")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of files formatted in parallel (0=auto, 1=sequential) [default: 1]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

fn strings(matches: &clap::ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default()
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        formatters: strings(matches, "fmt"),
        to_source: matches.get_flag("to-source"),
        skip: strings(matches, "skip"),
        vendor: matches.get_flag("vendor"),
        debug: matches.get_flag("debug"),
        config: matches.get_one::<PathBuf>("config").cloned(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        paths: strings(matches, "paths"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_builds() {
        let cmd = build_cli();
        assert_eq!(cmd.get_name(), "multifmt");
        cmd.debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse_args_from(["multifmt"]);
        assert!(args.formatters.is_empty());
        assert!(args.paths.is_empty());
        assert!(!args.to_source);
        assert!(!args.vendor);
        assert!(!args.debug);
        assert_eq!(args.jobs, None);
    }

    #[test]
    fn test_formatters_keep_order() {
        let args = parse_args_from([
            "multifmt",
            "-f",
            "gofmt -s",
            "--fmt=goimports",
            "--fmt",
            "goremovelines",
            "main.go",
        ]);
        assert_eq!(args.formatters, ["gofmt -s", "goimports", "goremovelines"]);
        assert_eq!(args.paths, ["main.go"]);
    }

    #[test]
    fn test_skip_multiple() {
        let args = parse_args_from(["multifmt", "-s", "testdata", "--skip", "gen", "./..."]);
        assert_eq!(args.skip, ["testdata", "gen"]);
    }

    #[test]
    fn test_flags() {
        let args = parse_args_from(["multifmt", "-w", "-d", "--vendor", "-j", "4", "a", "b/..."]);
        assert!(args.to_source);
        assert!(args.debug);
        assert!(args.vendor);
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.paths, ["a", "b/..."]);
    }

    #[test]
    fn test_version_short_flag() {
        let err = build_cli()
            .try_get_matches_from(["multifmt", "-v"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_config_path() {
        let args = parse_args_from(["multifmt", "--config", "ci/multifmt.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("ci/multifmt.toml")));
    }
}
