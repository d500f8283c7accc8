//! Command-line interface for fparse.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to parse
    pub inputs: Vec<PathBuf>,

    /// Forced dialect (`fixed77`, `fixed90`, `free90`, `signature`)
    pub dialect: Option<String>,

    /// Print the parsed statement tree
    pub tree: bool,

    /// Print the canonical rendering of the parsed source
    pub canonical: bool,

    /// Print per-scope symbol tables
    pub symbols: bool,

    /// Maximum block nesting depth
    pub max_depth: Option<usize>,

    /// Explicit config file path
    pub config: Option<PathBuf>,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Number of parallel jobs (0 = default)
    pub jobs: Option<usize>,

    /// Only print the per-file summary line, not each diagnostic
    pub quiet: bool,
}

/// Build the CLI command definition
#[must_use]
pub fn build_cli() -> Command {
    Command::new("fparse")
        .about("Parse Fortran source into a statement tree with per-scope symbol tables")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to parse ('-' for stdin)")
                .num_args(0..)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dialect")
                .short('d')
                .long("dialect")
                .help("Force a dialect: fixed77, fixed90, free90, signature")
                .num_args(1),
        )
        .arg(
            Arg::new("tree")
                .short('t')
                .long("tree")
                .help("Print the parsed statement tree")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("canonical")
                .short('c')
                .long("canonical")
                .help("Print the canonical rendering of the parsed source")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("symbols")
                .short('s')
                .long("symbols")
                .help("Print per-scope symbol tables")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .help("Maximum block nesting depth")
                .value_parser(clap::value_parser!(usize))
                .num_args(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Use this config file instead of auto-discovery")
                .value_parser(clap::value_parser!(PathBuf))
                .num_args(1),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/directories matching pattern (glob syntax, can be repeated)")
                .action(ArgAction::Append)
                .num_args(1),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (default: number of cores)")
                .value_parser(clap::value_parser!(usize))
                .num_args(1),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print per-file summaries, not each diagnostic")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments from the process environment
#[must_use]
pub fn parse_args() -> CliArgs {
    parse_args_from(std::env::args())
}

/// Parse CLI arguments from an explicit iterator (used by tests)
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_cli().get_matches_from(args);
    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|v| v.cloned().collect())
            .unwrap_or_default(),
        dialect: matches.get_one::<String>("dialect").cloned(),
        tree: matches.get_flag("tree"),
        canonical: matches.get_flag("canonical"),
        symbols: matches.get_flag("symbols"),
        max_depth: matches.get_one::<usize>("max-depth").copied(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|v| v.cloned().collect())
            .unwrap_or_default(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        quiet: matches.get_flag("quiet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_args() {
        let args = parse_args_from(["fparse", "a.f90", "b.f"]);
        assert_eq!(args.inputs.len(), 2);
        assert!(!args.tree);
        assert!(args.dialect.is_none());
    }

    #[test]
    fn test_flags() {
        let args = parse_args_from([
            "fparse",
            "--tree",
            "--symbols",
            "-d",
            "fixed77",
            "--max-depth",
            "64",
            "-e",
            "build/**",
            "x.f",
        ]);
        assert!(args.tree);
        assert!(args.symbols);
        assert_eq!(args.dialect.as_deref(), Some("fixed77"));
        assert_eq!(args.max_depth, Some(64));
        assert_eq!(args.exclude, vec!["build/**"]);
    }
}
