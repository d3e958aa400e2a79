//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// depreport - health report for pinned glide dependencies
///
/// Syncs every locked dependency into a local cache and reports on its
/// semantic version compliance and how far behind its branch it is pinned.
#[derive(Parser, Debug)]
#[command(name = "depreport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "DEPREPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache root directory
    #[arg(long, env = "DEPREPORT_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Number of concurrent fetch workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Project directory to search upward from (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::try_parse_from([
            "depreport",
            "--no-color",
            "-vv",
            "--cache-dir",
            "/tmp/cache",
            "--workers",
            "4",
            "--project",
            "/src/app",
        ])
        .unwrap();
        assert!(cli.no_color);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.project, Some(PathBuf::from("/src/app")));
    }

    #[test]
    fn rejects_positional_arguments() {
        assert!(Cli::try_parse_from(["depreport", "extra"]).is_err());
    }
}
