//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const TAWHIRI_ORDER_HELP: &str = "\
Tawhiri order:
  Records are sorted by ascending forecast hour, then by descending pressure
  (so the level nearest the ground comes first), then by parameter in the
  order HGT, UGRD, VGRD. Within a record, values run from South to North in
  latitude and then from West to East in longitude.

  Only records whose type is \"anl\" or \"N hour fcst\" and whose layer is
  \"P mb\" take part; everything else is filtered out.";

/// Fetch GFS wind data and rearrange it into Tawhiri order.
///
/// Aonui downloads the subset of each Global Forecast System run needed by
/// the Tawhiri balloon predictor and reorders local GRIB2 files into the
/// record order Tawhiri expects.
#[derive(Parser, Debug)]
#[command(name = "aonui")]
#[command(author, version, about, after_long_help = TAWHIRI_ORDER_HELP)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read settings from this file instead of the default config location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// wgrib2 program to run
    #[arg(long, value_name = "COMMAND", env = "AONUI_WGRIB2", global = true)]
    pub wgrib2: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the newest complete run from the GFS servers
    Sync(SyncArgs),
    /// Copy the Tawhiri-valid records of a GRIB2 file in Tawhiri order
    Reorder(ReorderArgs),
    /// Reorder a GRIB2 file and expand it into raw native floats
    Extract(ExtractArgs),
    /// Summarize the shape of a GRIB2 file as Tawhiri would see it
    Info(InfoArgs),
    /// Print the inventory of a GRIB2 file in short format
    Inv(InvArgs),
}

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Directory to download data to [default: current directory]
    #[arg(long = "basedir", value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Download 0.25 degree data instead of 0.5 degree data
    #[arg(long = "highres")]
    pub high_res: bool,

    /// Number of newest runs to examine before giving up (1-50) [default: 3]
    #[arg(long = "maxruns", value_name = "N", value_parser = clap::value_parser!(u16).range(1..=50))]
    pub max_runs: Option<u16>,

    /// Maximum simultaneous dataset downloads (1-32) [default: 5]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=32))]
    pub max_downloads: Option<u8>,

    /// Attempts per request and per dataset (1-20) [default: 5]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ReorderArgs {
    /// GRIB2 file to read
    pub input: PathBuf,
    /// GRIB2 file to write
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Directory for the temporary reordered file [default: output's directory]
    #[arg(long = "tmpdir", value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,
    /// GRIB2 file to read
    pub input: PathBuf,
    /// Raw binary file to write; must not exist
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Print a JSON object instead of KEY=value lines
    #[arg(long)]
    pub json: bool,
    /// GRIB2 file to inspect
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct InvArgs {
    /// Keep the file's record order
    #[arg(long = "nosort")]
    pub no_sort: bool,
    /// Keep records Tawhiri does not use
    #[arg(long = "nofilter")]
    pub no_filter: bool,
    /// GRIB2 file to inspect
    pub input: PathBuf,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_sync_defaults_are_unset() {
        let cli = Cli::try_parse_from(["aonui", "sync"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert!(args.base_dir.is_none());
        assert!(!args.high_res);
        assert!(args.max_runs.is_none());
        assert!(args.max_downloads.is_none());
        assert!(args.max_retries.is_none());
    }

    #[test]
    fn test_cli_sync_flags() {
        let cli = Cli::try_parse_from([
            "aonui",
            "sync",
            "--basedir",
            "/data",
            "--highres",
            "--maxruns",
            "5",
            "--max-downloads",
            "8",
            "--max-retries",
            "2",
        ])
        .unwrap();
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.base_dir, Some(PathBuf::from("/data")));
        assert!(args.high_res);
        assert_eq!(args.max_runs, Some(5));
        assert_eq!(args.max_downloads, Some(8));
        assert_eq!(args.max_retries, Some(2));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let cli = Cli::try_parse_from(["aonui", "-v", "inv", "a.grib2"]).unwrap();
        assert_eq!(cli.verbose, 1);

        let cli = Cli::try_parse_from(["aonui", "inv", "a.grib2", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_is_global() {
        let cli = Cli::try_parse_from(["aonui", "info", "--quiet", "a.grib2"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_maxruns_zero_rejected() {
        let err = Cli::try_parse_from(["aonui", "sync", "--maxruns", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_max_downloads_over_max_rejected() {
        let err = Cli::try_parse_from(["aonui", "sync", "--max-downloads", "33"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_reorder_requires_two_paths() {
        let err = Cli::try_parse_from(["aonui", "reorder", "in.grib2"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["aonui", "reorder", "in.grib2", "out.grib2"]).unwrap();
        let Command::Reorder(args) = cli.command else {
            panic!("expected reorder");
        };
        assert_eq!(args.input, PathBuf::from("in.grib2"));
        assert_eq!(args.output, PathBuf::from("out.grib2"));
    }

    #[test]
    fn test_cli_extract_tmpdir() {
        let cli = Cli::try_parse_from(["aonui", "extract", "--tmpdir", "/tmp", "in.grib2", "out.bin"]).unwrap();
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.tmp_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(args.output, PathBuf::from("out.bin"));
    }

    #[test]
    fn test_cli_inv_toggles() {
        let cli = Cli::try_parse_from(["aonui", "inv", "--nosort", "--nofilter", "a.grib2"]).unwrap();
        let Command::Inv(args) = cli.command else {
            panic!("expected inv");
        };
        assert!(args.no_sort);
        assert!(args.no_filter);
    }

    #[test]
    fn test_cli_info_json() {
        let cli = Cli::try_parse_from(["aonui", "info", "--json", "a.grib2"]).unwrap();
        let Command::Info(args) = cli.command else {
            panic!("expected info");
        };
        assert!(args.json);
    }

    #[test]
    fn test_cli_wgrib2_flag() {
        let cli = Cli::try_parse_from(["aonui", "--wgrib2", "/opt/wgrib2", "inv", "a.grib2"]).unwrap();
        assert_eq!(cli.wgrib2.as_deref(), Some("/opt/wgrib2"));
    }

    #[test]
    fn test_cli_subcommand_required() {
        let err = Cli::try_parse_from(["aonui"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingSubcommand);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Cli::try_parse_from(["aonui", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_long_help_documents_tawhiri_order() {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        let help = cmd.render_long_help().to_string();
        assert!(help.contains("Tawhiri order"));
        assert!(help.contains("HGT, UGRD, VGRD"));
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Cli::try_parse_from(["aonui", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
