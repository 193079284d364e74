// Command-line arguments.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "puppetdb-daily-report",
    version,
    about = "Send a daily summary of PuppetDB agent runs"
)]
pub struct Cli {
    /// PuppetDB hostname, or a full base URL (e.g. https://puppetdb.example.com:8081)
    #[arg(short = 'p', long = "puppetdb", value_name = "HOST")]
    pub puppetdb: String,

    /// Number of days to report on
    #[arg(short = 'n', long = "num-days", default_value_t = 7)]
    pub num_days: u32,

    /// Cache directory (default: ~/.puppetdb_daily_report)
    #[arg(short = 'c', long = "cache-dir", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Do not read or write the cache
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Write the report to a file instead of sending mail
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// Recipient address(es), comma separated; may be repeated
    #[arg(short = 't', long = "to", value_delimiter = ',', value_name = "ADDR")]
    pub to: Vec<String>,

    /// Verbose output; repeat for debug
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// TOML config file (default: $CONFIG_FILE if set)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.num_days > 0,
            "--num-days must be at least 1, got {}",
            self.num_days
        );
        anyhow::ensure!(
            self.dry_run || !self.recipients().is_empty(),
            "you must either run with --dry-run or specify to address(es) with --to"
        );
        Ok(())
    }

    /// `--to` values with blanks removed.
    pub fn recipients(&self) -> Vec<String> {
        self.to
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// None when caching is disabled.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        if self.no_cache {
            return None;
        }
        self.cache_dir.clone().or_else(default_cache_dir)
    }

    /// `warn` by default, `info` with -v, `debug` with -vv.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".puppetdb_daily_report"))
}
