use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregation::AggregationThresholds;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub puppetdb: PuppetDbConfig,
    pub report: ReportConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PuppetDbConfig {
    /// Used when the host is given without a scheme.
    pub port: u16,
    pub timeout_secs: u64,
}

impl Default for PuppetDbConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            timeout_secs: 60,
        }
    }
}

impl PuppetDbConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Expected agent runs per node per day; fewer is flagged.
    pub runs_per_day: u64,
    /// Share of runs a resource must change in to count as flapping on a node.
    pub flapping_ratio: f64,
    /// Rows in each top-N resource table.
    pub num_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            runs_per_day: 40,
            flapping_ratio: 0.45,
            num_rows: 10,
        }
    }
}

impl ReportConfig {
    pub fn thresholds(&self) -> AggregationThresholds {
        AggregationThresholds {
            runs_per_day: self.runs_per_day,
            flapping_ratio: self.flapping_ratio,
        }
    }
}

/// How a real (non dry-run) report is handed off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    #[default]
    Smtp,
    Sendmail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub transport: MailTransport,
    /// Plain SMTP relay, no TLS or auth.
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sendmail_path: PathBuf,
    /// Sender address; `<user>@<host>` when unset.
    pub from: Option<String>,
    /// Where a dry run writes the HTML body.
    pub dry_run_output: PathBuf,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::Smtp,
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
            sendmail_path: PathBuf::from("/usr/sbin/sendmail"),
            from: None,
            dry_run_output: PathBuf::from("output.html"),
        }
    }
}

impl AppConfig {
    /// Load from `path`, else from `CONFIG_FILE`, else built-in defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os("CONFIG_FILE").map(PathBuf::from),
        };
        let Some(path) = path else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.puppetdb.port > 0,
            "puppetdb.port must be between 1 and 65535, got {}",
            self.puppetdb.port
        );
        anyhow::ensure!(
            self.puppetdb.timeout_secs > 0,
            "puppetdb.timeout_secs must be > 0, got {}",
            self.puppetdb.timeout_secs
        );
        anyhow::ensure!(
            self.report.runs_per_day > 0,
            "report.runs_per_day must be > 0, got {}",
            self.report.runs_per_day
        );
        anyhow::ensure!(
            self.report.flapping_ratio > 0.0 && self.report.flapping_ratio <= 1.0,
            "report.flapping_ratio must be in (0, 1], got {}",
            self.report.flapping_ratio
        );
        anyhow::ensure!(
            self.report.num_rows > 0,
            "report.num_rows must be > 0, got {}",
            self.report.num_rows
        );
        match self.mail.transport {
            MailTransport::Smtp => {
                anyhow::ensure!(!self.mail.smtp_host.is_empty(), "mail.smtp_host must be non-empty");
                anyhow::ensure!(
                    self.mail.smtp_port > 0,
                    "mail.smtp_port must be between 1 and 65535, got {}",
                    self.mail.smtp_port
                );
            }
            MailTransport::Sendmail => anyhow::ensure!(
                !self.mail.sendmail_path.as_os_str().is_empty(),
                "mail.sendmail_path must be non-empty"
            ),
        }
        anyhow::ensure!(
            !self.mail.dry_run_output.as_os_str().is_empty(),
            "mail.dry_run_output must be non-empty"
        );
        if let Some(from) = &self.mail.from {
            anyhow::ensure!(from.contains('@'), "mail.from must be an address, got {:?}", from);
        }
        Ok(())
    }
}
