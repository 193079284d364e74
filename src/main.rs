use anyhow::{Context, Result};
use clap::Parser;
use puppetdb_daily_report::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    args.validate()?;
    let app_config = config::AppConfig::load(args.config.as_deref())?;

    let inventory = puppetdb_repo::PuppetDbRepo::connect(
        &args.puppetdb,
        app_config.puppetdb.port,
        app_config.puppetdb.timeout(),
    )?;
    tracing::info!("Querying PuppetDB at {}", inventory.base());

    let cache = match args.cache_dir() {
        Some(dir) => Some(
            cache_repo::ReportCache::open(&dir)
                .await
                .with_context(|| format!("opening cache in {}", dir.display()))?,
        ),
        None => {
            if !args.no_cache {
                tracing::warn!("no home directory found; running without a cache");
            }
            None
        }
    };

    let options = report::ReportOptions {
        num_days: args.num_days,
        thresholds: app_config.report.thresholds(),
    };
    let report = report::run_report(
        &inventory,
        &args.puppetdb,
        &options,
        cache.as_ref(),
        chrono::Local::now(),
    )
    .await?;

    let html = render::format_html(
        &report,
        &render::ViewSettings {
            num_rows: app_config.report.num_rows,
            runs_per_day: app_config.report.runs_per_day,
        },
    )?;

    mailer::send_mail(
        &app_config.mail,
        &args.recipients(),
        &mailer::subject(&args.puppetdb),
        &html,
        args.dry_run,
    )
    .await?;

    Ok(())
}
