// Dump recent report_cache rows as JSON (decodes the versioned DayData BLOBs).
//
// Usage: cargo run --example dump_cache -- [CACHE_DIR] [LIMIT]
//   CACHE_DIR  default: ~/.puppetdb_daily_report
//   LIMIT      default: 5

use puppetdb_daily_report::cache_repo::ReportCache;
use puppetdb_daily_report::cli::default_cache_dir;
use std::env;
use std::path::PathBuf;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let dir = match args.get(1) {
        Some(p) => PathBuf::from(p),
        None => default_cache_dir().ok_or_else(|| anyhow::anyhow!("no home directory; pass CACHE_DIR"))?,
    };
    let limit: u32 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    let cache = ReportCache::open(&dir).await?;
    let entries = cache.list_entries(limit).await?;

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
