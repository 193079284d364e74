// Day windows for the report: whole local days, newest first, expressed in UTC.

use chrono::{DateTime, Days, Duration, NaiveDate, TimeZone, Utc};
use tracing::debug;

use crate::models::DayWindow;

const LABEL_FORMAT: &str = "%a %m/%d";
const LOG_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// First instant of `date` in `tz`. A midnight skipped by a DST jump resolves to the
/// earliest local time that exists after it.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> anyhow::Result<DateTime<Tz>> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Ok(dt);
    }
    (1..=24)
        .map(|h| naive + Duration::hours(h))
        .find_map(|later| tz.from_local_datetime(&later).earliest())
        .ok_or_else(|| anyhow::anyhow!("no local midnight for {}", date))
}

/// `num_days` windows covering the local calendar days before `now`'s day.
///
/// Window `i` runs from local midnight of `today - (i + 1)` to one second before the
/// next local midnight, so a day across a DST change is 23 or 25 hours long. Windows
/// are contiguous and ordered most recent first.
pub fn get_date_list<Tz: TimeZone>(num_days: u32, now: DateTime<Tz>) -> anyhow::Result<Vec<DayWindow>>
where
    Tz::Offset: std::fmt::Display,
{
    let tz = now.timezone();
    let today = now.date_naive();
    let local_end = local_midnight(&tz, today)? - Duration::seconds(1);
    debug!("local_start_date={}", local_end.format(LOG_FORMAT));
    debug!("start_date={}", local_end.with_timezone(&Utc).format(LOG_FORMAT));

    let mut windows = Vec::with_capacity(num_days as usize);
    for i in 0..num_days {
        let date = today
            .checked_sub_days(Days::new(u64::from(i) + 1))
            .ok_or_else(|| anyhow::anyhow!("date out of range"))?;
        let start = local_midnight(&tz, date)?;
        let next = date
            .succ_opt()
            .ok_or_else(|| anyhow::anyhow!("date out of range"))?;
        let end = local_midnight(&tz, next)? - Duration::seconds(1);
        windows.push(DayWindow {
            label: start.format(LABEL_FORMAT).to_string(),
            date,
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        });
    }
    if let Some(last) = windows.last() {
        debug!("end_date={}", last.start.format(LOG_FORMAT));
    }
    Ok(windows)
}
