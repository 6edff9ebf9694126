use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use regex::Regex;

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// The fixed +09:00 offset every week boundary and stored timestamp uses.
#[must_use]
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("valid KST offset")
}

#[must_use]
pub fn now_kst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst())
}

/// RFC 3339 rendering in the fixed zone, second precision.
#[must_use]
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.with_timezone(&kst())
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
}

/// Locale rendering such as `2025. 1. 7. 오후 2:23:45`.
static KOREAN_LOCALE_TS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})\.\s*(\d{1,2})\.\s*(\d{1,2})\.\s*(오전|오후)\s*(\d{1,2}):(\d{2}):(\d{2})$",
    )
    .expect("valid regex")
});

/// Parse a stored timestamp cell.
///
/// Accepts RFC 3339, zone-less `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`
/// (taken as KST), and the Korean locale form. Returns `None` for blank or
/// unrecognized input.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return kst().from_local_datetime(&naive).single();
        }
    }

    parse_korean_locale(raw)
}

fn parse_korean_locale(raw: &str) -> Option<DateTime<FixedOffset>> {
    let caps = KOREAN_LOCALE_TS.captures(raw)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let hour12: u32 = caps[5].parse().ok()?;
    let minute: u32 = caps[6].parse().ok()?;
    let second: u32 = caps[7].parse().ok()?;

    let hour = match (&caps[4], hour12) {
        ("오전", 12) => 0,
        ("오후", h) if h < 12 => h + 12,
        (_, h) => h,
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    kst().from_local_datetime(&date.and_time(time)).single()
}

/// A Monday-through-Sunday week in KST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    start: NaiveDate,
}

impl WeekRange {
    /// The week that contains `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let offset = i64::from(date.weekday().num_days_from_monday());
        Self {
            start: date - Duration::days(offset),
        }
    }

    /// The most recent week that has fully ended at `now`.
    #[must_use]
    pub fn last_completed(now: DateTime<Utc>) -> Self {
        let today = now.with_timezone(&kst()).date_naive();
        Self::containing(today).previous()
    }

    #[must_use]
    pub fn previous(&self) -> Self {
        Self {
            start: self.start - Duration::days(7),
        }
    }

    /// Monday.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Sunday.
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.start + Duration::days(6)
    }

    /// Monday 00:00:00 KST.
    #[must_use]
    pub fn start(&self) -> DateTime<FixedOffset> {
        self.at_midnight(self.start)
    }

    /// Sunday 23:59:59 KST.
    #[must_use]
    pub fn end(&self) -> DateTime<FixedOffset> {
        self.at_midnight(self.start + Duration::days(7)) - Duration::seconds(1)
    }

    /// `YYYY-MM-DD_YYYY-MM-DD`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}_{}",
            self.start_date().format("%Y-%m-%d"),
            self.end_date().format("%Y-%m-%d")
        )
    }

    /// Whether `ts` falls inside the week, inclusive of the final second.
    #[must_use]
    pub fn contains(&self, ts: &DateTime<FixedOffset>) -> bool {
        let next_week = self.at_midnight(self.start + Duration::days(7));
        *ts >= self.start() && *ts < next_week
    }

    /// Calendar months (year, month) the week touches, in order.
    #[must_use]
    pub fn months(&self) -> Vec<(i32, u32)> {
        let first = (self.start_date().year(), self.start_date().month());
        let last = (self.end_date().year(), self.end_date().month());
        if first == last {
            vec![first]
        } else {
            vec![first, last]
        }
    }

    fn at_midnight(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        let utc = date.and_time(NaiveTime::MIN) - Duration::seconds(i64::from(KST_OFFSET_SECS));
        DateTime::from_naive_utc_and_offset(utc, kst())
    }
}

impl std::fmt::Display for WeekRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}
