//! Reporting: time bucketing and complaint/technician aggregation.
//!
//! Bucketing is pure calendar arithmetic: a requested `[from, to)`
//! range is normalized into the target timezone's local calendar and
//! walked one unit at a time (day, month, or year), so variable month
//! lengths and leap years fall out of the calendar itself rather than
//! any fixed-duration math. The aggregations are read-only and
//! recomputed per call.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use fixdesk_common::{AppError, AppResult};
use fixdesk_db::repositories::{ComplaintRepository, UserRepository};
use serde::{Deserialize, Serialize};

/// Bucket granularity for complaint reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportInterval {
    /// One bucket per local calendar day (`YYYY-MM-DD`).
    Day,
    /// One bucket per local calendar month (`YYYY-MM`).
    #[default]
    Month,
    /// One bucket per local calendar year (`YYYY`).
    Year,
}

impl FromStr for ReportInterval {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(AppError::Validation(format!(
                "Invalid report interval: {other}"
            ))),
        }
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(tz: &str) -> AppResult<Tz> {
    tz.parse()
        .map_err(|_| AppError::Validation(format!("Invalid timezone: {tz}")))
}

/// Truncate a local date to the start of its bucket.
fn bucket_start(date: NaiveDate, interval: ReportInterval) -> NaiveDate {
    match interval {
        ReportInterval::Day => date,
        ReportInterval::Month => {
            NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
        }
        ReportInterval::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

/// Start of the bucket following `date` (which must be a bucket start).
fn next_bucket_start(date: NaiveDate, interval: ReportInterval) -> Option<NaiveDate> {
    match interval {
        ReportInterval::Day => date.succ_opt(),
        ReportInterval::Month => {
            let (year, month) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1)
        }
        ReportInterval::Year => NaiveDate::from_ymd_opt(date.year() + 1, 1, 1),
    }
}

/// Canonical key for the bucket starting at `date`.
fn bucket_key(date: NaiveDate, interval: ReportInterval) -> String {
    match interval {
        ReportInterval::Day => date.format("%Y-%m-%d").to_string(),
        ReportInterval::Month => date.format("%Y-%m").to_string(),
        ReportInterval::Year => date.format("%Y").to_string(),
    }
}

/// Ordered bucket keys spanning `[from, to)` in `tz`'s local calendar.
///
/// The walk starts at the truncated start of `from`'s bucket and stops
/// on reaching `to`'s bucket start, so callers supply `to` one unit
/// past the last desired bucket. `from >= to` yields an empty sequence.
#[must_use]
pub fn bucket_keys(
    interval: ReportInterval,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    tz: Tz,
) -> Vec<String> {
    if from >= to {
        return Vec::new();
    }

    let start = bucket_start(from.with_timezone(&tz).date_naive(), interval);
    let end = bucket_start(to.with_timezone(&tz).date_naive(), interval);

    let mut keys = Vec::new();
    let mut current = start;
    while current < end {
        keys.push(bucket_key(current, interval));
        match next_bucket_start(current, interval) {
            Some(next) => current = next,
            None => break,
        }
    }
    keys
}

/// Key of the bucket a timestamp falls in, in `tz`'s local calendar.
#[must_use]
pub fn bucket_key_for(ts: DateTime<Utc>, interval: ReportInterval, tz: Tz) -> String {
    bucket_key(bucket_start(ts.with_timezone(&tz).date_naive(), interval), interval)
}

/// Interpret a `YYYY-MM-DD` date string as local midnight in `tz`.
fn local_midnight_utc(date: NaiveDate, tz: Tz) -> AppResult<DateTime<Utc>> {
    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return Err(AppError::Validation(format!("Invalid date: {date}")));
    };
    match tz.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // DST fold: take the earlier instant
        chrono::LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
        chrono::LocalResult::None => Err(AppError::Validation(format!(
            "Midnight does not exist on {date} in this timezone"
        ))),
    }
}

fn parse_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date: {s}")))
}

/// One bucket of the created-vs-resolved complaint report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintReportBucket {
    /// Canonical bucket key (`YYYY-MM-DD` / `YYYY-MM` / `YYYY`).
    pub period: String,
    /// Complaints whose `created_at` falls in this bucket.
    pub created: u64,
    /// Complaints whose `resolved_at` falls in this bucket.
    pub resolved: u64,
}

/// One row of the per-technician report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianReportRow {
    /// Technician user id.
    pub technician_id: String,
    /// Technician display name.
    pub technician_name: String,
    /// Complaints whose `assigned_at` falls in the range.
    pub assigned: u64,
    /// Complaints whose `resolved_at` falls in the range.
    pub resolved: u64,
}

/// Complaint report query parameters, as the outer API layer sends
/// them (`to` is exclusive; dates are `YYYY-MM-DD` strings).
#[derive(Debug, Clone, Deserialize)]
pub struct ReportQuery {
    /// Bucket granularity; defaults to `month`.
    #[serde(default)]
    pub interval: ReportInterval,
    /// Inclusive range start.
    pub from: String,
    /// Exclusive range end (the UI widens its inclusive end by one day).
    pub to: String,
    /// IANA timezone; falls back to the configured default.
    #[serde(default)]
    pub tz: Option<String>,
}

/// Technician report query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TechnicianReportQuery {
    /// Inclusive range start.
    pub from: String,
    /// Exclusive range end.
    pub to: String,
    /// IANA timezone; falls back to the configured default.
    #[serde(default)]
    pub tz: Option<String>,
}

/// Read-only reporting service over the complaint collection.
#[derive(Clone)]
pub struct ReportingService {
    complaint_repo: ComplaintRepository,
    user_repo: UserRepository,
    default_timezone: Tz,
}

impl ReportingService {
    /// Create a new reporting service defaulting to UTC.
    #[must_use]
    pub const fn new(complaint_repo: ComplaintRepository, user_repo: UserRepository) -> Self {
        Self {
            complaint_repo,
            user_repo,
            default_timezone: chrono_tz::UTC,
        }
    }

    /// Override the fallback timezone used when a query carries none.
    #[must_use]
    pub const fn with_default_timezone(mut self, tz: Tz) -> Self {
        self.default_timezone = tz;
        self
    }

    fn resolve_timezone(&self, tz: Option<&str>) -> AppResult<Tz> {
        tz.map_or(Ok(self.default_timezone), parse_timezone)
    }

    /// Complaint counts per bucket: created vs. resolved.
    ///
    /// The two series are independent groupings, not a state snapshot;
    /// a complaint created in one bucket and resolved three buckets
    /// later contributes to each series in its own bucket. The full
    /// bucket sequence is returned, zero-filled, in chronological
    /// order. An inverted range yields an empty report, not an error.
    pub async fn complaints_created_vs_resolved(
        &self,
        interval: ReportInterval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        tz: Tz,
    ) -> AppResult<Vec<ComplaintReportBucket>> {
        let keys = bucket_keys(interval, from, to, tz);
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let index: HashMap<&str, usize> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.as_str(), i))
            .collect();
        let mut created_counts = vec![0_u64; keys.len()];
        let mut resolved_counts = vec![0_u64; keys.len()];

        for model in self.complaint_repo.find_created_in_range(from, to).await? {
            let key = bucket_key_for(model.created_at.with_timezone(&Utc), interval, tz);
            if let Some(&i) = index.get(key.as_str()) {
                created_counts[i] += 1;
            }
        }

        for model in self.complaint_repo.find_resolved_in_range(from, to).await? {
            let Some(resolved_at) = model.resolved_at else {
                continue;
            };
            let key = bucket_key_for(resolved_at.with_timezone(&Utc), interval, tz);
            if let Some(&i) = index.get(key.as_str()) {
                resolved_counts[i] += 1;
            }
        }

        Ok(keys
            .into_iter()
            .zip(created_counts)
            .zip(resolved_counts)
            .map(|((period, created), resolved)| ComplaintReportBucket {
                period,
                created,
                resolved,
            })
            .collect())
    }

    /// Per-technician totals over `[from, to)`: assigned vs. resolved.
    ///
    /// One row per technician with at least one qualifying event, sorted
    /// by technician id for stable output (display ordering is the UI's
    /// business).
    pub async fn technicians_assigned_vs_resolved(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<TechnicianReportRow>> {
        if from >= to {
            return Ok(Vec::new());
        }

        let mut totals: HashMap<String, (u64, u64)> = HashMap::new();

        for model in self.complaint_repo.find_assigned_in_range(from, to).await? {
            if let Some(technician_id) = model.assigned_technician_id {
                totals.entry(technician_id).or_default().0 += 1;
            }
        }
        for model in self.complaint_repo.find_resolved_in_range(from, to).await? {
            if let Some(technician_id) = model.assigned_technician_id {
                totals.entry(technician_id).or_default().1 += 1;
            }
        }

        let ids: Vec<String> = totals.keys().cloned().collect();
        let names: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect();

        let mut rows: Vec<TechnicianReportRow> = totals
            .into_iter()
            .map(|(technician_id, (assigned, resolved))| {
                let technician_name = names
                    .get(&technician_id)
                    .cloned()
                    .unwrap_or_else(|| technician_id.clone());
                TechnicianReportRow {
                    technician_id,
                    technician_name,
                    assigned,
                    resolved,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.technician_id.cmp(&b.technician_id));
        Ok(rows)
    }

    /// Run the complaint report from verbatim query parameters.
    pub async fn complaints_report(
        &self,
        query: &ReportQuery,
    ) -> AppResult<Vec<ComplaintReportBucket>> {
        let tz = self.resolve_timezone(query.tz.as_deref())?;
        let from = local_midnight_utc(parse_date(&query.from)?, tz)?;
        let to = local_midnight_utc(parse_date(&query.to)?, tz)?;
        self.complaints_created_vs_resolved(query.interval, from, to, tz)
            .await
    }

    /// Run the technician report from verbatim query parameters.
    pub async fn technicians_report(
        &self,
        query: &TechnicianReportQuery,
    ) -> AppResult<Vec<TechnicianReportRow>> {
        let tz = self.resolve_timezone(query.tz.as_deref())?;
        let from = local_midnight_utc(parse_date(&query.from)?, tz)?;
        let to = local_midnight_utc(parse_date(&query.to)?, tz)?;
        self.technicians_assigned_vs_resolved(from, to).await
    }
}
