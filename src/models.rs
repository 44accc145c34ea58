use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One logged symptom, stamped with the offset of the request that created it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SymptomEntry {
    pub id: Uuid,
    pub occurred_at: DateTime<FixedOffset>,
    pub symptom_label: String,
    pub severity: u8,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub humidity_pct: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i32>,
}

/// Persisted state: every user's entries in chronological order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    pub users: BTreeMap<String, Vec<SymptomEntry>>,
}

impl AppData {
    pub fn entries_for(&self, user_id: &str) -> &[SymptomEntry] {
        self.users.get(user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Inserts keeping the user's list sorted by `occurred_at`.
    pub fn insert_entry(&mut self, user_id: &str, entry: SymptomEntry) {
        let entries = self.users.entry(user_id.to_string()).or_default();
        let at = entry.occurred_at;
        let pos = entries.partition_point(|existing| existing.occurred_at <= at);
        entries.insert(pos, entry);
    }

    /// Drops one entry again, e.g. when saving it failed.
    pub fn remove_entry(&mut self, user_id: &str, id: Uuid) -> Option<SymptomEntry> {
        let entries = self.users.get_mut(user_id)?;
        let pos = entries.iter().position(|entry| entry.id == id)?;
        let removed = entries.remove(pos);
        if entries.is_empty() {
            self.users.remove(user_id);
        }
        Some(removed)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSymptomRequest {
    pub symptom_type: Option<String>,
    pub severity: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Minutes east of UTC for the caller's clock.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SymptomCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeverityTrend {
    pub direction: TrendDirection,
    pub percent_change: u32,
    pub prior_average: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SymptomSeverity {
    pub label: String,
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherCorrelation {
    pub label: String,
    pub condition_description: String,
    pub correlation_percent: u32,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DayPeak {
    pub day: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HourPeak {
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimePatterns {
    pub peak_day_of_week: Option<DayPeak>,
    pub peak_hour_of_day: Option<HourPeak>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BucketCounts {
    pub mild: usize,
    pub moderate: usize,
    pub severe: usize,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BucketPercentages {
    pub mild: u32,
    pub moderate: u32,
    pub severe: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SeverityBuckets {
    pub counts: BucketCounts,
    pub percentages: BucketPercentages,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub period: String,
    pub window_entry_count: usize,
    pub all_time_entry_count: usize,
    pub top_symptom: Option<SymptomCount>,
    pub average_severity: f64,
    pub severity_trend: SeverityTrend,
    pub severity_by_symptom: Vec<SymptomSeverity>,
    pub weather_correlations: Vec<WeatherCorrelation>,
    pub time_patterns: TimePatterns,
    pub severity_buckets: SeverityBuckets,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeverityPoint {
    pub occurred_at: DateTime<FixedOffset>,
    pub symptom_label: String,
    pub severity: u8,
}

/// Headline figures and the chart series for the dashboard view.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_entries: usize,
    pub recent_average_severity: u32,
    pub recent_entries: Vec<SymptomEntry>,
    pub severity_series: Vec<SeverityPoint>,
}
