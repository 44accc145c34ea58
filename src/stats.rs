use crate::models::{
    AggregateReport, BucketCounts, BucketPercentages, DashboardSummary, DayPeak, HourPeak,
    SeverityBuckets, SeverityPoint, SeverityTrend, SymptomCount, SymptomEntry, SymptomSeverity,
    TimePatterns, TrendDirection, WeatherCorrelation,
};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use std::collections::HashMap;

pub const WINDOW_DAYS: i64 = 30;
pub const DASHBOARD_RECENT_ENTRIES: usize = 10;
pub const DASHBOARD_SERIES_POINTS: usize = 30;

/// Cutoffs for the weather heuristics. A label is reported when at least
/// `significance_percent` of its weather-tagged entries sit above the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPolicy {
    pub temperature_threshold_c: f64,
    pub humidity_threshold_pct: f64,
    pub min_samples: usize,
    pub significance_percent: u32,
    pub max_results: usize,
}

impl Default for CorrelationPolicy {
    fn default() -> Self {
        Self {
            temperature_threshold_c: 24.0,
            humidity_threshold_pct: 70.0,
            min_samples: 3,
            significance_percent: 50,
            max_results: 5,
        }
    }
}

pub fn compute_report(entries: &[SymptomEntry], now: DateTime<Utc>) -> AggregateReport {
    compute_report_with(entries, now, &CorrelationPolicy::default())
}

pub fn compute_report_with(
    entries: &[SymptomEntry],
    now: DateTime<Utc>,
    policy: &CorrelationPolicy,
) -> AggregateReport {
    let recent_start = now - Duration::days(WINDOW_DAYS);
    let previous_start = now - Duration::days(WINDOW_DAYS * 2);

    let mut recent = Vec::new();
    let mut previous = Vec::new();
    for entry in entries {
        let at = entry.occurred_at.with_timezone(&Utc);
        if at >= recent_start {
            recent.push(entry);
        } else if at >= previous_start {
            previous.push(entry);
        }
    }

    let labels = tally_labels(&recent, policy);
    let average_severity = round_tenth(mean_severity(&recent).unwrap_or(0.0));

    AggregateReport {
        period: format!("Last {WINDOW_DAYS} Days"),
        window_entry_count: recent.len(),
        all_time_entry_count: entries.len(),
        top_symptom: top_symptom(&labels),
        average_severity,
        severity_trend: severity_trend(average_severity, mean_severity(&previous)),
        severity_by_symptom: severity_by_symptom(&labels),
        weather_correlations: weather_correlations(&labels, policy),
        time_patterns: time_patterns(&recent),
        severity_buckets: severity_buckets(&recent),
    }
}

/// Dashboard figures over entries in chronological order: the newest ten
/// entries with their whole-number mean severity, and the newest thirty
/// severities oldest first for charting.
pub fn compute_dashboard(entries: &[SymptomEntry]) -> DashboardSummary {
    let recent_entries: Vec<SymptomEntry> = entries
        .iter()
        .rev()
        .take(DASHBOARD_RECENT_ENTRIES)
        .cloned()
        .collect();
    let recent_refs: Vec<&SymptomEntry> = recent_entries.iter().collect();
    let recent_average_severity = mean_severity(&recent_refs)
        .map(|mean| mean.round() as u32)
        .unwrap_or(0);

    let series_start = entries.len().saturating_sub(DASHBOARD_SERIES_POINTS);
    let severity_series = entries[series_start..]
        .iter()
        .map(|entry| SeverityPoint {
            occurred_at: entry.occurred_at,
            symptom_label: entry.symptom_label.clone(),
            severity: entry.severity,
        })
        .collect();

    DashboardSummary {
        total_entries: entries.len(),
        recent_average_severity,
        recent_entries,
        severity_series,
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Exposure {
    samples: usize,
    above: usize,
}

impl Exposure {
    fn record(&mut self, reading: Option<f64>, threshold: f64) {
        if let Some(value) = reading {
            self.samples += 1;
            if value > threshold {
                self.above += 1;
            }
        }
    }

    fn significant_percent(&self, policy: &CorrelationPolicy) -> Option<u32> {
        if self.samples < policy.min_samples {
            return None;
        }
        let percent = percent_of(self.above, self.samples);
        (percent >= policy.significance_percent).then_some(percent)
    }
}

#[derive(Debug)]
struct LabelTally<'a> {
    label: &'a str,
    count: usize,
    severity_total: u64,
    temperature: Exposure,
    humidity: Exposure,
}

/// Per-label accumulators in first-encounter order.
fn tally_labels<'a>(
    recent: &[&'a SymptomEntry],
    policy: &CorrelationPolicy,
) -> Vec<LabelTally<'a>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<LabelTally<'a>> = Vec::new();

    for &entry in recent {
        let slot = *index.entry(entry.symptom_label.as_str()).or_insert_with(|| {
            tallies.push(LabelTally {
                label: entry.symptom_label.as_str(),
                count: 0,
                severity_total: 0,
                temperature: Exposure::default(),
                humidity: Exposure::default(),
            });
            tallies.len() - 1
        });

        let tally = &mut tallies[slot];
        tally.count += 1;
        tally.severity_total += u64::from(entry.severity);
        tally
            .temperature
            .record(entry.temperature_c, policy.temperature_threshold_c);
        tally
            .humidity
            .record(entry.humidity_pct, policy.humidity_threshold_pct);
    }

    tallies
}

fn top_symptom(labels: &[LabelTally<'_>]) -> Option<SymptomCount> {
    let mut best: Option<&LabelTally<'_>> = None;
    for tally in labels {
        // strict comparison keeps the earliest label on ties
        if best.is_none_or(|current| tally.count > current.count) {
            best = Some(tally);
        }
    }
    best.map(|tally| SymptomCount {
        label: tally.label.to_string(),
        count: tally.count,
    })
}

fn severity_by_symptom(labels: &[LabelTally<'_>]) -> Vec<SymptomSeverity> {
    let mut rows: Vec<SymptomSeverity> = labels
        .iter()
        .map(|tally| SymptomSeverity {
            label: tally.label.to_string(),
            average: round_tenth(tally.severity_total as f64 / tally.count as f64),
            count: tally.count,
        })
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

fn severity_trend(average_severity: f64, previous_mean: Option<f64>) -> SeverityTrend {
    let prior = previous_mean.unwrap_or(average_severity);
    let direction = if average_severity > prior {
        TrendDirection::Increasing
    } else if average_severity < prior {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };
    let percent_change = if prior > 0.0 {
        ((average_severity - prior).abs() / prior * 100.0).round() as u32
    } else {
        0
    };

    SeverityTrend {
        direction,
        percent_change,
        prior_average: round_tenth(prior),
    }
}

fn weather_correlations(
    labels: &[LabelTally<'_>],
    policy: &CorrelationPolicy,
) -> Vec<WeatherCorrelation> {
    let mut found = Vec::new();

    let temperature_condition = format!("Temperature > {}°C", policy.temperature_threshold_c);
    for tally in labels {
        if let Some(percent) = tally.temperature.significant_percent(policy) {
            found.push(correlation(
                tally.label,
                &temperature_condition,
                percent,
                format!(
                    "{percent}% occur when temperature > {}°C",
                    policy.temperature_threshold_c
                ),
            ));
        }
    }

    let humidity_condition = format!("Humidity > {}%", policy.humidity_threshold_pct);
    for tally in labels {
        if let Some(percent) = tally.humidity.significant_percent(policy) {
            found.push(correlation(
                tally.label,
                &humidity_condition,
                percent,
                format!(
                    "{percent}% occur when humidity > {}%",
                    policy.humidity_threshold_pct
                ),
            ));
        }
    }

    found.sort_by(|a, b| b.correlation_percent.cmp(&a.correlation_percent));
    found.truncate(policy.max_results);
    found
}

fn correlation(
    label: &str,
    condition: &str,
    percent: u32,
    description: String,
) -> WeatherCorrelation {
    WeatherCorrelation {
        label: label.to_string(),
        condition_description: condition.to_string(),
        correlation_percent: percent,
        description,
    }
}

fn time_patterns(recent: &[&SymptomEntry]) -> TimePatterns {
    let mut days: Vec<(Weekday, usize)> = Vec::with_capacity(7);
    let mut hours = [0usize; 24];

    for entry in recent {
        // the stored offset is the one the entry was logged under
        let local = entry.occurred_at;
        let weekday = local.weekday();
        match days.iter_mut().find(|(day, _)| *day == weekday) {
            Some((_, count)) => *count += 1,
            None => days.push((weekday, 1)),
        }
        hours[local.hour() as usize] += 1;
    }

    let mut peak_day: Option<(Weekday, usize)> = None;
    for &(day, count) in &days {
        if peak_day.is_none_or(|(_, best)| count > best) {
            peak_day = Some((day, count));
        }
    }

    let mut peak_hour: Option<(u32, usize)> = None;
    for (hour, &count) in hours.iter().enumerate() {
        if count > 0 && peak_hour.is_none_or(|(_, best)| count > best) {
            peak_hour = Some((hour as u32, count));
        }
    }

    TimePatterns {
        peak_day_of_week: peak_day.map(|(day, count)| DayPeak {
            day: day_name(day).to_string(),
            count,
        }),
        peak_hour_of_day: peak_hour.map(|(hour, count)| HourPeak { hour, count }),
    }
}

fn severity_buckets(recent: &[&SymptomEntry]) -> SeverityBuckets {
    let mut counts = BucketCounts::default();
    for entry in recent {
        match entry.severity {
            0..=3 => counts.mild += 1,
            4..=6 => counts.moderate += 1,
            _ => counts.severe += 1,
        }
    }

    let total = recent.len();
    let percentages = BucketPercentages {
        mild: percent_of(counts.mild, total),
        moderate: percent_of(counts.moderate, total),
        severe: percent_of(counts.severe, total),
    };

    SeverityBuckets {
        counts,
        percentages,
    }
}

fn mean_severity(entries: &[&SymptomEntry]) -> Option<f64> {
    if entries.is_empty() {
        return None;
    }
    let total: u64 = entries.iter().map(|entry| u64::from(entry.severity)).sum();
    Some(total as f64 / entries.len() as f64)
}

fn percent_of(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn entry_at(
        at: DateTime<FixedOffset>,
        label: &str,
        severity: u8,
        temperature_c: Option<f64>,
        humidity_pct: Option<f64>,
    ) -> SymptomEntry {
        SymptomEntry {
            id: Uuid::new_v4(),
            occurred_at: at,
            symptom_label: label.to_string(),
            severity,
            notes: None,
            temperature_c,
            humidity_pct,
            weather_code: None,
        }
    }

    fn entry(days_ago: i64, label: &str, severity: u8) -> SymptomEntry {
        weather_entry(days_ago, label, severity, None, None)
    }

    fn weather_entry(
        days_ago: i64,
        label: &str,
        severity: u8,
        temperature_c: Option<f64>,
        humidity_pct: Option<f64>,
    ) -> SymptomEntry {
        let utc = FixedOffset::east_opt(0).unwrap();
        let at = (now() - Duration::days(days_ago)).with_timezone(&utc);
        entry_at(at, label, severity, temperature_c, humidity_pct)
    }

    #[test]
    fn migraine_scenario_matches_expected_report() {
        let entries = vec![
            weather_entry(2, "Migraine", 8, Some(30.0), None),
            weather_entry(1, "Migraine", 6, Some(20.0), None),
            weather_entry(0, "Migraine", 9, Some(28.0), None),
        ];

        let report = compute_report(&entries, now());
        assert_eq!(
            report.top_symptom,
            Some(SymptomCount {
                label: "Migraine".to_string(),
                count: 3
            })
        );
        assert_eq!(report.average_severity, 7.7);
        assert_eq!(report.weather_correlations.len(), 1);
        let correlation = &report.weather_correlations[0];
        assert_eq!(correlation.label, "Migraine");
        assert_eq!(correlation.condition_description, "Temperature > 24°C");
        assert_eq!(correlation.correlation_percent, 67);
        assert_eq!(correlation.description, "67% occur when temperature > 24°C");
    }

    #[test]
    fn average_severity_is_window_mean() {
        let entries = vec![
            entry(1, "Headache", 2),
            entry(2, "Headache", 4),
            entry(3, "Nausea", 6),
            entry(4, "Nausea", 8),
            entry(45, "Nausea", 1),
        ];

        let report = compute_report(&entries, now());
        assert_eq!(report.average_severity, 5.0);
        assert_eq!(report.window_entry_count, 4);
        assert_eq!(report.all_time_entry_count, 5);
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let report = compute_report(&[], now());
        assert_eq!(report.window_entry_count, 0);
        assert_eq!(report.all_time_entry_count, 0);
        assert_eq!(report.average_severity, 0.0);
        assert!(report.top_symptom.is_none());
        assert_eq!(report.severity_trend.direction, TrendDirection::Stable);
        assert_eq!(report.severity_trend.percent_change, 0);
        assert_eq!(report.severity_buckets.percentages, BucketPercentages::default());
        assert!(report.time_patterns.peak_day_of_week.is_none());
        assert!(report.time_patterns.peak_hour_of_day.is_none());
    }

    #[test]
    fn trend_is_stable_without_previous_window() {
        let entries = vec![entry(1, "Fatigue", 9), entry(2, "Fatigue", 3)];
        let report = compute_report(&entries, now());
        assert_eq!(report.severity_trend.direction, TrendDirection::Stable);
        assert_eq!(report.severity_trend.percent_change, 0);
        assert_eq!(report.severity_trend.prior_average, 6.0);
    }

    #[test]
    fn trend_compares_consecutive_windows() {
        let entries = vec![
            entry(40, "Fatigue", 4),
            entry(50, "Fatigue", 4),
            entry(5, "Fatigue", 6),
            entry(70, "Fatigue", 10),
        ];

        let report = compute_report(&entries, now());
        assert_eq!(report.severity_trend.direction, TrendDirection::Increasing);
        assert_eq!(report.severity_trend.percent_change, 50);
        assert_eq!(report.severity_trend.prior_average, 4.0);

        let entries = vec![entry(40, "Fatigue", 8), entry(5, "Fatigue", 6)];
        let report = compute_report(&entries, now());
        assert_eq!(report.severity_trend.direction, TrendDirection::Decreasing);
        assert_eq!(report.severity_trend.percent_change, 25);
    }

    #[test]
    fn window_edges_are_inclusive_at_start() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let at = |offset: Duration| (now() - offset).with_timezone(&utc);
        let entries = vec![
            entry_at(at(Duration::days(30)), "Edge", 6, None, None),
            entry_at(at(Duration::days(60)), "Edge", 3, None, None),
            entry_at(at(Duration::days(60) + Duration::seconds(1)), "Edge", 10, None, None),
            entry_at(at(Duration::days(30) + Duration::seconds(1)), "Edge", 3, None, None),
        ];

        let report = compute_report(&entries, now());
        assert_eq!(report.window_entry_count, 1);
        assert_eq!(report.all_time_entry_count, 4);
        assert_eq!(report.average_severity, 6.0);
        // previous holds the two severity-3 entries; the 10 is too old to count
        assert_eq!(report.severity_trend.prior_average, 3.0);
        assert_eq!(report.severity_trend.direction, TrendDirection::Increasing);
        assert_eq!(report.severity_trend.percent_change, 100);
    }

    #[test]
    fn dashboard_uses_newest_entries() {
        let entries: Vec<SymptomEntry> = (0..35i64)
            .rev()
            .map(|days_ago| entry(days_ago, "Pain", if days_ago < 10 { 7 } else { 2 }))
            .collect();
        let mut tail = entries.clone();
        tail.last_mut().unwrap().severity = 8;

        let dashboard = compute_dashboard(&tail);
        assert_eq!(dashboard.total_entries, 35);
        assert_eq!(dashboard.recent_entries.len(), 10);
        assert_eq!(dashboard.recent_entries[0].severity, 8);
        // (9 * 7 + 8) / 10 = 7.1
        assert_eq!(dashboard.recent_average_severity, 7);
        assert_eq!(dashboard.severity_series.len(), 30);
        assert!(dashboard
            .severity_series
            .windows(2)
            .all(|pair| pair[0].occurred_at <= pair[1].occurred_at));
        assert_eq!(dashboard.severity_series[29].severity, 8);
        assert_eq!(dashboard.severity_series[0].occurred_at, entries[5].occurred_at);
    }

    #[test]
    fn dashboard_for_no_entries_is_zeroed() {
        let dashboard = compute_dashboard(&[]);
        assert_eq!(dashboard.total_entries, 0);
        assert_eq!(dashboard.recent_average_severity, 0);
        assert!(dashboard.recent_entries.is_empty());
        assert!(dashboard.severity_series.is_empty());
    }

    #[test]
    fn correlation_requires_three_samples() {
        let entries = vec![
            weather_entry(1, "Rash", 5, Some(31.0), Some(90.0)),
            weather_entry(2, "Rash", 5, Some(33.0), Some(95.0)),
            entry(3, "Rash", 5),
        ];

        let report = compute_report(&entries, now());
        assert!(report.weather_correlations.is_empty());
    }

    #[test]
    fn correlation_below_cutoff_is_dropped() {
        let entries = vec![
            weather_entry(1, "Cough", 5, Some(30.0), Some(40.0)),
            weather_entry(2, "Cough", 5, Some(10.0), Some(40.0)),
            weather_entry(3, "Cough", 5, Some(12.0), Some(80.0)),
        ];

        let report = compute_report(&entries, now());
        assert!(report.weather_correlations.is_empty());
    }

    #[test]
    fn correlations_sorted_and_capped() {
        let mut entries = Vec::new();
        for (index, label) in ["A", "B", "C", "D"].iter().enumerate() {
            let warm = if index % 2 == 0 { 3 } else { 2 };
            for day in 0..3 {
                let temperature = if day < warm { 30.0 } else { 10.0 };
                entries.push(weather_entry(day + 1, label, 5, Some(temperature), Some(85.0)));
            }
        }

        let report = compute_report(&entries, now());
        let percents: Vec<u32> = report
            .weather_correlations
            .iter()
            .map(|c| c.correlation_percent)
            .collect();
        assert_eq!(percents, vec![100, 100, 100, 100, 100]);
        let first: Vec<(&str, &str)> = report
            .weather_correlations
            .iter()
            .map(|c| (c.label.as_str(), c.condition_description.as_str()))
            .collect();
        assert_eq!(
            first,
            vec![
                ("A", "Temperature > 24°C"),
                ("C", "Temperature > 24°C"),
                ("A", "Humidity > 70%"),
                ("B", "Humidity > 70%"),
                ("C", "Humidity > 70%"),
            ]
        );
    }

    #[test]
    fn custom_policy_changes_sensitivity() {
        let entries = vec![
            weather_entry(1, "Rash", 5, Some(21.0), None),
            weather_entry(2, "Rash", 5, Some(22.0), None),
        ];
        let policy = CorrelationPolicy {
            temperature_threshold_c: 20.0,
            min_samples: 2,
            ..CorrelationPolicy::default()
        };

        let report = compute_report_with(&entries, now(), &policy);
        assert_eq!(report.weather_correlations.len(), 1);
        assert_eq!(
            report.weather_correlations[0].condition_description,
            "Temperature > 20°C"
        );
    }

    #[test]
    fn severity_by_symptom_orders_by_count_then_encounter() {
        let entries = vec![
            entry(6, "Nausea", 2),
            entry(5, "Headache", 7),
            entry(4, "Dizziness", 4),
            entry(3, "Headache", 8),
            entry(2, "Dizziness", 5),
            entry(1, "Headache", 6),
        ];

        let report = compute_report(&entries, now());
        let rows: Vec<(&str, usize, f64)> = report
            .severity_by_symptom
            .iter()
            .map(|row| (row.label.as_str(), row.count, row.average))
            .collect();
        assert_eq!(
            rows,
            vec![("Headache", 3, 7.0), ("Dizziness", 2, 4.5), ("Nausea", 1, 2.0)]
        );
    }

    #[test]
    fn top_symptom_tie_goes_to_first_encountered() {
        let entries = vec![
            entry(4, "Cramps", 3),
            entry(3, "Bloating", 3),
            entry(2, "Bloating", 3),
            entry(1, "Cramps", 3),
        ];

        let report = compute_report(&entries, now());
        assert_eq!(report.top_symptom.unwrap().label, "Cramps");
    }

    #[test]
    fn buckets_cover_every_recent_entry() {
        let entries: Vec<SymptomEntry> = (1..=10u8)
            .map(|severity| entry(i64::from(severity), "Pain", severity))
            .collect();

        let report = compute_report(&entries, now());
        let counts = &report.severity_buckets.counts;
        assert_eq!((counts.mild, counts.moderate, counts.severe), (3, 3, 4));
        assert_eq!(
            counts.mild + counts.moderate + counts.severe,
            report.window_entry_count
        );
        let pct = &report.severity_buckets.percentages;
        assert_eq!((pct.mild, pct.moderate, pct.severe), (30, 30, 40));
        let sum = pct.mild + pct.moderate + pct.severe;
        assert!((99..=101).contains(&sum));
    }

    #[test]
    fn time_patterns_use_entry_offset() {
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
        // Monday 23:30 locally, Tuesday 04:30 UTC
        let late = eastern.with_ymd_and_hms(2026, 3, 9, 23, 30, 0).unwrap();
        let entries = vec![
            entry_at(late, "Insomnia", 5, None, None),
            entry_at(late + Duration::days(-7), "Insomnia", 5, None, None),
            entry_at(late + Duration::hours(-10), "Insomnia", 5, None, None),
        ];

        let report = compute_report(&entries, now());
        let day = report.time_patterns.peak_day_of_week.unwrap();
        assert_eq!(day.day, "Monday");
        assert_eq!(day.count, 3);
        let hour = report.time_patterns.peak_hour_of_day.unwrap();
        assert_eq!(hour.hour, 23);
        assert_eq!(hour.count, 2);
    }

    #[test]
    fn hour_ties_resolve_to_earliest_hour() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let evening = utc.with_ymd_and_hms(2026, 3, 6, 18, 0, 0).unwrap();
        let morning = utc.with_ymd_and_hms(2026, 3, 7, 9, 0, 0).unwrap();
        let entries = vec![
            entry_at(evening, "Asthma", 4, None, None),
            entry_at(morning, "Asthma", 4, None, None),
        ];

        let report = compute_report(&entries, now());
        assert_eq!(report.time_patterns.peak_hour_of_day.unwrap().hour, 9);
        assert_eq!(report.time_patterns.peak_day_of_week.unwrap().day, "Friday");
    }

    #[test]
    fn report_serializes_with_camel_case_fields() {
        let report = compute_report(&[entry(1, "Migraine", 4)], now());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["windowEntryCount"], 1);
        assert_eq!(value["topSymptom"]["label"], "Migraine");
        assert_eq!(value["severityTrend"]["direction"], "stable");
        assert_eq!(value["severityBuckets"]["counts"]["moderate"], 1);
        assert!(value["timePatterns"]["peakHourOfDay"]["hour"].is_number());
    }
}
