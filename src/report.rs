use std::fmt::Write;

use crate::models::{AggregateReport, TrendDirection};

/// Renders a report as Markdown for sharing with a healthcare provider.
pub fn render_markdown(report: &AggregateReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Symptom Report");
    let _ = writeln!(
        output,
        "{}: {} entries ({} all time)",
        report.period, report.window_entry_count, report.all_time_entry_count
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    match &report.top_symptom {
        Some(top) => {
            let _ = writeln!(
                output,
                "- Most frequent: {} ({} entries)",
                top.label, top.count
            );
        }
        None => {
            let _ = writeln!(output, "- Most frequent: none recorded");
        }
    }
    let _ = writeln!(output, "- Average severity: {:.1}/10", report.average_severity);

    let trend = &report.severity_trend;
    let trend_text = match trend.direction {
        TrendDirection::Increasing => format!("increasing {}%", trend.percent_change),
        TrendDirection::Decreasing => format!("decreasing {}%", trend.percent_change),
        TrendDirection::Stable => "stable".to_string(),
    };
    let _ = writeln!(
        output,
        "- Severity trend: {} (previous average {:.1})",
        trend_text, trend.prior_average
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Severity by Symptom");
    if report.severity_by_symptom.is_empty() {
        let _ = writeln!(output, "No symptoms recorded for this window.");
    } else {
        for row in &report.severity_by_symptom {
            let _ = writeln!(
                output,
                "- {}: {} entries (avg severity {:.1})",
                row.label, row.count, row.average
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Severity Breakdown");
    let buckets = &report.severity_buckets;
    let _ = writeln!(
        output,
        "- Mild (1-3): {} ({}%)",
        buckets.counts.mild, buckets.percentages.mild
    );
    let _ = writeln!(
        output,
        "- Moderate (4-6): {} ({}%)",
        buckets.counts.moderate, buckets.percentages.moderate
    );
    let _ = writeln!(
        output,
        "- Severe (7-10): {} ({}%)",
        buckets.counts.severe, buckets.percentages.severe
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weather Patterns");
    if report.weather_correlations.is_empty() {
        let _ = writeln!(output, "No notable weather patterns.");
    } else {
        for correlation in &report.weather_correlations {
            let _ = writeln!(output, "- {}: {}", correlation.label, correlation.description);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Timing");
    let patterns = &report.time_patterns;
    if let Some(day) = &patterns.peak_day_of_week {
        let _ = writeln!(output, "- Most common day: {} ({} entries)", day.day, day.count);
    }
    if let Some(hour) = &patterns.peak_hour_of_day {
        let _ = writeln!(
            output,
            "- Most common hour: {:02}:00 ({} entries)",
            hour.hour, hour.count
        );
    }
    if patterns.peak_day_of_week.is_none() && patterns.peak_hour_of_day.is_none() {
        let _ = writeln!(output, "No entries in this window.");
    }

    output
}
