// sentinel/src/commands/render.rs
//
// Terminal rendering of quality reports.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};

use sentinel_core::application::QualityReport;
use sentinel_core::domain::quality::Severity;

/// Anomaly rows printed per entity before truncating.
const MAX_ANOMALY_ROWS: usize = 20;

pub fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

fn severity_cell(severity: Severity) -> Cell {
    let color = match severity {
        Severity::Low => Color::Grey,
        Severity::Medium => Color::Yellow,
        Severity::High => Color::Red,
        Severity::Critical => Color::Magenta,
    };
    Cell::new(severity.as_str()).fg(color)
}

pub fn print_reports(reports: &[QualityReport]) {
    let mut summary = new_table();
    summary.set_header(vec![
        "Entity", "Table", "Rows", "Rules", "Failed", "LOW", "MEDIUM", "HIGH", "CRITICAL", "Status",
    ]);
    for report in reports {
        let counts = report.severity_counts();
        let status = if report.is_success() {
            Cell::new("OK").fg(Color::Green)
        } else {
            Cell::new("STAGE FAILURE").fg(Color::Red)
        };
        let mut row = vec![
            Cell::new(&report.entity),
            Cell::new(&report.table_name),
            Cell::new(report.row_count),
            Cell::new(report.rules_evaluated),
            Cell::new(report.failed_metrics().count()),
        ];
        row.extend(Severity::ALL.iter().map(|s| Cell::new(counts.get(s).copied().unwrap_or(0))));
        row.push(status);
        summary.add_row(row);
    }
    println!("{summary}");

    for report in reports {
        if !report.metrics.is_empty() {
            let mut metrics = new_table();
            metrics.set_header(vec!["Rule", "Column", "Metric", "Value", "Threshold", "Status"]);
            for m in &report.metrics {
                let status = if m.is_failed() {
                    Cell::new(m.status.as_str()).fg(Color::Red)
                } else {
                    Cell::new(m.status.as_str()).fg(Color::Green)
                };
                metrics.add_row(vec![
                    Cell::new(m.rule_id),
                    Cell::new(&m.column_name),
                    Cell::new(m.metric_type.as_str()),
                    Cell::new(format!("{:.4}", m.metric_value)),
                    Cell::new(format!("{:.4}", m.threshold_value)),
                    status,
                ]);
            }
            println!("\n📏 Metrics for '{}'\n{metrics}", report.entity);
        }

        if !report.anomalies.is_empty() {
            let mut anomalies = new_table();
            anomalies.set_header(vec!["Type", "Severity", "Column", "Record", "Description"]);
            for a in report.anomalies.iter().take(MAX_ANOMALY_ROWS) {
                anomalies.add_row(vec![
                    Cell::new(a.anomaly_type.as_str()),
                    severity_cell(a.severity),
                    Cell::new(a.column_name.as_deref().unwrap_or("-")),
                    Cell::new(a.record_id.as_deref().unwrap_or("-")),
                    Cell::new(&a.description),
                ]);
            }
            println!("\n🚨 Anomalies for '{}'\n{anomalies}", report.entity);
            if report.anomalies.len() > MAX_ANOMALY_ROWS {
                println!("   ... and {} more", report.anomalies.len() - MAX_ANOMALY_ROWS);
            }
        }
    }
}

/// Warnings and stage failures, on stderr.
pub fn print_diagnostics(reports: &[QualityReport]) {
    for report in reports {
        for warning in &report.warnings {
            eprintln!("   ⚠️  [{}] {}", report.entity, warning);
        }
        for failure in &report.failures {
            eprintln!("   ❌ [{}] stage '{}' failed: {}", report.entity, failure.stage, failure.message);
        }
    }
}
