// src/migration/report.rs

//! Human-readable run report

use super::stats::MigrationStats;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Render run statistics as a multi-line report
pub fn format_report(stats: &MigrationStats) -> String {
    let mut out = String::new();

    let mode = if stats.validation_only {
        " (validation only)"
    } else if stats.dry_run {
        " (dry run)"
    } else {
        ""
    };
    let _ = writeln!(out, "Provider migration report{}", mode);
    let _ = writeln!(out, "  Phase:                     {}", stats.phase);
    let _ = writeln!(out, "  Configurations scanned:    {}", stats.total_configs);
    let _ = writeln!(
        out,
        "  Unique source providers:   {}{}",
        stats.unique_source_providers,
        by_type(&stats.source_by_type)
    );
    let _ = writeln!(
        out,
        "  Unique destination providers: {}{}",
        stats.unique_destination_providers,
        by_type(&stats.destination_by_type)
    );

    if !stats.dry_run && !stats.validation_only {
        let _ = writeln!(out, "  Providers created:         {}", stats.providers_created);
        let _ = writeln!(out, "  Configurations updated:    {}", stats.configs_updated);
        if stats.auto_filled > 0 {
            let _ = writeln!(out, "  Auto-filled providers:     {}", stats.auto_filled);
        }
    }
    if stats.rolled_back {
        let _ = writeln!(out, "  Rolled back:               yes");
    }
    if let Some(duration) = stats.duration() {
        let _ = writeln!(out, "  Duration:                  {}ms", duration.num_milliseconds());
    }

    if !stats.warnings.is_empty() {
        let _ = writeln!(out, "\nWarnings ({}):", stats.warnings.len());
        for warning in &stats.warnings {
            let _ = writeln!(out, "  - {}", warning);
        }
    }
    if !stats.errors.is_empty() {
        let _ = writeln!(out, "\nErrors ({}):", stats.errors.len());
        for error in &stats.errors {
            let _ = writeln!(out, "  - {}", error);
        }
    }

    out
}

fn by_type(counts: &BTreeMap<String, usize>) -> String {
    if counts.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = counts
        .iter()
        .map(|(tag, count)| format!("{} {}", tag, count))
        .collect();
    format!(" ({})", parts.join(", "))
}
