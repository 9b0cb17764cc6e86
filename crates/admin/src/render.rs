use anyhow::Result;
use gamecat_core::{schema::RECORD_SCHEMA, AutoFixReport, Notice, Record, StoreStats};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

const PREVIEW_LEN: usize = 100;

/// Print every pending notice: info to stdout, errors to stderr.
pub fn drain_notices(receiver: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = receiver.try_recv() {
        match notice {
            Notice::Info(message) => println!("{message}"),
            Notice::Error(message) => eprintln!("error: {message}"),
            Notice::RecordsChanged { total } => debug!(total, "record list changed"),
        }
    }
}

pub fn record_table(records: &[&Record], stats: StoreStats) {
    for record in records {
        let status = if record.is_correct { "ok   " } else { "WRONG" };
        let hidden = if record.hidden { " (hidden)" } else { "" };
        println!(
            "{status}  {}{hidden}  |  {}  |  {}",
            record.display_name(),
            record.original_torrent_name,
            preview(&record.description)
        );
    }
    println!(
        "Displaying {} records (Total: {}, hidden: {}, incorrect: {})",
        records.len(),
        stats.total,
        stats.hidden,
        stats.incorrect
    );
}

pub fn record_details(record: &Record) -> Result<()> {
    let value = serde_json::to_value(record)?;
    for spec in RECORD_SCHEMA {
        let rendered = spec.kind.render(&value[spec.name]);
        if rendered.contains('\n') {
            println!("{}:", spec.label);
            for line in rendered.lines() {
                println!("    {line}");
            }
        } else {
            println!("{}: {rendered}", spec.label);
        }
    }
    println!(
        "Status: {}",
        if record.is_correct {
            "correct"
        } else {
            "needs fixing"
        }
    );
    Ok(())
}

pub fn schema_table() {
    for spec in RECORD_SCHEMA {
        let required = if spec.required { " (required)" } else { "" };
        println!("{:<26} {:?}{required}", spec.name, spec.kind);
    }
}

pub fn auto_fix_report(report: &AutoFixReport) {
    println!(
        "{} incorrect, {} looked up, {} updated, {} skipped, {} failed",
        report.candidates, report.attempted, report.updated, report.skipped, report.failed
    );
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_LEN {
        let head: String = line.chars().take(PREVIEW_LEN - 3).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}
