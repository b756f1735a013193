//! Validate command - surface records that aggregation would skip

use super::{read_records, PeriodArgs};
use btwc::{aggregate_records, RecordWarning};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// JSON file containing records, or "-" for stdin
    #[arg(short, long)]
    records: PathBuf,

    #[command(flatten)]
    period: PeriodArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ValidationOutput<'a> {
    period_start: NaiveDate,
    period_end: NaiveDate,
    issue_count: usize,
    issues: &'a [RecordWarning],
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let records = read_records(&self.records)?;
        let (start, end) = self.period.resolve(&records)?;
        let report = aggregate_records(&records, start, end)?;

        if self.json {
            let output = ValidationOutput {
                period_start: start,
                period_end: end,
                issue_count: report.warnings.len(),
                issues: &report.warnings,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            self.print_text(&report.warnings, self.period.describe(start, end));
        }

        // Exit with code 1 if issues found
        if !report.warnings.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn print_text(&self, issues: &[RecordWarning], period: String) {
        println!();
        println!("VALIDATION RESULTS ({})", period);
        println!();

        if issues.is_empty() {
            println!("\u{2713} No issues found.");
            return;
        }

        println!("\u{26A0} {} record(s) skipped:", issues.len());
        println!();
        for (i, issue) in issues.iter().enumerate() {
            println!("  {}. {}", i + 1, issue);
        }
        println!();
    }
}
