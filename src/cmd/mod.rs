pub mod report;
pub mod schema;
pub mod summary;
pub mod thresholds;
pub mod validate;
pub mod vat;

use btwc::{read_records_json, Quarter, RecordsInput};
use chrono::NaiveDate;
use clap::Args;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read a records snapshot (JSON) from a file, or stdin with "-"
pub fn read_records(path: &Path) -> anyhow::Result<RecordsInput> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        read_from_file(path)
    }
}

fn read_from_file(path: &Path) -> anyhow::Result<RecordsInput> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
    read_records_json(BufReader::new(file))
}

fn read_from_stdin() -> anyhow::Result<RecordsInput> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    read_records_json(io::Cursor::new(buffer))
}

/// Reporting period selection shared by the record based commands
#[derive(Args, Debug, Clone)]
pub struct PeriodArgs {
    /// First day of the period (YYYY-MM-DD)
    #[arg(long, conflicts_with = "year")]
    from: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD)
    #[arg(long, conflicts_with = "year")]
    to: Option<NaiveDate>,

    /// Calendar year to report
    #[arg(short, long)]
    year: Option<i32>,

    /// Restrict --year to one quarter (Q1-Q4)
    #[arg(short, long, requires = "year")]
    quarter: Option<Quarter>,
}

impl PeriodArgs {
    /// Resolve to an inclusive date range. Bounds that are not given fall
    /// back to the earliest and latest record dates.
    pub fn resolve(&self, records: &RecordsInput) -> anyhow::Result<(NaiveDate, NaiveDate)> {
        if let Some(year) = self.year {
            return Ok(match self.quarter {
                Some(quarter) => (quarter.start_date(year), quarter.end_date(year)),
                None => (year_start(year)?, year_end(year)?),
            });
        }

        let span = records.date_span();
        let from = self.from.or(span.map(|(first, _)| first));
        let to = self.to.or(span.map(|(_, last)| last));
        match (from, to) {
            (Some(from), Some(to)) => {
                log::debug!("Reporting period {} to {}", from, to);
                Ok((from, to))
            }
            _ => anyhow::bail!(
                "No reporting period: pass --year or --from/--to, or provide dated records"
            ),
        }
    }

    /// Human readable description of the requested period
    pub fn describe(&self, start: NaiveDate, end: NaiveDate) -> String {
        match (self.year, self.quarter) {
            (Some(year), Some(quarter)) => format!("{:?} {}", quarter, year),
            (Some(year), None) => year.to_string(),
            _ => format!("{} to {}", start, end),
        }
    }
}

fn year_start(year: i32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| anyhow::anyhow!("Invalid year {}", year))
}

fn year_end(year: i32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| anyhow::anyhow!("Invalid year {}", year))
}
