//! Report command - monthly timeline with optional forecast

use super::{read_records, PeriodArgs};
use btwc::{
    aggregate_records, first_exemption_crossing, forecast, format_amount, AggregationReport,
    Locale, MonthlyAggregate, RecordWarning, Thresholds,
};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// JSON file containing records, or "-" for stdin
    #[arg(short, long)]
    records: PathBuf,

    #[command(flatten)]
    period: PeriodArgs,

    /// Number of months to project after the period
    #[arg(long, default_value_t = 0)]
    forecast: usize,

    /// Locale used to display amounts
    #[arg(short, long, default_value = "nl-NL")]
    locale: Locale,

    /// Output the monthly timeline as CSV
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output the full report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ReportOutput<'a> {
    period_start: NaiveDate,
    period_end: NaiveDate,
    months: &'a [MonthlyAggregate],
    thresholds: Thresholds,
    exemption_exceeded_in: Option<String>,
    warnings: &'a [RecordWarning],
}

/// Row for the monthly table output
#[derive(Debug, Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Revenue")]
    revenue: String,
    #[tabled(rename = "VAT Collected")]
    vat_collected: String,
    #[tabled(rename = "Expenses")]
    expenses: String,
    #[tabled(rename = "VAT Deductible")]
    vat_deductible: String,
    #[tabled(rename = "Mileage")]
    mileage: String,
    #[tabled(rename = "Net VAT")]
    net_vat: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "YTD Revenue")]
    cumulative_revenue: String,
}

impl MonthRow {
    fn new(month: &MonthlyAggregate, locale: Locale) -> Self {
        let amount = |value| format_amount(value, locale);
        let label = if month.projected {
            format!("{}*", month.label)
        } else {
            month.label.clone()
        };
        MonthRow {
            month: label,
            revenue: amount(month.revenue),
            vat_collected: amount(month.vat_collected),
            expenses: amount(month.expenses),
            vat_deductible: amount(month.vat_deductible),
            mileage: amount(month.mileage_reimbursement),
            net_vat: amount(month.net_vat),
            profit: amount(month.profit),
            cumulative_revenue: amount(month.cumulative_revenue),
        }
    }
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let records = read_records(&self.records)?;
        let (start, end) = self.period.resolve(&records)?;
        let mut report = aggregate_records(&records, start, end)?;
        if self.forecast > 0 {
            report.months = forecast(&report.months, self.forecast);
        }

        if self.csv {
            self.write_csv(&report.months)
        } else if self.json {
            self.print_json(&report)
        } else {
            self.print_table(&report, self.period.describe(start, end));
            Ok(())
        }
    }

    fn print_table(&self, report: &AggregationReport, period: String) {
        println!();
        println!("MONTHLY REPORT ({})", period);
        println!();

        let rows: Vec<_> = report
            .months
            .iter()
            .map(|m| MonthRow::new(m, self.locale))
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        if self.forecast > 0 {
            println!("* projected");
        }

        let thresholds = report.thresholds();
        println!();
        println!(
            "YTD revenue {}: KOR threshold {}, quarterly filing limit {}",
            format_amount(report.year_to_date_revenue(), self.locale),
            if thresholds.exceeds_exemption { "exceeded" } else { "not exceeded" },
            if thresholds.exceeds_quarterly_filing_limit { "exceeded" } else { "not exceeded" },
        );
        if let Some(label) = first_exemption_crossing(&report.months) {
            println!("KOR threshold first exceeded in {}", label);
        }

        if !report.warnings.is_empty() {
            eprintln!(
                "\u{26A0} {} record(s) skipped; run `btwc validate` for details",
                report.skipped()
            );
        }
    }

    fn print_json(&self, report: &AggregationReport) -> anyhow::Result<()> {
        let output = ReportOutput {
            period_start: report.period_start,
            period_end: report.period_end,
            months: &report.months,
            thresholds: report.thresholds(),
            exemption_exceeded_in: first_exemption_crossing(&report.months),
            warnings: &report.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn write_csv(&self, months: &[MonthlyAggregate]) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for month in months {
            wtr.serialize(month)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
