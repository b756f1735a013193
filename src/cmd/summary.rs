//! Summary command - period totals, VAT position and threshold status

use super::{read_records, PeriodArgs};
use btwc::{aggregate_records, format_amount, summarize, FinancialSummary, Locale};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// JSON file containing records, or "-" for stdin
    #[arg(short, long)]
    records: PathBuf,

    #[command(flatten)]
    period: PeriodArgs,

    /// Locale used to display amounts
    #[arg(short, long, default_value = "nl-NL")]
    locale: Locale,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let records = read_records(&self.records)?;
        let (start, end) = self.period.resolve(&records)?;
        let report = aggregate_records(&records, start, end)?;
        let summary = summarize(&report);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            self.print_summary(&summary, self.period.describe(start, end));
        }
        Ok(())
    }

    fn print_summary(&self, s: &FinancialSummary, period: String) {
        let eur = |amount| format_amount(amount, self.locale);

        println!();
        println!("FINANCIAL SUMMARY ({}, {} months)", period, s.months);
        println!();

        println!("REVENUE");
        println!("  Invoices: {}", s.invoice_count);
        println!(
            "  Net: {} | VAT: {} | Gross: {}",
            eur(s.revenue),
            eur(s.vat_collected),
            eur(s.revenue_gross)
        );
        println!();

        println!("COSTS");
        println!("  Expenses: {}", s.expense_count);
        println!(
            "  Net: {} | Deductible VAT: {} | Gross: {}",
            eur(s.expenses),
            eur(s.vat_deductible),
            eur(s.expenses_gross)
        );
        println!(
            "  Mileage: {} trips, {} km, reimbursement {} (VAT {})",
            s.trip_count,
            s.mileage_km.normalize(),
            eur(s.mileage_reimbursement),
            eur(s.mileage_vat)
        );
        println!();

        println!("VAT");
        if s.vat_to_return > Decimal::ZERO {
            println!("  To reclaim: {}", eur(s.vat_to_return));
        } else {
            println!("  To pay: {}", eur(s.vat_to_pay));
        }
        println!(
            "  Months with VAT due: {} | with refund: {}",
            s.months_with_vat_due, s.months_with_vat_refund
        );
        println!(
            "  Settled via {} filing(s): paid {} | refunded {}",
            s.filing_count,
            eur(s.vat_paid),
            eur(s.vat_refunded)
        );
        println!();

        println!("RESULT");
        println!("  Profit: {} ({:.2}% margin)", eur(s.profit), s.profit_margin);
        println!("  Gross profit: {}", eur(s.gross_profit));
        println!("  Net cash flow: {}", eur(s.net_cash_flow));
        println!();

        println!("THRESHOLDS");
        println!("  YTD revenue: {}", eur(s.year_to_date_revenue));
        if let Some(year_end) = s.projected_year_end_revenue {
            println!("  Projected year-end revenue: {}", eur(year_end));
        }
        println!(
            "  KOR: {:.2}% used, {}",
            s.kor_usage,
            if s.kor_eligible { "eligible" } else { "not eligible" }
        );
        println!("  Quarterly filing limit: {:.2}% used", s.quarterly_filing_usage);
        println!("  Declaration frequency: {}", s.declaration_frequency);

        if s.skipped_records > 0 {
            println!();
            println!(
                "\u{26A0} {} record(s) skipped; run `btwc validate` for details",
                s.skipped_records
            );
        }
        println!();
    }
}
