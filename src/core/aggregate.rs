//! Monthly aggregation of invoices, expenses, mileage and VAT filings.
//!
//! The month list is derived from the requested range, never from the data,
//! so every month in range appears exactly once even without activity.
//! Records are then folded into their month. Nothing here is cached: each
//! call works from the snapshot it is given.

use super::money::round2;
use super::period::{months_in_range, parse_record_date, Month};
use super::records::{
    Expense, FilingStatus, Invoice, InvoiceStatus, MileageEntry, RecordsInput, VatFiling,
};
use super::thresholds::{compute_thresholds, Thresholds};
use super::vat::{self, VatRate};
use super::warnings::{RecordKind, RecordWarning, SkipReason};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mileage reimbursements carry VAT at the standard rate
pub const MILEAGE_VAT_RATE: VatRate = VatRate::Standard;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("period start {start} is after period end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
}

/// Totals for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month: u32,
    /// `YYYY-MM`
    pub label: String,

    /// Invoiced revenue excluding VAT
    pub revenue: Decimal,
    pub revenue_gross: Decimal,
    pub vat_collected: Decimal,
    pub invoice_count: usize,

    /// Expenses excluding VAT
    pub expenses: Decimal,
    pub expenses_gross: Decimal,
    pub vat_deductible: Decimal,
    pub expense_count: usize,

    pub mileage_km: Decimal,
    pub mileage_reimbursement: Decimal,
    pub mileage_vat: Decimal,
    pub trip_count: usize,

    /// Paid to the tax office through filings dated this month
    pub vat_paid: Decimal,
    /// Refunded by the tax office through filings dated this month
    pub vat_refunded: Decimal,
    pub filing_count: usize,

    /// VAT collected minus deductible VAT (expenses and mileage)
    pub net_vat: Decimal,
    /// Revenue minus expenses minus mileage reimbursement
    pub profit: Decimal,
    /// Money in minus money out, VAT settlements included
    pub net_cash_flow: Decimal,
    /// Revenue since January of this year, within the aggregated range
    pub cumulative_revenue: Decimal,

    /// Forecast entry, not historical data
    pub projected: bool,
}

impl MonthlyAggregate {
    pub fn empty(month: Month) -> Self {
        MonthlyAggregate {
            year: month.year(),
            month: month.month(),
            label: month.label(),
            revenue: Decimal::ZERO,
            revenue_gross: Decimal::ZERO,
            vat_collected: Decimal::ZERO,
            invoice_count: 0,
            expenses: Decimal::ZERO,
            expenses_gross: Decimal::ZERO,
            vat_deductible: Decimal::ZERO,
            expense_count: 0,
            mileage_km: Decimal::ZERO,
            mileage_reimbursement: Decimal::ZERO,
            mileage_vat: Decimal::ZERO,
            trip_count: 0,
            vat_paid: Decimal::ZERO,
            vat_refunded: Decimal::ZERO,
            filing_count: 0,
            net_vat: Decimal::ZERO,
            profit: Decimal::ZERO,
            net_cash_flow: Decimal::ZERO,
            cumulative_revenue: Decimal::ZERO,
            projected: false,
        }
    }

    pub fn calendar_month(&self) -> Option<Month> {
        Month::new(self.year, self.month)
    }

    pub fn has_activity(&self) -> bool {
        self.invoice_count + self.expense_count + self.trip_count + self.filing_count > 0
    }

    /// Fill the derived figures once all records are in
    fn settle(&mut self) {
        self.mileage_vat = vat::vat_portion(self.mileage_reimbursement, MILEAGE_VAT_RATE);
        self.net_vat = round2(self.vat_collected - self.vat_deductible - self.mileage_vat);
        self.profit = round2(self.revenue - self.expenses - self.mileage_reimbursement);
        self.net_cash_flow = round2(
            self.revenue_gross - self.expenses_gross - self.mileage_reimbursement
                - self.vat_paid
                + self.vat_refunded,
        );
    }
}

/// Result of an aggregation: the timeline plus every record that was left out
#[derive(Debug, Clone, Serialize)]
pub struct AggregationReport {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub months: Vec<MonthlyAggregate>,
    pub warnings: Vec<RecordWarning>,
}

impl AggregationReport {
    pub fn skipped(&self) -> usize {
        self.warnings.len()
    }

    /// Cumulative revenue of the last historical month
    pub fn year_to_date_revenue(&self) -> Decimal {
        self.months
            .iter()
            .rev()
            .find(|m| !m.projected)
            .map_or(Decimal::ZERO, |m| m.cumulative_revenue)
    }

    pub fn thresholds(&self) -> Thresholds {
        compute_thresholds(self.year_to_date_revenue())
    }
}

/// Aggregate one records snapshot over `[start, end]`
pub fn aggregate_records(
    records: &RecordsInput,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<AggregationReport, AggregateError> {
    aggregate(
        &records.invoices,
        &records.expenses,
        &records.mileage,
        &records.vat_filings,
        period_start,
        period_end,
    )
}

/// Build the monthly timeline for `[period_start, period_end]`, both inclusive.
///
/// Records dated outside the range are excluded. Records whose date or
/// amount cannot be interpreted are excluded and reported in
/// [`AggregationReport::warnings`].
pub fn aggregate(
    invoices: &[Invoice],
    expenses: &[Expense],
    mileage: &[MileageEntry],
    vat_filings: &[VatFiling],
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<AggregationReport, AggregateError> {
    if period_start > period_end {
        return Err(AggregateError::InvalidPeriod {
            start: period_start,
            end: period_end,
        });
    }

    let mut fold = Fold::new(period_start, period_end);

    for (index, invoice) in invoices.iter().enumerate() {
        fold.add_invoice(index, invoice);
    }
    for (index, expense) in expenses.iter().enumerate() {
        fold.add_expense(index, expense);
    }
    for (index, entry) in mileage.iter().enumerate() {
        fold.add_trip(index, entry);
    }
    for (index, filing) in vat_filings.iter().enumerate() {
        fold.add_filing(index, filing);
    }

    Ok(fold.finish())
}

struct Fold {
    start: NaiveDate,
    end: NaiveDate,
    buckets: BTreeMap<Month, MonthlyAggregate>,
    warnings: Vec<RecordWarning>,
    out_of_range: usize,
}

impl Fold {
    fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let buckets = months_in_range(start, end)
            .into_iter()
            .map(|month| (month, MonthlyAggregate::empty(month)))
            .collect();
        Fold {
            start,
            end,
            buckets,
            warnings: Vec::new(),
            out_of_range: 0,
        }
    }

    fn skip(&mut self, kind: RecordKind, index: usize, id: Option<String>, reason: SkipReason) {
        let warning = RecordWarning {
            kind,
            index,
            id,
            reason,
        };
        log::warn!("Skipping {}", warning);
        self.warnings.push(warning);
    }

    /// Month bucket for a record date, `None` when the record is skipped or out of range
    fn locate(
        &mut self,
        kind: RecordKind,
        index: usize,
        id: &Option<String>,
        raw_date: &str,
    ) -> Option<Month> {
        let Some(date) = parse_record_date(raw_date) else {
            self.skip(
                kind,
                index,
                id.clone(),
                SkipReason::UnparseableDate {
                    value: raw_date.to_string(),
                },
            );
            return None;
        };
        if date < self.start || date > self.end {
            self.out_of_range += 1;
            return None;
        }
        Some(Month::of(date))
    }

    fn add_invoice(&mut self, index: usize, invoice: &Invoice) {
        let id = invoice.label();
        let Some(month) = self.locate(RecordKind::Invoice, index, &id, &invoice.issue_date) else {
            return;
        };
        if invoice.status == InvoiceStatus::Cancelled {
            log::debug!("Ignoring cancelled invoice #{index}");
            return;
        }
        let amounts = match invoice.amounts() {
            Ok(amounts) => amounts,
            Err(reason) => return self.skip(RecordKind::Invoice, index, id, reason),
        };
        if let Some(bucket) = self.buckets.get_mut(&month) {
            bucket.revenue += amounts.net;
            bucket.vat_collected += amounts.vat;
            bucket.revenue_gross += amounts.gross;
            bucket.invoice_count += 1;
        }
    }

    fn add_expense(&mut self, index: usize, expense: &Expense) {
        let id = expense.id.clone();
        let Some(month) = self.locate(RecordKind::Expense, index, &id, &expense.date) else {
            return;
        };
        let amounts = match expense.amounts() {
            Ok(amounts) => amounts,
            Err(reason) => return self.skip(RecordKind::Expense, index, id, reason),
        };
        if let Some(bucket) = self.buckets.get_mut(&month) {
            bucket.expenses += amounts.net;
            bucket.expenses_gross += amounts.gross;
            if expense.is_vat_deductible {
                bucket.vat_deductible += amounts.vat;
            }
            bucket.expense_count += 1;
        }
    }

    fn add_trip(&mut self, index: usize, entry: &MileageEntry) {
        let id = entry.id.clone();
        let Some(month) = self.locate(RecordKind::Mileage, index, &id, &entry.date) else {
            return;
        };
        let (km, reimbursement) = match entry
            .distance()
            .and_then(|km| entry.reimbursement().map(|amount| (km, amount)))
        {
            Ok(values) => values,
            Err(reason) => return self.skip(RecordKind::Mileage, index, id, reason),
        };
        if let Some(bucket) = self.buckets.get_mut(&month) {
            bucket.mileage_km += km;
            bucket.mileage_reimbursement += reimbursement;
            bucket.trip_count += 1;
        }
    }

    fn add_filing(&mut self, index: usize, filing: &VatFiling) {
        let id = filing.id.clone();
        let Some(month) = self.locate(RecordKind::VatFiling, index, &id, &filing.date) else {
            return;
        };
        if filing.status == FilingStatus::Draft {
            log::debug!("Ignoring draft VAT filing #{index}");
            return;
        }
        let balance = match filing.balance() {
            Ok(balance) => balance,
            Err(reason) => return self.skip(RecordKind::VatFiling, index, id, reason),
        };
        if let Some(bucket) = self.buckets.get_mut(&month) {
            if balance > Decimal::ZERO {
                bucket.vat_paid += balance;
            } else {
                bucket.vat_refunded += balance.abs();
            }
            bucket.filing_count += 1;
        }
    }

    fn finish(self) -> AggregationReport {
        if self.out_of_range > 0 {
            log::debug!(
                "{} records fall outside {}..={}",
                self.out_of_range,
                self.start,
                self.end
            );
        }

        let mut months: Vec<MonthlyAggregate> = self.buckets.into_values().collect();

        let mut year = None;
        let mut cumulative = Decimal::ZERO;
        for month in months.iter_mut() {
            if year != Some(month.year) {
                year = Some(month.year);
                cumulative = Decimal::ZERO;
            }
            month.settle();
            cumulative += month.revenue;
            month.cumulative_revenue = round2(cumulative);
        }

        log::debug!(
            "Aggregated {} months, {} records skipped",
            months.len(),
            self.warnings.len()
        );

        AggregationReport {
            period_start: self.start,
            period_end: self.end,
            months,
            warnings: self.warnings,
        }
    }
}
