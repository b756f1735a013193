use super::aggregate::{AggregationReport, MonthlyAggregate};
use super::forecast::projected_year_end_revenue;
use super::money::round2;
use super::thresholds::{
    threshold_usage, DeclarationFrequency, Thresholds, KOR_THRESHOLD, MONTHLY_FILING_THRESHOLD,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Period totals over the historical months of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub months: usize,

    pub revenue: Decimal,
    pub revenue_gross: Decimal,
    pub vat_collected: Decimal,
    pub invoice_count: usize,

    pub expenses: Decimal,
    pub expenses_gross: Decimal,
    pub vat_deductible: Decimal,
    pub expense_count: usize,

    pub mileage_km: Decimal,
    pub mileage_reimbursement: Decimal,
    pub mileage_vat: Decimal,
    pub trip_count: usize,

    pub net_vat: Decimal,
    /// Positive part of net VAT: owed to the tax office
    pub vat_to_pay: Decimal,
    /// Negative part of net VAT: to be refunded
    pub vat_to_return: Decimal,
    pub months_with_vat_due: usize,
    pub months_with_vat_refund: usize,
    pub vat_paid: Decimal,
    pub vat_refunded: Decimal,
    /// BTW declarations paid or refunded in the period
    pub filing_count: usize,

    pub profit: Decimal,
    /// Gross revenue minus gross expenses
    pub gross_profit: Decimal,
    /// Profit as a percentage of revenue
    pub profit_margin: Decimal,
    pub net_cash_flow: Decimal,

    pub year_to_date_revenue: Decimal,
    /// Year-to-date revenue extended to December at the recent monthly average
    pub projected_year_end_revenue: Option<Decimal>,
    pub kor_usage: Decimal,
    pub quarterly_filing_usage: Decimal,
    pub kor_eligible: bool,
    pub declaration_frequency: DeclarationFrequency,
    pub thresholds: Thresholds,

    pub skipped_records: usize,
}

pub fn summarize(report: &AggregationReport) -> FinancialSummary {
    let history: Vec<&MonthlyAggregate> = report.months.iter().filter(|m| !m.projected).collect();
    let total = |field: fn(&MonthlyAggregate) -> Decimal| -> Decimal {
        round2(history.iter().map(|m| field(*m)).sum())
    };
    let count = |field: fn(&MonthlyAggregate) -> usize| -> usize {
        history.iter().map(|m| field(*m)).sum()
    };

    let revenue = total(|m| m.revenue);
    let revenue_gross = total(|m| m.revenue_gross);
    let expenses_gross = total(|m| m.expenses_gross);
    let net_vat = total(|m| m.net_vat);
    let profit = total(|m| m.profit);
    let profit_margin = if revenue.is_zero() {
        Decimal::ZERO
    } else {
        round2(profit / revenue * dec!(100))
    };

    let year_to_date_revenue = report.year_to_date_revenue();
    let thresholds = report.thresholds();

    FinancialSummary {
        period_start: report.period_start,
        period_end: report.period_end,
        months: history.len(),
        revenue,
        revenue_gross,
        vat_collected: total(|m| m.vat_collected),
        invoice_count: count(|m| m.invoice_count),
        expenses: total(|m| m.expenses),
        expenses_gross,
        vat_deductible: total(|m| m.vat_deductible),
        expense_count: count(|m| m.expense_count),
        mileage_km: total(|m| m.mileage_km),
        mileage_reimbursement: total(|m| m.mileage_reimbursement),
        mileage_vat: total(|m| m.mileage_vat),
        trip_count: count(|m| m.trip_count),
        net_vat,
        vat_to_pay: net_vat.max(Decimal::ZERO),
        vat_to_return: (-net_vat).max(Decimal::ZERO),
        months_with_vat_due: count(|m| usize::from(m.net_vat > Decimal::ZERO)),
        months_with_vat_refund: count(|m| usize::from(m.net_vat < Decimal::ZERO)),
        vat_paid: total(|m| m.vat_paid),
        vat_refunded: total(|m| m.vat_refunded),
        filing_count: count(|m| m.filing_count),
        profit,
        gross_profit: round2(revenue_gross - expenses_gross),
        profit_margin,
        net_cash_flow: total(|m| m.net_cash_flow),
        year_to_date_revenue,
        projected_year_end_revenue: projected_year_end_revenue(&report.months),
        kor_usage: threshold_usage(year_to_date_revenue, KOR_THRESHOLD),
        quarterly_filing_usage: threshold_usage(year_to_date_revenue, MONTHLY_FILING_THRESHOLD),
        kor_eligible: thresholds.kor_eligible(),
        declaration_frequency: thresholds.declaration_frequency(),
        thresholds,
        skipped_records: report.skipped(),
    }
}
