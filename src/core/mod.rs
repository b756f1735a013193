pub mod aggregate;
pub mod forecast;
pub mod money;
pub mod period;
pub mod records;
pub mod summary;
pub mod thresholds;
pub mod vat;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use aggregate::{
    aggregate, aggregate_records, AggregateError, AggregationReport, MonthlyAggregate,
    MILEAGE_VAT_RATE,
};
pub use forecast::{forecast, projected_year_end_revenue, TREND_WINDOW};
pub use money::{format_amount, format_eur, round2, Locale};
pub use period::{months_in_range, parse_record_date, Month, Quarter};
pub use records::{
    read_records_json, Expense, FilingStatus, Invoice, InvoiceStatus, Lenient, MileageEntry,
    RecordsInput, VatFiling, VehicleType,
};
pub use summary::{summarize, FinancialSummary};
pub use thresholds::{
    compute_thresholds, first_exemption_crossing, threshold_timeline, threshold_usage,
    DeclarationFrequency, ThresholdPoint, Thresholds, KOR_THRESHOLD, MONTHLY_FILING_THRESHOLD,
};
pub use vat::{
    gross_from_net, net_from_gross, validate, vat_portion, TaxBreakdown, VatError, VatRate,
    VAT_TOLERANCE,
};
pub use warnings::{RecordKind, RecordWarning, SkipReason};
