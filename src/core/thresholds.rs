use super::aggregate::MonthlyAggregate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Small business scheme (KOR) revenue ceiling
pub const KOR_THRESHOLD: Decimal = dec!(20_000);

/// Above this revenue declarations are due monthly instead of quarterly
pub const MONTHLY_FILING_THRESHOLD: Decimal = dec!(1_500_000);

/// Threshold flags for one cumulative annual revenue figure.
///
/// Both comparisons are strict: revenue exactly at a ceiling does not exceed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    pub exceeds_exemption: bool,
    pub exceeds_quarterly_filing_limit: bool,
}

impl Thresholds {
    pub fn kor_eligible(&self) -> bool {
        !self.exceeds_exemption
    }

    pub fn declaration_frequency(&self) -> DeclarationFrequency {
        if self.exceeds_quarterly_filing_limit {
            DeclarationFrequency::Monthly
        } else if self.exceeds_exemption {
            DeclarationFrequency::Quarterly
        } else {
            DeclarationFrequency::Yearly
        }
    }
}

pub fn compute_thresholds(cumulative_annual_revenue: Decimal) -> Thresholds {
    Thresholds {
        exceeds_exemption: cumulative_annual_revenue > KOR_THRESHOLD,
        exceeds_quarterly_filing_limit: cumulative_annual_revenue > MONTHLY_FILING_THRESHOLD,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationFrequency {
    Yearly,
    Quarterly,
    Monthly,
}

impl std::fmt::Display for DeclarationFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeclarationFrequency::Yearly => "yearly",
            DeclarationFrequency::Quarterly => "quarterly",
            DeclarationFrequency::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

/// Share of a ceiling used, in percent with two decimals
pub fn threshold_usage(revenue: Decimal, threshold: Decimal) -> Decimal {
    if threshold.is_zero() {
        return Decimal::ZERO;
    }
    super::money::round2(revenue / threshold * dec!(100))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdPoint {
    pub label: String,
    pub cumulative_revenue: Decimal,
    #[serde(flatten)]
    pub thresholds: Thresholds,
}

/// Threshold flags evaluated month by month on the running revenue
pub fn threshold_timeline(months: &[MonthlyAggregate]) -> Vec<ThresholdPoint> {
    months
        .iter()
        .map(|m| ThresholdPoint {
            label: m.label.clone(),
            cumulative_revenue: m.cumulative_revenue,
            thresholds: compute_thresholds(m.cumulative_revenue),
        })
        .collect()
}

/// Label of the first month in which the KOR ceiling is exceeded
pub fn first_exemption_crossing(months: &[MonthlyAggregate]) -> Option<String> {
    threshold_timeline(months)
        .into_iter()
        .find(|point| point.thresholds.exceeds_exemption)
        .map(|point| point.label)
}
