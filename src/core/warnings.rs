use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which record collection a skipped record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Invoice,
    Expense,
    Mileage,
    VatFiling,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Invoice => "invoice",
            RecordKind::Expense => "expense",
            RecordKind::Mileage => "mileage entry",
            RecordKind::VatFiling => "VAT filing",
        };
        f.write_str(name)
    }
}

/// Why a record could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum SkipReason {
    #[error("unparseable date '{value}'")]
    UnparseableDate { value: String },
    #[error("no usable amount")]
    MissingAmount,
    /// A VAT split was needed but the amount was negative.
    #[error("negative amount {amount} cannot be split into net and VAT")]
    NegativeAmount {
        #[schemars(with = "f64")]
        amount: Decimal,
    },
    #[error("negative distance {distance_km} km")]
    NegativeDistance {
        #[schemars(with = "f64")]
        distance_km: Decimal,
    },
    #[error("unparseable {field} '{value}'")]
    UnparseableAmount { field: String, value: String },
    #[error("unsupported VAT rate '{value}' (expected 21, 9 or 0)")]
    InvalidRate { value: String },
    /// Net plus VAT differs from gross by two cents or more.
    #[error("net {net} + VAT {vat} does not match gross {gross}")]
    InconsistentAmounts {
        #[schemars(with = "f64")]
        net: Decimal,
        #[schemars(with = "f64")]
        vat: Decimal,
        #[schemars(with = "f64")]
        gross: Decimal,
    },
}

/// A record left out of the totals. Collected rather than raised so that
/// one bad row does not blank a whole report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecordWarning {
    pub kind: RecordKind,
    /// Position of the record in its input collection
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reason: SkipReason,
}

impl std::fmt::Display for RecordWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} #{} ({}): {}", self.kind, self.index, id, self.reason),
            None => write!(f, "{} #{}: {}", self.kind, self.index, self.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn warning_display_with_id() {
        let warning = RecordWarning {
            kind: RecordKind::Invoice,
            index: 3,
            id: Some("INV-2025-004".to_string()),
            reason: SkipReason::UnparseableDate {
                value: "31/02/2025".to_string(),
            },
        };
        assert_eq!(
            warning.to_string(),
            "invoice #3 (INV-2025-004): unparseable date '31/02/2025'"
        );
    }

    #[test]
    fn warning_display_without_id() {
        let warning = RecordWarning {
            kind: RecordKind::Mileage,
            index: 0,
            id: None,
            reason: SkipReason::NegativeDistance {
                distance_km: dec!(-12),
            },
        };
        assert_eq!(warning.to_string(), "mileage entry #0: negative distance -12 km");
    }

    #[test]
    fn warning_serializes_with_tagged_reason() {
        let warning = RecordWarning {
            kind: RecordKind::VatFiling,
            index: 1,
            id: None,
            reason: SkipReason::MissingAmount,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "vat_filing");
        assert_eq!(json["reason"]["type"], "MissingAmount");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn unparseable_amount_display() {
        let warning = RecordWarning {
            kind: RecordKind::Expense,
            index: 2,
            id: None,
            reason: SkipReason::UnparseableAmount {
                field: "amount_gross".to_string(),
                value: "12,50".to_string(),
            },
        };
        assert_eq!(warning.to_string(), "expense #2: unparseable amount_gross '12,50'");
    }
}
