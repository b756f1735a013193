//! Record shapes supplied by the invoicing, expense, mileage and BTW stores.
//!
//! Dates are kept as the raw strings the stores hand over; they are parsed
//! during aggregation so a malformed date skips one record instead of
//! failing the whole snapshot.

use super::money::round2;
use super::period::{parse_record_date, Quarter};
use super::vat::{self, TaxBreakdown, VatRate};
use super::warnings::SkipReason;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::io::Read;
use std::str::FromStr;

/// Input root for records JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecordsInput {
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub mileage: Vec<MileageEntry>,
    #[serde(default)]
    pub vat_filings: Vec<VatFiling>,
}

impl RecordsInput {
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
            && self.expenses.is_empty()
            && self.mileage.is_empty()
            && self.vat_filings.is_empty()
    }

    /// Earliest and latest parseable record date
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self
            .invoices
            .iter()
            .map(|i| i.issue_date.as_str())
            .chain(self.expenses.iter().map(|e| e.date.as_str()))
            .chain(self.mileage.iter().map(|m| m.date.as_str()))
            .chain(self.vat_filings.iter().map(|f| f.date.as_str()))
            .filter_map(parse_record_date);
        dates.fold(None, |span, date| match span {
            None => Some((date, date)),
            Some((first, last)) => Some((first.min(date), last.max(date))),
        })
    }
}

/// A field value as supplied by a store.
///
/// Amounts and rates that do not parse are kept verbatim so the record can
/// be skipped with a warning during aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lenient<T> {
    Valid(T),
    Invalid(String),
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Lenient::Valid(value)
    }
}

impl<T: Serialize> Serialize for Lenient<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Lenient::Valid(value) => value.serialize(serializer),
            Lenient::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

/// Text of a scalar field; null and blank strings count as absent
fn raw_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(other) => Some(other.to_string()),
    };
    Ok(raw)
}

fn lenient_amount<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Lenient<Decimal>>, D::Error> {
    Ok(raw_field(deserializer)?.map(|raw| {
        match Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)) {
            Ok(amount) => Lenient::Valid(amount),
            Err(_) => Lenient::Invalid(raw),
        }
    }))
}

fn lenient_rate<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Lenient<VatRate>>, D::Error> {
    Ok(raw_field(deserializer)?.map(|raw| match VatRate::from_str(&raw) {
        Ok(rate) => Lenient::Valid(rate),
        Err(_) => Lenient::Invalid(raw),
    }))
}

fn amount_field(
    field: &str,
    value: &Option<Lenient<Decimal>>,
) -> Result<Option<Decimal>, SkipReason> {
    match value {
        None => Ok(None),
        Some(Lenient::Valid(amount)) => Ok(Some(*amount)),
        Some(Lenient::Invalid(raw)) => Err(SkipReason::UnparseableAmount {
            field: field.to_string(),
            value: raw.clone(),
        }),
    }
}

fn rate_field(value: &Option<Lenient<VatRate>>) -> Result<Option<VatRate>, SkipReason> {
    match value {
        None => Ok(None),
        Some(Lenient::Valid(rate)) => Ok(Some(*rate)),
        Some(Lenient::Invalid(raw)) => Err(SkipReason::InvalidRate { value: raw.clone() }),
    }
}

/// Read a records snapshot from JSON
pub fn read_records_json<R: Read>(reader: R) -> anyhow::Result<RecordsInput> {
    let input: RecordsInput = serde_json::from_reader(reader)?;
    log::debug!(
        "Read {} invoices, {} expenses, {} mileage entries, {} VAT filings",
        input.invoices.len(),
        input.expenses.len(),
        input.mileage.len(),
        input.vat_filings.len()
    );
    Ok(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
    Cancelled,
}

/// Sales invoice
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Invoice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    /// Issue date (ISO 8601)
    #[serde(alias = "date")]
    pub issue_date: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub status: InvoiceStatus,
    /// Total excluding VAT
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub total_net: Option<Lenient<Decimal>>,
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub total_vat: Option<Lenient<Decimal>>,
    /// Total including VAT
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub total_gross: Option<Lenient<Decimal>>,
    /// VAT rate in percent (21, 9 or 0); used when only one side is known
    #[serde(default, deserialize_with = "lenient_rate")]
    #[schemars(with = "Option<u32>")]
    pub vat_rate: Option<Lenient<VatRate>>,
}

impl Invoice {
    pub fn label(&self) -> Option<String> {
        self.invoice_number.clone().or_else(|| self.id.clone())
    }

    pub fn amounts(&self) -> Result<TaxBreakdown, SkipReason> {
        resolve_amounts(
            amount_field("total_net", &self.total_net)?,
            amount_field("total_vat", &self.total_vat)?,
            amount_field("total_gross", &self.total_gross)?,
            rate_field(&self.vat_rate)?,
        )
    }
}

/// Purchase or cost
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Expense {
    #[serde(default)]
    pub id: Option<String>,
    /// Expense date (ISO 8601)
    pub date: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub amount_net: Option<Lenient<Decimal>>,
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub vat_amount: Option<Lenient<Decimal>>,
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub amount_gross: Option<Lenient<Decimal>>,
    #[serde(default, deserialize_with = "lenient_rate")]
    #[schemars(with = "Option<u32>")]
    pub vat_rate: Option<Lenient<VatRate>>,
    /// Whether the input VAT may be reclaimed
    #[serde(default = "default_true")]
    pub is_vat_deductible: bool,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl Expense {
    pub fn amounts(&self) -> Result<TaxBreakdown, SkipReason> {
        resolve_amounts(
            amount_field("amount_net", &self.amount_net)?,
            amount_field("vat_amount", &self.vat_amount)?,
            amount_field("amount_gross", &self.amount_gross)?,
            rate_field(&self.vat_rate)?,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    #[default]
    Car,
    Van,
    Motorcycle,
    Bicycle,
}

impl VehicleType {
    /// Tax-free reimbursement per kilometre
    pub fn rate_per_km(&self) -> Decimal {
        match self {
            VehicleType::Car | VehicleType::Van => dec!(0.21),
            VehicleType::Motorcycle => dec!(0.15),
            VehicleType::Bicycle => dec!(0.00),
        }
    }
}

/// Business trip
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MileageEntry {
    #[serde(default)]
    pub id: Option<String>,
    /// Trip date (ISO 8601)
    pub date: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub distance_km: Option<Lenient<Decimal>>,
    #[serde(default)]
    pub vehicle_type: VehicleType,
    #[serde(default = "default_true")]
    pub is_business: bool,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    /// Overrides the vehicle rate (€/km)
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub reimbursement_rate: Option<Lenient<Decimal>>,
    /// Precomputed reimbursement; wins over distance × rate
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub total_reimbursement: Option<Lenient<Decimal>>,
}

impl MileageEntry {
    pub fn distance(&self) -> Result<Decimal, SkipReason> {
        let total = amount_field("total_reimbursement", &self.total_reimbursement)?;
        match amount_field("distance_km", &self.distance_km)? {
            Some(km) if km < Decimal::ZERO => Err(SkipReason::NegativeDistance { distance_km: km }),
            Some(km) => Ok(km),
            None if total.is_some() => Ok(Decimal::ZERO),
            None => Err(SkipReason::MissingAmount),
        }
    }

    /// Reimbursement for the trip, zero for private trips
    pub fn reimbursement(&self) -> Result<Decimal, SkipReason> {
        let km = self.distance()?;
        if !self.is_business {
            return Ok(Decimal::ZERO);
        }
        if let Some(total) = amount_field("total_reimbursement", &self.total_reimbursement)? {
            if total < Decimal::ZERO {
                return Err(SkipReason::NegativeAmount { amount: total });
            }
            return Ok(round2(total));
        }
        let rate = amount_field("reimbursement_rate", &self.reimbursement_rate)?
            .unwrap_or_else(|| self.vehicle_type.rate_per_km());
        Ok(round2(km * rate))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    Draft,
    #[default]
    Submitted,
    Paid,
}

/// Filed BTW declaration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VatFiling {
    #[serde(default)]
    pub id: Option<String>,
    /// Submission or payment date (ISO 8601)
    #[serde(alias = "submission_date")]
    pub date: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub period: Option<Quarter>,
    #[serde(default)]
    pub status: FilingStatus,
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub total_vat_to_pay: Option<Lenient<Decimal>>,
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub total_vat_deductible: Option<Lenient<Decimal>>,
    /// Positive: paid to the tax office. Negative: refunded.
    #[serde(default, deserialize_with = "lenient_amount")]
    #[schemars(with = "Option<f64>")]
    pub balance: Option<Lenient<Decimal>>,
}

impl VatFiling {
    pub fn balance(&self) -> Result<Decimal, SkipReason> {
        let balance = amount_field("balance", &self.balance)?;
        let to_pay = amount_field("total_vat_to_pay", &self.total_vat_to_pay)?;
        let deductible = amount_field("total_vat_deductible", &self.total_vat_deductible)?;
        match (balance, to_pay, deductible) {
            (Some(balance), _, _) => Ok(round2(balance)),
            (None, Some(to_pay), deductible) => {
                Ok(round2(to_pay - deductible.unwrap_or(Decimal::ZERO)))
            }
            (None, None, _) => Err(SkipReason::MissingAmount),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Complete a (net, vat, gross) triple from whichever parts a record carries.
///
/// A known net is taken as-is (credit notes may be negative). A gross-only
/// record is split through the VAT engine, at 21% when no rate is recorded.
/// A record carrying all three must satisfy net + VAT = gross within the
/// VAT tolerance.
fn resolve_amounts(
    net: Option<Decimal>,
    vat: Option<Decimal>,
    gross: Option<Decimal>,
    rate: Option<VatRate>,
) -> Result<TaxBreakdown, SkipReason> {
    match (net, vat, gross) {
        (Some(net), Some(vat), Some(gross)) if !vat::validate(net, vat, gross) => {
            Err(SkipReason::InconsistentAmounts { net, vat, gross })
        }
        (Some(net), vat, gross) => {
            let vat = match (vat, gross) {
                (Some(vat), _) => vat,
                (None, Some(gross)) => gross - net,
                (None, None) => vat::vat_portion(net, rate.unwrap_or(VatRate::Zero)),
            };
            let vat = round2(vat);
            let net = round2(net);
            let gross = gross.map(round2).unwrap_or(net + vat);
            Ok(TaxBreakdown { net, vat, gross })
        }
        (None, Some(vat), Some(gross)) => Ok(TaxBreakdown {
            net: round2(gross - vat),
            vat: round2(vat),
            gross: round2(gross),
        }),
        (None, None, Some(gross)) => vat::net_from_gross(gross, rate.unwrap_or_default())
            .map_err(|_| SkipReason::NegativeAmount { amount: gross }),
        (None, _, None) => Err(SkipReason::MissingAmount),
    }
}
