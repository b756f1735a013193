//! Net/gross conversion at the Dutch BTW rates.
//!
//! A gross figure from a receipt goes through [`net_from_gross`] only;
//! [`gross_from_net`] on it would add VAT a second time.

use super::money::round2;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum absolute difference between `net + vat` and `gross` that still
/// counts as consistent. Net and VAT are rounded independently.
pub const VAT_TOLERANCE: Decimal = dec!(0.02);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VatError {
    #[error("amount must not be negative: {amount}")]
    InvalidAmount { amount: Decimal },
    #[error("unsupported VAT rate: {0} (expected 21, 9 or 0)")]
    InvalidRate(String),
}

/// Dutch VAT rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub enum VatRate {
    /// 21%: construction services and most goods
    #[default]
    Standard,
    /// 9%: food, books, passenger transport
    Reduced,
    /// 0%: export and intra-EU reverse charge
    Zero,
}

impl VatRate {
    pub const ALL: [VatRate; 3] = [VatRate::Standard, VatRate::Reduced, VatRate::Zero];

    /// Rate as a percentage, e.g. `21`
    pub fn percent(&self) -> Decimal {
        match self {
            VatRate::Standard => dec!(21),
            VatRate::Reduced => dec!(9),
            VatRate::Zero => dec!(0),
        }
    }

    /// Rate as a fraction, e.g. `0.21`
    pub fn fraction(&self) -> Decimal {
        self.percent() / dec!(100)
    }

    pub fn from_percent(percent: Decimal) -> Result<Self, VatError> {
        VatRate::ALL
            .into_iter()
            .find(|rate| rate.percent() == percent)
            .ok_or_else(|| VatError::InvalidRate(percent.to_string()))
    }
}

impl TryFrom<Decimal> for VatRate {
    type Error = VatError;

    fn try_from(percent: Decimal) -> Result<Self, Self::Error> {
        VatRate::from_percent(percent)
    }
}

impl TryFrom<u32> for VatRate {
    type Error = VatError;

    fn try_from(percent: u32) -> Result<Self, Self::Error> {
        VatRate::from_percent(Decimal::from(percent))
    }
}

impl From<VatRate> for Decimal {
    fn from(rate: VatRate) -> Self {
        rate.percent()
    }
}

impl FromStr for VatRate {
    type Err = VatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        match trimmed.to_ascii_lowercase().as_str() {
            "standard" | "high" | "hoog" => return Ok(VatRate::Standard),
            "reduced" | "low" | "laag" => return Ok(VatRate::Reduced),
            "zero" | "nul" => return Ok(VatRate::Zero),
            _ => {}
        }
        let percent =
            Decimal::from_str(trimmed).map_err(|_| VatError::InvalidRate(s.to_string()))?;
        VatRate::from_percent(percent)
    }
}

impl std::fmt::Display for VatRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Net, VAT and gross for one amount, each rounded to cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
}

impl TaxBreakdown {
    fn pass_through(amount: Decimal) -> Self {
        let amount = round2(amount);
        TaxBreakdown {
            net: amount,
            vat: Decimal::ZERO,
            gross: amount,
        }
    }

    pub fn is_consistent(&self) -> bool {
        validate(self.net, self.vat, self.gross)
    }
}

/// Split a VAT-inclusive amount (e.g. a receipt total) into net and VAT.
///
/// `net = gross / (1 + rate)`, `vat = gross - net`.
pub fn net_from_gross(gross: Decimal, rate: VatRate) -> Result<TaxBreakdown, VatError> {
    if gross.is_sign_negative() && !gross.is_zero() {
        return Err(VatError::InvalidAmount { amount: gross });
    }

    if rate == VatRate::Zero {
        return Ok(TaxBreakdown::pass_through(gross));
    }

    let net = gross / (Decimal::ONE + rate.fraction());
    let vat = gross - net;

    Ok(TaxBreakdown {
        net: round2(net),
        vat: round2(vat),
        gross: round2(gross),
    })
}

/// Add VAT to a VAT-exclusive amount (e.g. a quoted service price).
///
/// `vat = net * rate`, `gross = net + vat`.
pub fn gross_from_net(net: Decimal, rate: VatRate) -> Result<TaxBreakdown, VatError> {
    if net.is_sign_negative() && !net.is_zero() {
        return Err(VatError::InvalidAmount { amount: net });
    }

    if rate == VatRate::Zero {
        return Ok(TaxBreakdown::pass_through(net));
    }

    let vat = net * rate.fraction();
    let gross = net + vat;

    Ok(TaxBreakdown {
        net: round2(net),
        vat: round2(vat),
        gross: round2(gross),
    })
}

/// VAT owed on a net amount, rounded to cents
pub fn vat_portion(net: Decimal, rate: VatRate) -> Decimal {
    round2(net * rate.fraction())
}

/// True when `net + vat` matches `gross` to within two cents (exclusive).
pub fn validate(net: Decimal, vat: Decimal, gross: Decimal) -> bool {
    (net + vat - gross).abs() < VAT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(net: Decimal, vat: Decimal, gross: Decimal) -> TaxBreakdown {
        TaxBreakdown { net, vat, gross }
    }

    #[test]
    fn receipt_at_standard_rate() {
        let result = net_from_gross(dec!(193.60), VatRate::Standard).unwrap();
        assert_eq!(result, breakdown(dec!(160.00), dec!(33.60), dec!(193.60)));
    }

    #[test]
    fn service_at_standard_rate() {
        let result = gross_from_net(dec!(160.00), VatRate::Standard).unwrap();
        assert_eq!(result, breakdown(dec!(160.00), dec!(33.60), dec!(193.60)));
    }

    #[test]
    fn food_at_reduced_rate() {
        let result = net_from_gross(dec!(50.00), VatRate::Reduced).unwrap();
        assert_eq!(result, breakdown(dec!(45.87), dec!(4.13), dec!(50.00)));
        assert!(result.is_consistent());
    }

    #[test]
    fn zero_rate_passes_through() {
        let from_gross = net_from_gross(dec!(1000), VatRate::Zero).unwrap();
        assert_eq!(from_gross, breakdown(dec!(1000), dec!(0), dec!(1000)));

        let from_net = gross_from_net(dec!(1000), VatRate::Zero).unwrap();
        assert_eq!(from_net, breakdown(dec!(1000), dec!(0), dec!(1000)));
    }

    #[test]
    fn negative_amounts_rejected() {
        assert_eq!(
            net_from_gross(dec!(-0.01), VatRate::Standard),
            Err(VatError::InvalidAmount { amount: dec!(-0.01) })
        );
        assert_eq!(
            gross_from_net(dec!(-10), VatRate::Zero),
            Err(VatError::InvalidAmount { amount: dec!(-10) })
        );
    }

    #[test]
    fn zero_amount_is_valid() {
        let result = net_from_gross(dec!(0), VatRate::Standard).unwrap();
        assert_eq!(result, breakdown(dec!(0), dec!(0), dec!(0)));
    }

    #[test]
    fn round_trip_within_tolerance() {
        let mut gross = dec!(0);
        while gross < dec!(250) {
            for rate in VatRate::ALL {
                let split = net_from_gross(gross, rate).unwrap();
                let rebuilt = gross_from_net(split.net, rate).unwrap();
                assert!(
                    (rebuilt.gross - gross).abs() <= VAT_TOLERANCE,
                    "{gross} at {rate} rebuilt as {}",
                    rebuilt.gross
                );
                assert!(split.is_consistent());
                assert!(rebuilt.is_consistent());
            }
            gross += dec!(0.37);
        }
    }

    #[test]
    fn validate_tolerance_boundary() {
        assert!(validate(dec!(100), dec!(21), dec!(121)));
        assert!(validate(dec!(100), dec!(21), dec!(121.0199)));
        assert!(!validate(dec!(100), dec!(21), dec!(121.02)));
        assert!(!validate(dec!(100), dec!(21), dec!(120.98)));
        assert!(validate(dec!(100), dec!(21), dec!(120.9801)));
    }

    #[test]
    fn vat_portion_rounds_to_cents() {
        assert_eq!(vat_portion(dec!(16.38), VatRate::Standard), dec!(3.44));
        assert_eq!(vat_portion(dec!(100), VatRate::Zero), dec!(0));
    }

    #[test]
    fn rate_lookup() {
        assert_eq!(VatRate::Standard.percent(), dec!(21));
        assert_eq!(VatRate::Reduced.fraction(), dec!(0.09));
        assert_eq!(VatRate::try_from(9u32), Ok(VatRate::Reduced));
        assert_eq!(VatRate::from_percent(dec!(21.0)), Ok(VatRate::Standard));
        assert_eq!(
            VatRate::try_from(19u32),
            Err(VatError::InvalidRate("19".to_string()))
        );
    }

    #[test]
    fn rate_from_str() {
        assert_eq!("21".parse::<VatRate>(), Ok(VatRate::Standard));
        assert_eq!("9%".parse::<VatRate>(), Ok(VatRate::Reduced));
        assert_eq!("zero".parse::<VatRate>(), Ok(VatRate::Zero));
        assert!("6".parse::<VatRate>().is_err());
        assert!("abc".parse::<VatRate>().is_err());
    }

    #[test]
    fn rate_deserializes_from_number() {
        let rate: VatRate = serde_json::from_str("9").unwrap();
        assert_eq!(rate, VatRate::Reduced);
        assert!(serde_json::from_str::<VatRate>("12").is_err());
    }
}
