use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Round to whole cents. Midpoints go away from zero, like invoice totals do.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Locales supported for amount display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// `€ 1.234,56`
    #[default]
    NlNl,
    /// `€1,234.56`
    EnUs,
    /// `€1,234.56`
    EnGb,
    /// `1.234,56 €`
    DeDe,
    /// `1 234,56 €`
    PlPl,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::NlNl => "nl-NL",
            Locale::EnUs => "en-US",
            Locale::EnGb => "en-GB",
            Locale::DeDe => "de-DE",
            Locale::PlPl => "pl-PL",
        }
    }

    fn separators(&self) -> (char, char) {
        match self {
            Locale::NlNl | Locale::DeDe => ('.', ','),
            Locale::EnUs | Locale::EnGb => (',', '.'),
            Locale::PlPl => ('\u{a0}', ','),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "nl" | "nl-nl" => Ok(Locale::NlNl),
            "en" | "en-us" => Ok(Locale::EnUs),
            "en-gb" => Ok(Locale::EnGb),
            "de" | "de-de" => Ok(Locale::DeDe),
            "pl" | "pl-pl" => Ok(Locale::PlPl),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Format a euro amount with exactly two fraction digits.
///
/// Values coming out of the VAT engine are already whole cents and are
/// rendered as-is; anything finer is normalized with [`round2`], the same
/// rounding the engine applies, so no second rounding rule is introduced.
pub fn format_amount(amount: Decimal, locale: Locale) -> String {
    let cents = round2(amount);
    let negative = cents.is_sign_negative() && !cents.is_zero();
    let digits = format!("{:.2}", cents.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let (group_sep, decimal_sep) = locale.separators();
    let number = format!("{}{}{}", group_thousands(int_part, group_sep), decimal_sep, frac_part);

    match (locale, negative) {
        (Locale::NlNl, false) => format!("€\u{a0}{number}"),
        (Locale::NlNl, true) => format!("€\u{a0}-{number}"),
        (Locale::EnUs | Locale::EnGb, false) => format!("€{number}"),
        (Locale::EnUs | Locale::EnGb, true) => format!("-€{number}"),
        (Locale::DeDe | Locale::PlPl, false) => format!("{number}\u{a0}€"),
        (Locale::DeDe | Locale::PlPl, true) => format!("-{number}\u{a0}€"),
    }
}

fn group_thousands(int_part: &str, sep: char) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

/// Plain `€1234.56` style used in tables and logs
pub fn format_eur(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-€{:.2}", round2(amount).abs())
    } else {
        format!("€{:.2}", round2(amount))
    }
}
