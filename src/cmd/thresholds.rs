use btwc::{
    compute_thresholds, format_amount, threshold_usage, Locale, KOR_THRESHOLD,
    MONTHLY_FILING_THRESHOLD,
};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ThresholdsCommand {
    /// Cumulative revenue for the calendar year, excluding VAT
    #[arg(allow_negative_numbers = true)]
    revenue: Decimal,

    /// Locale used to display amounts
    #[arg(short, long, default_value = "nl-NL")]
    locale: Locale,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ThresholdsOutput {
    revenue: Decimal,
    exceeds_exemption: bool,
    exceeds_quarterly_filing_limit: bool,
    kor_usage: Decimal,
    quarterly_filing_usage: Decimal,
    declaration_frequency: String,
}

impl ThresholdsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let thresholds = compute_thresholds(self.revenue);
        let kor_usage = threshold_usage(self.revenue, KOR_THRESHOLD);
        let quarterly_usage = threshold_usage(self.revenue, MONTHLY_FILING_THRESHOLD);

        if self.json {
            let output = ThresholdsOutput {
                revenue: self.revenue,
                exceeds_exemption: thresholds.exceeds_exemption,
                exceeds_quarterly_filing_limit: thresholds.exceeds_quarterly_filing_limit,
                kor_usage,
                quarterly_filing_usage: quarterly_usage,
                declaration_frequency: thresholds.declaration_frequency().to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let yes_no = |flag| if flag { "yes" } else { "no" };
        println!("Revenue: {}", format_amount(self.revenue, self.locale));
        println!(
            "Exceeds KOR threshold ({}): {} ({:.2}% used)",
            format_amount(KOR_THRESHOLD, self.locale),
            yes_no(thresholds.exceeds_exemption),
            kor_usage
        );
        println!(
            "Exceeds quarterly filing limit ({}): {} ({:.2}% used)",
            format_amount(MONTHLY_FILING_THRESHOLD, self.locale),
            yes_no(thresholds.exceeds_quarterly_filing_limit),
            quarterly_usage
        );
        println!("Declaration frequency: {}", thresholds.declaration_frequency());
        Ok(())
    }
}
