//! VAT command - net/gross conversions for entry forms

use btwc::{
    format_amount, gross_from_net, net_from_gross, round2, validate, Locale, TaxBreakdown, VatRate,
};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct VatCommand {
    #[command(subcommand)]
    action: VatAction,
}

#[derive(Subcommand, Debug)]
enum VatAction {
    /// Split a VAT-inclusive amount into net and VAT
    NetFromGross(ConvertArgs),
    /// Add VAT to a VAT-exclusive amount
    GrossFromNet(ConvertArgs),
    /// Check that net + VAT matches gross within two cents
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Amount in euros
    #[arg(allow_negative_numbers = true)]
    amount: Decimal,

    /// VAT rate: 21, 9 or 0
    #[arg(short, long, default_value = "21")]
    rate: VatRate,

    /// Locale used to display amounts (nl-NL, en-US, en-GB, de-DE, pl-PL)
    #[arg(short, long, default_value = "nl-NL")]
    locale: Locale,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(allow_negative_numbers = true)]
    net: Decimal,
    #[arg(allow_negative_numbers = true)]
    vat: Decimal,
    #[arg(allow_negative_numbers = true)]
    gross: Decimal,
}

#[derive(Debug, Serialize)]
struct ConversionOutput {
    rate: VatRate,
    #[serde(flatten)]
    breakdown: TaxBreakdown,
}

#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "")]
    label: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

impl VatCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match &self.action {
            VatAction::NetFromGross(args) => {
                let breakdown = net_from_gross(args.amount, args.rate)?;
                args.print(breakdown)
            }
            VatAction::GrossFromNet(args) => {
                let breakdown = gross_from_net(args.amount, args.rate)?;
                args.print(breakdown)
            }
            VatAction::Check(args) => args.exec(),
        }
    }
}

impl ConvertArgs {
    fn print(&self, breakdown: TaxBreakdown) -> anyhow::Result<()> {
        if self.json {
            let output = ConversionOutput {
                rate: self.rate,
                breakdown,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let rows = [
            ("Net".to_string(), breakdown.net),
            (format!("VAT {}", self.rate), breakdown.vat),
            ("Gross".to_string(), breakdown.gross),
        ]
        .into_iter()
        .map(|(label, amount)| BreakdownRow {
            label,
            amount: format_amount(amount, self.locale),
        });

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        Ok(())
    }
}

impl CheckArgs {
    fn exec(&self) -> anyhow::Result<()> {
        let sum = round2(self.net + self.vat);
        let difference = round2(self.net + self.vat - self.gross);
        if validate(self.net, self.vat, self.gross) {
            println!("\u{2713} Consistent (difference {:.2})", difference);
            Ok(())
        } else {
            println!(
                "\u{26A0} Inconsistent: net + VAT = {:.2}, gross = {:.2} (difference {:.2})",
                sum,
                round2(self.gross),
                difference
            );
            std::process::exit(1);
        }
    }
}
