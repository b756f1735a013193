//! Schema command - print the expected records input format

use btwc::RecordsInput;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the records input
    JsonSchema,
    /// Field descriptions per record type
    Fields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::Fields => {
                self.print_fields();
                Ok(())
            }
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(RecordsInput);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_fields(&self) {
        println!("Records Input Format");
        println!("====================");
        println!();
        println!("{{ \"invoices\": [...], \"expenses\": [...], \"mileage\": [...], \"vat_filings\": [...] }}");
        println!("Every list is optional. Dates are ISO 8601.");
        for (section, fields) in FIELD_DESCRIPTIONS {
            println!();
            println!("{}", section);
            for (name, required, description) in *fields {
                let req = if *required { "required" } else { "optional" };
                println!("  {:22} ({:8})  {}", name, req, description);
            }
        }
        println!();
        println!("Amounts: give net, or gross with vat_rate. Missing parts are derived.");
    }
}

type FieldDescription = (&'static str, bool, &'static str);

const FIELD_DESCRIPTIONS: &[(&str, &[FieldDescription])] = &[
    (
        "invoices",
        &[
            ("issue_date", true, "Invoice date (alias: date)"),
            ("invoice_number", false, "Shown in warnings"),
            ("status", false, "unpaid, partial, paid or cancelled (cancelled is ignored)"),
            ("total_net", false, "Total excluding VAT"),
            ("total_vat", false, "VAT amount"),
            ("total_gross", false, "Total including VAT"),
            ("vat_rate", false, "21, 9 or 0 (default 21 for gross-only)"),
        ],
    ),
    (
        "expenses",
        &[
            ("date", true, "Expense date"),
            ("amount_net", false, "Amount excluding VAT"),
            ("vat_amount", false, "VAT amount"),
            ("amount_gross", false, "Amount including VAT"),
            ("vat_rate", false, "21, 9 or 0"),
            ("is_vat_deductible", false, "Defaults to true"),
        ],
    ),
    (
        "mileage",
        &[
            ("date", true, "Trip date"),
            ("distance_km", false, "Kilometres driven"),
            ("vehicle_type", false, "car, van (0.21/km), motorcycle (0.15), bicycle (0.00)"),
            ("is_business", false, "Private trips are not reimbursed"),
            ("reimbursement_rate", false, "Overrides the vehicle rate"),
            ("total_reimbursement", false, "Overrides distance x rate"),
        ],
    ),
    (
        "vat_filings",
        &[
            ("date", true, "Submission or payment date (alias: submission_date)"),
            ("period", false, "Q1-Q4"),
            ("status", false, "draft (ignored), submitted or paid"),
            ("balance", false, "Positive paid, negative refunded"),
            ("total_vat_to_pay", false, "Used when balance is absent"),
            ("total_vat_deductible", false, "Used when balance is absent"),
        ],
    ),
];
