use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser, Debug)]
#[command(name = "btwc", version, about = "Dutch VAT (BTW) calculator and financial reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Net/gross VAT conversions and consistency checks
    Vat(cmd::vat::VatCommand),
    /// Monthly revenue, expense and VAT timeline
    Report(cmd::report::ReportCommand),
    /// Period totals, VAT position and threshold status
    Summary(cmd::summary::SummaryCommand),
    /// Threshold flags for a cumulative annual revenue
    Thresholds(cmd::thresholds::ThresholdsCommand),
    /// List records that would be skipped during aggregation
    Validate(cmd::validate::ValidateCommand),
    /// Print the JSON Schema for the records input
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Vat(vat) => vat.exec(),
        Command::Report(report) => report.exec(),
        Command::Summary(summary) => summary.exec(),
        Command::Thresholds(thresholds) => thresholds.exec(),
        Command::Validate(validate) => validate.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
