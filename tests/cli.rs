//! E2E tests for the btwc commands

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::str::FromStr;

const RECORDS: &str = "tests/data/records.json";

fn btwc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_btwc"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn btwc_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_btwc"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for command")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

/// Decimals serialize as strings; accept plain numbers too
fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

#[test]
fn vat_net_from_gross_table() {
    let output = btwc(&["vat", "net-from-gross", "193.60", "--locale", "en-US"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("€160.00"));
    assert!(stdout.contains("€33.60"));
    assert!(stdout.contains("€193.60"));
    assert!(stdout.contains("VAT 21%"));
}

#[test]
fn vat_gross_from_net_json() {
    let output = btwc(&["vat", "gross-from-net", "160", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json = stdout_json(&output);
    assert_eq!(decimal(&json["rate"]), dec!(21));
    assert_eq!(decimal(&json["net"]), dec!(160));
    assert_eq!(decimal(&json["vat"]), dec!(33.60));
    assert_eq!(decimal(&json["gross"]), dec!(193.60));
}

#[test]
fn vat_reduced_rate_dutch_locale() {
    let output = btwc(&["vat", "net-from-gross", "50", "--rate", "9"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("€\u{a0}45,87"));
    assert!(stdout.contains("€\u{a0}4,13"));
}

#[test]
fn vat_negative_amount_rejected() {
    let output = btwc(&["vat", "net-from-gross", "-5"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("must not be negative"), "stderr: {}", stderr);
}

#[test]
fn vat_unsupported_rate_rejected() {
    let output = btwc(&["vat", "gross-from-net", "100", "--rate", "19"]);
    assert!(!output.status.success());
}

#[test]
fn vat_check_tolerance() {
    assert!(btwc(&["vat", "check", "100", "21", "121.01"]).status.success());

    let output = btwc(&["vat", "check", "100", "21", "121.02"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Inconsistent"));
}

#[test]
fn vat_check_difference_rounded_to_cents() {
    let output = btwc(&["vat", "check", "100", "21", "121.005"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("difference -0.01"), "stdout: {}", stdout);
}

#[test]
fn thresholds_just_over_exemption() {
    let output = btwc(&["thresholds", "20000.01", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json = stdout_json(&output);
    assert_eq!(json["exceeds_exemption"], true);
    assert_eq!(json["exceeds_quarterly_filing_limit"], false);
    assert_eq!(json["declaration_frequency"], "quarterly");
}

#[test]
fn thresholds_text_output() {
    let output = btwc(&["thresholds", "1500000.01", "--locale", "en-GB"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("€1,500,000.01"));
    assert!(stdout.contains("Declaration frequency: monthly"));
}

#[test]
fn report_quarter_json() {
    let output = btwc(&[
        "report", "-r", RECORDS, "--year", "2025", "--quarter", "Q1", "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json = stdout_json(&output);
    let months = json["months"].as_array().expect("months array");
    let labels: Vec<_> = months.iter().map(|m| m["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["2025-01", "2025-02", "2025-03"]);

    assert_eq!(decimal(&months[0]["revenue"]), dec!(8000));
    assert_eq!(decimal(&months[1]["revenue"]), dec!(6000));
    assert_eq!(decimal(&months[2]["revenue"]), dec!(7000.01));
    assert_eq!(decimal(&months[2]["cumulative_revenue"]), dec!(21000.01));
    assert_eq!(months[2]["projected"], false);

    assert_eq!(json["thresholds"]["exceeds_exemption"], true);
    assert_eq!(json["exemption_exceeded_in"], "2025-03");
    assert_eq!(json["warnings"].as_array().map(Vec::len), Some(3));
}

#[test]
fn report_table_mentions_skipped_records() {
    let output = btwc(&[
        "report", "-r", RECORDS, "--from", "2025-01-01", "--to", "2025-03-31", "--locale",
        "en-US",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("2025-02"));
    assert!(stdout.contains("€8,000.00"));
    assert!(stdout.contains("KOR threshold first exceeded in 2025-03"));
    assert!(stderr.contains("3 record(s) skipped"));
}

#[test]
fn report_csv_one_row_per_month() {
    let output = btwc(&[
        "report", "-r", RECORDS, "--year", "2025", "--quarter", "Q1", "--csv",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("year,month,label,revenue"));
    assert!(lines[1].starts_with("2025,1,2025-01,8000"));
}

#[test]
fn report_with_forecast() {
    let output = btwc(&[
        "report", "-r", RECORDS, "--year", "2025", "--quarter", "Q1", "--forecast", "2",
        "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json = stdout_json(&output);
    let months = json["months"].as_array().expect("months array");
    assert_eq!(months.len(), 5);
    assert_eq!(months[3]["label"], "2025-04");
    assert_eq!(months[3]["projected"], true);
    assert_eq!(months[4]["projected"], true);
}

#[test]
fn report_empty_records_zero_filled() {
    let output = btwc_stdin(
        &["report", "-r", "-", "--from", "2025-01-01", "--to", "2025-03-31", "--json"],
        "{}",
    );
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json = stdout_json(&output);
    let months = json["months"].as_array().expect("months array");
    assert_eq!(months.len(), 3);
    for month in months {
        assert_eq!(decimal(&month["revenue"]), Decimal::ZERO);
        assert_eq!(decimal(&month["cumulative_revenue"]), Decimal::ZERO);
    }
    assert_eq!(json["warnings"].as_array().map(Vec::len), Some(0));
}

#[test]
fn report_inverted_period_fails() {
    let output = btwc(&["report", "-r", RECORDS, "--from", "2025-03-01", "--to", "2025-01-31"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("is after period end"), "stderr: {}", stderr);
}

#[test]
fn report_empty_stdin_fails() {
    let output = btwc_stdin(&["report", "-r", "-", "--year", "2025"], "");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("No input received"));
}

#[test]
fn summary_quarter_json() {
    let output = btwc(&[
        "summary", "-r", RECORDS, "--year", "2025", "--quarter", "Q1", "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json = stdout_json(&output);
    assert_eq!(json["months"], 3);
    assert_eq!(decimal(&json["revenue"]), dec!(21000.01));
    assert_eq!(decimal(&json["vat_collected"]), dec!(4290));
    assert_eq!(decimal(&json["vat_deductible"]), dec!(37.73));
    assert_eq!(decimal(&json["mileage_reimbursement"]), dec!(16.38));
    assert_eq!(decimal(&json["vat_refunded"]), dec!(120));
    assert_eq!(json["invoice_count"], 4);
    assert_eq!(json["kor_eligible"], false);
    assert_eq!(json["declaration_frequency"], "quarterly");
    assert_eq!(json["skipped_records"], 3);
    assert_eq!(json["filing_count"], 1);
    assert_eq!(
        decimal(&json["gross_profit"]),
        decimal(&json["revenue_gross"]) - decimal(&json["expenses_gross"])
    );
    assert_eq!(decimal(&json["projected_year_end_revenue"]), dec!(84000.04));
}

#[test]
fn summary_text_output() {
    let output = btwc(&["summary", "-r", RECORDS, "--year", "2025", "--locale", "en-US"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("FINANCIAL SUMMARY (2025, 12 months)"));
    assert!(stdout.contains("Declaration frequency: quarterly"));
    assert!(stdout.contains("3 record(s) skipped"));
}

#[test]
fn validate_lists_skipped_records() {
    let output = btwc(&["validate", "-r", RECORDS, "--year", "2025"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("3 record(s) skipped"));
    assert!(stdout.contains("invoice #5 (2025-006): unparseable date '31/03/2025'"));
    assert!(stdout.contains("expense #3 (exp-4): no usable amount"));
    assert!(stdout.contains("mileage entry #1 (trip-2): negative distance -5 km"));
}

#[test]
fn validate_clean_records_from_stdin() {
    let input = r#"{"invoices":[{"issue_date":"2025-05-01","total_net":100,"vat_rate":21}]}"#;
    let output = btwc_stdin(&["validate", "-r", "-"], input);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("No issues found"));
}

#[test]
fn bad_amount_does_not_hide_other_records() {
    let input = r#"{"invoices":[
        {"id":"a","issue_date":"2025-05-01","total_net":100,"vat_rate":21},
        {"id":"b","issue_date":"2025-05-02","total_net":"12,50"},
        {"id":"c","issue_date":"2025-05-03","total_net":100,"vat_rate":19},
        {"id":"d","issue_date":"2025-05-04","total_net":100,"total_vat":21,"total_gross":500}
    ]}"#;
    let output = btwc_stdin(&["validate", "-r", "-"], input);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("3 record(s) skipped"), "stdout: {}", stdout);
    assert!(stdout.contains("invoice #1 (b): unparseable total_net '12,50'"));
    assert!(stdout.contains("invoice #2 (c): unsupported VAT rate '19'"));
    assert!(stdout.contains("invoice #3 (d): net 100 + VAT 21 does not match gross 500"));

    let report = btwc_stdin(&["summary", "-r", "-", "--json"], input);
    assert!(report.status.success(), "Command failed: {:?}", report);
    let json = stdout_json(&report);
    assert_eq!(decimal(&json["revenue"]), dec!(100));
    assert_eq!(json["invoice_count"], 1);
}

#[test]
fn validate_json_output() {
    let output = btwc(&["validate", "-r", RECORDS, "--year", "2025", "--json"]);
    assert_eq!(output.status.code(), Some(1));

    let json = stdout_json(&output);
    assert_eq!(json["issue_count"], 3);
    assert_eq!(json["issues"][0]["kind"], "invoice");
    assert_eq!(json["issues"][0]["reason"]["type"], "UnparseableDate");
    assert_eq!(json["issues"][2]["reason"]["type"], "NegativeDistance");
}

#[test]
fn schema_describes_records_input() {
    let output = btwc(&["schema"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json = stdout_json(&output);
    let properties = &json["properties"];
    assert!(properties.get("invoices").is_some());
    assert!(properties.get("expenses").is_some());
    assert!(properties.get("mileage").is_some());
    assert!(properties.get("vat_filings").is_some());
}
