use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

const PAYABLES_WITH_ERRORS: &str = "vendor_name,invoice,invoice_date,due_date,invoice_amount,currency\n\
Acme,INV1,2025-01-01,2025-02-01,1000,USD\n\
,INV2,2025-01-01,2025-02-01,abc,USD\n";

const PAYABLES_CLEAN: &str = "vendor_name,invoice,invoice_date,due_date,invoice_amount,currency\n\
Acme,INV1,01/01/2025,31/01/2025,\"1,000.00\",USD\n";

struct CliRun {
    code: Option<i32>,
    stdout: String,
}

fn run_cli(args: &[&str]) -> CliRun {
    let output = Command::new(env!("CARGO_BIN_EXE_fxdesk"))
        .args(args)
        .env("COLUMNS", "120")
        .env_remove("FXDESK_LOG")
        .output();
    assert!(output.is_ok());
    match output {
        Ok(output) => CliRun {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        },
        Err(_) => CliRun {
            code: None,
            stdout: String::new(),
        },
    }
}

fn parse_json(text: &str) -> Value {
    let parsed = serde_json::from_str::<Value>(text);
    assert!(parsed.is_ok(), "stdout was not json: {text}");
    parsed.unwrap_or(Value::Null)
}

fn write_file(path: &Path, body: &str) {
    assert!(fs::write(path, body).is_ok());
}

#[test]
fn no_arguments_prints_the_root_help() {
    let run = run_cli(&[]);
    assert_eq!(run.code, Some(0));
    assert!(run.stdout.starts_with("fxdesk - finance upload checker"));
    assert!(run.stdout.contains("fxdesk template list"));
}

#[test]
fn validate_exits_one_when_the_file_has_errors() {
    let dir = tempdir();
    assert!(dir.is_ok());
    let Ok(dir) = dir else {
        return;
    };
    let path = dir.path().join("payables.csv");
    write_file(&path, PAYABLES_WITH_ERRORS);
    let path = path.display().to_string();

    let run = run_cli(&["validate", &path, "--template", "vendor_payables", "--json"]);
    assert_eq!(run.code, Some(1));
    let value = parse_json(&run.stdout);
    assert_eq!(value["ok"], Value::Bool(true));
    assert_eq!(value["command"], "validate");
    assert_eq!(value["data"]["file"]["status"], "error");
    assert_eq!(value["data"]["validation_errors"].as_array().map(Vec::len), Some(2));
}

#[test]
fn validate_exits_zero_for_a_clean_file() {
    let dir = tempdir();
    assert!(dir.is_ok());
    let Ok(dir) = dir else {
        return;
    };
    let path = dir.path().join("clean.csv");
    write_file(&path, PAYABLES_CLEAN);
    let path = path.display().to_string();

    let run = run_cli(&["validate", &path, "--template", "vendor_payables"]);
    assert_eq!(run.code, Some(0));
    assert!(run.stdout.contains("No problems found."));
}

#[test]
fn unknown_template_is_a_user_error() {
    let run = run_cli(&["validate", "missing.csv", "--template", "payroll", "--json"]);
    assert_eq!(run.code, Some(1));
    let value = parse_json(&run.stdout);
    assert_eq!(value["ok"], Value::Bool(false));
    assert_eq!(value["error"]["code"], "unknown_template");
    assert_eq!(value["data"]["help_command"], "fxdesk template list");
}

#[test]
fn bad_arguments_map_to_invalid_argument() {
    let run = run_cli(&["correct", "a.csv", "--template", "debtor", "--set", "nonsense", "--json"]);
    assert_eq!(run.code, Some(1));
    let value = parse_json(&run.stdout);
    assert_eq!(value["error"]["code"], "invalid_argument");
    assert_eq!(value["data"]["command_hint"], "correct");
}

#[test]
fn template_list_names_every_template() {
    let run = run_cli(&["template", "list", "--json"]);
    assert_eq!(run.code, Some(0));
    let value = parse_json(&run.stdout);
    let templates = value["data"]["templates"].as_array().cloned().unwrap_or_default();
    assert_eq!(templates.len(), 12);
    assert!(templates.iter().any(|template| template["id"] == "letter_of_credit"));
}

#[test]
fn template_sample_prints_raw_csv_in_text_mode() {
    let run = run_cli(&["template", "sample", "vendor_payables"]);
    assert_eq!(run.code, Some(0));
    assert!(
        run.stdout
            .starts_with("vendor_name,invoice,invoice_date,due_date,invoice_amount,currency")
    );
}

#[test]
fn correct_writes_a_clean_output_file() {
    let dir = tempdir();
    assert!(dir.is_ok());
    let Ok(dir) = dir else {
        return;
    };
    let input = dir.path().join("payables.csv");
    let output = dir.path().join("fixed.csv");
    write_file(&input, PAYABLES_WITH_ERRORS);
    let input = input.display().to_string();
    let output_arg = output.display().to_string();

    let run = run_cli(&[
        "correct",
        &input,
        "--template",
        "vendor_payables",
        "--set",
        "3:vendor_name=Globex",
        "--set",
        "3:invoice_amount=2500",
        "--output",
        &output_arg,
        "--json",
    ]);
    assert_eq!(run.code, Some(0));
    let value = parse_json(&run.stdout);
    assert_eq!(value["data"]["file"]["status"], "success");
    assert_eq!(value["data"]["summary"]["cells_updated"], 2);
    assert_eq!(value["data"]["summary"]["errors_after"], 0);

    let written = fs::read_to_string(&output);
    assert!(written.is_ok());
    if let Ok(body) = written {
        assert!(body.contains("Globex,INV2"));
    }
}
