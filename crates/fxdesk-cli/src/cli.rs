use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fxdesk_client::commands::correct::CellAssignment;

const FIRST_DATA_ROW: usize = 2;

/// Parses `ROW:COLUMN=VALUE`; the value may be empty to clear a cell.
pub fn parse_cell_assignment(value: &str) -> Result<CellAssignment, String> {
    let Some((row, rest)) = value.split_once(':') else {
        return Err("assignment must look like ROW:COLUMN=VALUE".to_string());
    };
    let Some((column, cell)) = rest.split_once('=') else {
        return Err("assignment must look like ROW:COLUMN=VALUE".to_string());
    };

    let row = parse_data_row(row.trim())?;
    let column = column.trim();
    if column.is_empty() {
        return Err("assignment needs a column name before `=`".to_string());
    }

    Ok(CellAssignment {
        row,
        column: column.to_string(),
        value: cell.to_string(),
    })
}

/// Grid row numbers as printed in validation errors; row 1 is the header.
pub fn parse_data_row(value: &str) -> Result<usize, String> {
    let row = value
        .parse::<usize>()
        .map_err(|_| "row must be a whole number".to_string())?;
    if row < FIRST_DATA_ROW {
        return Err(format!(
            "row {row} is the header or out of range; data rows start at {FIRST_DATA_ROW}"
        ));
    }
    Ok(row)
}

pub fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err("value must be a positive whole number".to_string()),
    }
}

/// Extended help shown after `fxdesk correct --help`.
pub const CORRECT_AFTER_HELP: &str = "\
Row numbers:
  ROW is the row number shown by `fxdesk validate`: the header is row 1,
  the first data row is row 2. Numbers always refer to the file as uploaded,
  so you can copy them straight from the validation report.

Order of operations:
  1. Every --set is applied (several --set on one row become one edit).
  2. Every --remove-row is applied, bottom row first.
  3. The file is re-validated and the corrected grid is saved.

Examples:
  fxdesk correct payables.csv --template vendor_payables --set 3:vendor_name=Globex
  fxdesk correct payables.csv --template vendor_payables --remove-row 7 --output fixed.csv
";

#[derive(Debug, Parser)]
#[command(
    name = "fxdesk",
    version,
    about = "finance upload checker: validate, preview, and correct tabular files",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse one CSV or Excel file and check it against a template
    Validate {
        /// Path to a .csv, .xlsx, or .xls file
        path: String,
        /// Template id (see `fxdesk template list`)
        #[arg(long)]
        template: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Show the parsed grid, windowed when it is large
    Preview {
        /// Path to a .csv, .xlsx, or .xls file
        path: String,
        /// Template id (see `fxdesk template list`)
        #[arg(long)]
        template: String,
        /// Scroll offset in pixels for large grids
        #[arg(long, default_value_t = 0)]
        offset_px: u64,
        /// Data-row count above which only the visible window is shown
        #[arg(long, value_parser = parse_positive)]
        threshold: Option<usize>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Fix cells or drop rows, re-validate, and optionally write the result
    #[command(after_long_help = CORRECT_AFTER_HELP)]
    Correct {
        /// Path to a .csv, .xlsx, or .xls file
        path: String,
        /// Template id (see `fxdesk template list`)
        #[arg(long)]
        template: String,
        /// Drop a data row (repeatable)
        #[arg(long = "remove-row", value_parser = parse_data_row)]
        remove_rows: Vec<usize>,
        /// Set one cell as ROW:COLUMN=VALUE (repeatable)
        #[arg(long = "set", value_parser = parse_cell_assignment)]
        assignments: Vec<CellAssignment>,
        /// Write the corrected grid as CSV to this path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Inspect upload templates and download sample files
    #[command(arg_required_else_help = true)]
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum TemplateCommand {
    /// List every built-in template
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Show one template's columns and rules
    Show {
        /// Template id, e.g. vendor_payables
        id: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Print a ready-to-fill sample CSV for a template
    Sample {
        /// Template id, e.g. vendor_payables
        id: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::{Commands, TemplateCommand, parse_cell_assignment, parse_from};

    #[test]
    fn parse_command_paths() {
        let cases: [Vec<&str>; 9] = [
            vec!["fxdesk", "validate", "a.csv", "--template", "vendor_payables"],
            vec!["fxdesk", "validate", "a.xlsx", "--template", "receivables", "--json"],
            vec!["fxdesk", "preview", "a.csv", "--template", "debtor", "--offset-px", "720"],
            vec!["fxdesk", "preview", "a.csv", "--template", "debtor", "--threshold", "50"],
            vec!["fxdesk", "correct", "a.csv", "--template", "creditor", "--remove-row", "4"],
            vec![
                "fxdesk", "correct", "a.csv", "--template", "creditor", "--set", "3:currency=USD",
                "--output", "fixed.csv",
            ],
            vec!["fxdesk", "template", "list"],
            vec!["fxdesk", "template", "show", "gl_master", "--json"],
            vec!["fxdesk", "template", "sample", "bank_statement"],
        ];

        for case in cases {
            let parsed = parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse: {case:?}");
        }
    }

    #[test]
    fn correct_collects_repeated_flags() {
        let parsed = parse_from([
            "fxdesk",
            "correct",
            "a.csv",
            "--template",
            "vendor_payables",
            "--remove-row",
            "5",
            "--remove-row",
            "2",
            "--set",
            "3:vendor_name=Globex Ltd",
            "--set",
            "3:due_date=",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            let Commands::Correct {
                remove_rows,
                assignments,
                output,
                json,
                ..
            } = cli.command
            else {
                panic!("expected correct command");
            };
            assert_eq!(remove_rows, vec![5, 2]);
            assert_eq!(assignments.len(), 2);
            assert_eq!(assignments[0].value, "Globex Ltd");
            assert_eq!(assignments[1].value, "");
            assert!(output.is_none());
            assert!(!json);
        }
    }

    #[test]
    fn assignments_reject_header_rows_and_missing_parts() {
        assert!(parse_cell_assignment("1:vendor_name=x").is_err());
        assert!(parse_cell_assignment("vendor_name=x").is_err());
        assert!(parse_cell_assignment("3:vendor_name").is_err());
        assert!(parse_cell_assignment("3:=x").is_err());

        let parsed = parse_cell_assignment("12: memo = a=b");
        assert!(parsed.is_ok());
        if let Ok(assignment) = parsed {
            assert_eq!(assignment.row, 12);
            assert_eq!(assignment.column, "memo");
            assert_eq!(assignment.value, " a=b");
        }
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let parsed = parse_from(["fxdesk", "preview", "a.csv", "--template", "x", "--threshold", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn template_is_required_for_file_commands() {
        let parsed = parse_from(["fxdesk", "validate", "a.csv"]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn bare_template_shows_help() {
        let parsed = parse_from(["fxdesk", "template"]);
        assert!(parsed.is_err());
        if let Err(err) = parsed {
            assert_eq!(
                err.kind(),
                ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            );
        }
    }

    #[test]
    fn template_subcommands_parse_ids() {
        let parsed = parse_from(["fxdesk", "template", "sample", "purchase_order", "--json"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert!(matches!(
                cli.command,
                Commands::Template {
                    command: TemplateCommand::Sample { ref id, json: true }
                } if id == "purchase_order"
            ));
        }
    }

    #[test]
    fn help_command_is_rejected() {
        let parsed = parse_from(["fxdesk", "help"]);
        assert!(parsed.is_err());
    }
}
