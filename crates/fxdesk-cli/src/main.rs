mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use fxdesk_client::ClientError;
use stdout_io::write_stdout_text;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_ENV: &str = "FXDESK_LOG";

const ROOT_HELP: &str = "fxdesk - finance upload checker

Usage:
  fxdesk <command>

Start here:
  fxdesk template list
  fxdesk validate <path> --template <id>
  fxdesk --help
";

const TOP_LEVEL_HELP: &str = "fxdesk — finance upload checker

USAGE: fxdesk <command>

Pick a template:
  fxdesk template list                                    List upload templates
  fxdesk template show <id>                               Show required columns and rules
  fxdesk template sample <id>                             Print a sample CSV to start from

Check a file (.csv, .xlsx, .xls):
  fxdesk validate <path> --template <id>                  Parse and validate; exits 1 on errors
  fxdesk preview <path> --template <id>                   Show the grid with errors by row and column

Fix it in place:
  fxdesk correct <path> --template <id> --set ROW:COLUMN=VALUE --output fixed.csv
  fxdesk correct <path> --template <id> --remove-row ROW

Every command accepts --json for machine-readable output.
Set FXDESK_LOG=debug to trace parsing and status changes on stderr.
";

const EXIT_USER_ERROR: u8 = 1;
const EXIT_INTERNAL_ERROR: u8 = 2;

fn main() -> ExitCode {
    init_tracing();
    run().unwrap_or_else(|code| code)
}

/// Diagnostics go to stderr so stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn run() -> Result<ExitCode, ExitCode> {
    let argv = std::env::args().collect::<Vec<String>>();
    if argv.len() == 1 {
        emit_help(ROOT_HELP)?;
        return Ok(ExitCode::SUCCESS);
    }

    let cli = match cli::Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(err) => return handle_parse_error(&err, &argv),
    };
    let mode = output::mode_for_command(&cli.command);
    debug!(command = ?cli.command, ?mode, "dispatching command");

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            output::print_success(&success, mode).map_err(|_| ExitCode::from(EXIT_INTERNAL_ERROR))?;
            // Validation findings are a user-fixable outcome, not a crash.
            if success.left_file_in_error() {
                return Err(ExitCode::from(EXIT_USER_ERROR));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            debug!(code = %error.code, "command failed");
            output::print_failure(&error, mode).map_err(|_| ExitCode::from(EXIT_INTERNAL_ERROR))?;
            Err(ExitCode::from(exit_status_for(&error)))
        }
    }
}

fn emit_help(text: &str) -> Result<(), ExitCode> {
    write_stdout_text(text).map_err(|_| ExitCode::from(EXIT_INTERNAL_ERROR))
}

/// Help and version requests succeed; every other clap error becomes an
/// `invalid_argument` failure in the requested output mode.
fn handle_parse_error(err: &clap::Error, argv: &[String]) -> Result<ExitCode, ExitCode> {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let bare_help = argv.len() == 2 && matches!(argv[1].as_str(), "--help" | "-h");
            if bare_help {
                emit_help(TOP_LEVEL_HELP)?;
            } else {
                emit_help(&err.to_string())?;
            }
            Ok(ExitCode::SUCCESS)
        }
        kind => {
            let hint = match kind {
                ErrorKind::MissingRequiredArgument
                | ErrorKind::InvalidValue
                | ErrorKind::ValueValidation
                | ErrorKind::WrongNumberOfValues
                | ErrorKind::UnknownArgument
                | ErrorKind::InvalidSubcommand => command_hint(argv),
                _ => None,
            };
            let failure = ClientError::invalid_argument_for_command(
                &clap_message_only(&err.to_string()),
                hint,
            );
            let mode = if argv.iter().skip(1).any(|arg| arg == "--json") {
                output::OutputMode::Json
            } else {
                output::OutputMode::Text
            };
            output::print_failure(&failure, mode).map_err(|_| ExitCode::from(EXIT_INTERNAL_ERROR))?;
            Err(ExitCode::from(EXIT_USER_ERROR))
        }
    }
}

/// Drops clap's trailing usage block; recovery steps carry the guidance.
fn clap_message_only(message: &str) -> String {
    let cut = ["\n\nUsage:", "\nFor more information"]
        .iter()
        .filter_map(|marker| message.find(marker))
        .min()
        .unwrap_or(message.len());
    message[..cut].trim_end().to_string()
}

fn command_hint(argv: &[String]) -> Option<&'static str> {
    let words = argv
        .iter()
        .skip(1)
        .map(String::as_str)
        .filter(|arg| !arg.starts_with('-'))
        .collect::<Vec<&str>>();

    match words.as_slice() {
        ["template", "list", ..] => Some("template list"),
        ["template", "show", ..] => Some("template show"),
        ["template", "sample", ..] => Some("template sample"),
        ["template", ..] => Some("template"),
        ["validate", ..] => Some("validate"),
        ["preview", ..] => Some("preview"),
        ["correct", ..] => Some("correct"),
        _ => None,
    }
}

fn exit_status_for(error: &ClientError) -> u8 {
    if error.code.starts_with("internal_") {
        EXIT_INTERNAL_ERROR
    } else {
        EXIT_USER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use fxdesk_client::{ClientError, SuccessEnvelope};
    use serde_json::json;

    use super::{
        EXIT_INTERNAL_ERROR, EXIT_USER_ERROR, clap_message_only, command_hint, exit_status_for,
    };

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn command_hints_follow_subcommand_paths() {
        assert_eq!(
            command_hint(&args(&["fxdesk", "template", "show", "--json"])),
            Some("template show")
        );
        assert_eq!(
            command_hint(&args(&["fxdesk", "correct", "a.csv", "--set", "x"])),
            Some("correct")
        );
        assert!(command_hint(&args(&["fxdesk", "--bogus"])).is_none());
    }

    #[test]
    fn clap_boilerplate_is_removed() {
        let message = "error: unexpected argument '--x' found\n\nUsage: fxdesk validate";
        assert_eq!(
            clap_message_only(message),
            "error: unexpected argument '--x' found"
        );
        let hinted = "error: invalid value\nFor more information, try '--help'.";
        assert_eq!(clap_message_only(hinted), "error: invalid value");
    }

    #[test]
    fn only_validate_and_correct_exit_non_zero_on_file_errors() {
        let envelope = |command: &str, status: &str| SuccessEnvelope {
            ok: true,
            command: command.to_string(),
            version: "0.1.0".to_string(),
            data: json!({"file": {"status": status}}),
        };
        assert!(envelope("validate", "error").left_file_in_error());
        assert!(envelope("correct", "error").left_file_in_error());
        assert!(!envelope("validate", "success").left_file_in_error());
        assert!(!envelope("preview", "error").left_file_in_error());
    }

    #[test]
    fn internal_codes_are_distinguished() {
        assert_eq!(
            exit_status_for(&ClientError::internal_runtime("boom")),
            EXIT_INTERNAL_ERROR
        );
        assert_eq!(
            exit_status_for(&ClientError::unknown_template("x")),
            EXIT_USER_ERROR
        );
    }
}
