use fxdesk_client::commands;
use fxdesk_client::commands::correct::CorrectOptions;
use fxdesk_client::commands::preview::PreviewOptions;
use fxdesk_client::settings::SettingsOverrides;
use fxdesk_client::{ClientResult, SuccessEnvelope};

use crate::cli::{Cli, Commands, TemplateCommand};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Validate { path, template, .. } => commands::validate::run(path, template),
        Commands::Preview {
            path,
            template,
            offset_px,
            threshold,
            ..
        } => commands::preview::run_with_options(PreviewOptions {
            path: path.clone(),
            template: template.clone(),
            offset_px: *offset_px,
            settings: SettingsOverrides {
                virtualization_threshold: *threshold,
                ..SettingsOverrides::default()
            },
        }),
        Commands::Correct {
            path,
            template,
            remove_rows,
            assignments,
            output,
            ..
        } => commands::correct::run_with_options(CorrectOptions {
            path: path.clone(),
            template: template.clone(),
            remove_rows: remove_rows.clone(),
            assignments: assignments.clone(),
            output: output.clone(),
        }),
        Commands::Template { command } => match command {
            TemplateCommand::List { .. } => commands::templates::list(),
            TemplateCommand::Show { id, .. } => commands::templates::show(id),
            TemplateCommand::Sample { id, .. } => commands::templates::sample(id),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::parse_from;

    use super::dispatch;

    #[test]
    fn dispatches_to_expected_command_names() {
        let cases: [(&[&str], &str); 3] = [
            (&["fxdesk", "template", "list"], "template list"),
            (&["fxdesk", "template", "show", "debtor"], "template show"),
            (&["fxdesk", "template", "sample", "creditor"], "template sample"),
        ];

        for (args, expected_command) in cases {
            let parsed = parse_from(args);
            assert!(parsed.is_ok());
            if let Ok(cli) = parsed {
                let response = dispatch(&cli);
                assert!(response.is_ok());
                if let Ok(success) = response {
                    assert_eq!(success.command, expected_command);
                }
            }
        }
    }

    #[test]
    fn missing_files_surface_as_client_errors() {
        let parsed = parse_from([
            "fxdesk",
            "validate",
            "/no/such/file.csv",
            "--template",
            "vendor_payables",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            let response = dispatch(&cli);
            assert!(response.is_err());
            if let Err(error) = response {
                assert_eq!(error.code, "file_read_failed");
            }
        }
    }
}
