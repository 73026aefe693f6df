use crate::commands::common::{add_path, block_on, load_template};
use crate::contracts::envelope::{CommandName, SuccessEnvelope, success};
use crate::contracts::types::ValidateData;
use crate::session::UploadSession;
use crate::settings::{Settings, SettingsOverrides};
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct ValidateOptions {
    pub path: String,
    pub template: String,
}

pub fn run(path: &str, template: &str) -> ClientResult<SuccessEnvelope> {
    run_with_options(ValidateOptions {
        path: path.to_string(),
        template: template.to_string(),
    })
}

/// Ingests one file. A file that validates with errors is still a successful
/// command; the outcome lives in `file.status`.
pub fn run_with_options(options: ValidateOptions) -> ClientResult<SuccessEnvelope> {
    let template = load_template(&options.template)?;
    let settings = Settings::resolve(SettingsOverrides::default())?;
    let mut session = UploadSession::new(template.config.clone(), settings);
    let file_id = add_path(&mut session, &options.path)?;

    block_on(session.ingest(&file_id))??;

    let file = session
        .file(&file_id)
        .ok_or_else(|| ClientError::file_not_found(file_id.as_str()))?;
    success(
        CommandName::Validate,
        ValidateData {
            template: template.id.to_string(),
            file: file.summary(),
            validation_errors: file.validation_errors().to_vec(),
        },
    )
}
