use crate::commands::common::{add_path, block_on, load_template};
use crate::contracts::envelope::{CommandName, SuccessEnvelope, success};
use crate::contracts::types::PreviewData;
use crate::preview::{RowWindow, ToggleOutcome};
use crate::session::UploadSession;
use crate::settings::{Settings, SettingsOverrides};
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct PreviewOptions {
    pub path: String,
    pub template: String,
    pub offset_px: u64,
    pub settings: SettingsOverrides,
}

pub fn run(path: &str, template: &str, offset_px: u64) -> ClientResult<SuccessEnvelope> {
    run_with_options(PreviewOptions {
        path: path.to_string(),
        template: template.to_string(),
        offset_px,
        settings: SettingsOverrides::default(),
    })
}

pub fn run_with_options(options: PreviewOptions) -> ClientResult<SuccessEnvelope> {
    let template = load_template(&options.template)?;
    let settings = Settings::resolve(options.settings)?;
    let mut session = UploadSession::new(template.config.clone(), settings);
    let file_id = add_path(&mut session, &options.path)?;

    let outcome = block_on(async {
        session.ingest(&file_id).await?;
        session.toggle_preview(&file_id).await
    })??;
    let ToggleOutcome::Opened(opened) = outcome else {
        return Err(ClientError::preview_not_open(file_id.as_str()));
    };

    let state = opened.state;
    let window = RowWindow::compute(state.row_count(), options.offset_px, &settings);
    let file = session
        .file(&file_id)
        .ok_or_else(|| ClientError::file_not_found(file_id.as_str()))?;

    success(
        CommandName::Preview,
        PreviewData {
            template: template.id.to_string(),
            file: file.summary(),
            headers: state.headers().to_vec(),
            total_rows: state.row_count(),
            virtualized: state.is_virtualized(&settings),
            window_start: window.start,
            window_end: window.end,
            rows: state.window_rows(&window),
            advisory: opened.advisory.map(|advisory| advisory.to_notice()),
            validation_errors: state
                .mapped_errors()
                .iter()
                .map(|mapped| mapped.to_contract())
                .collect(),
        },
    )
}
