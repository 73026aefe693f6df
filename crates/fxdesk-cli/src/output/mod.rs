mod correct_text;
mod error_text;
mod format;
mod json;
mod mode;
mod preview_text;
mod template_text;
mod upload_shared;
mod validate_text;

use std::io;

use fxdesk_client::contracts::envelope::CommandName;
use fxdesk_client::{ClientError, SuccessEnvelope};

use crate::stdout_io::write_stdout_line;

pub use mode::{OutputMode, mode_for_command};

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    let Some(command) = success.command_name() else {
        return Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        )));
    };
    match command {
        CommandName::Validate => validate_text::render_validate(&success.data),
        CommandName::Preview => preview_text::render_preview(&success.data),
        CommandName::Correct => correct_text::render_correct(&success.data),
        CommandName::TemplateList => template_text::render_template_list(&success.data),
        CommandName::TemplateShow => template_text::render_template_show(&success.data),
        CommandName::TemplateSample => template_text::render_template_sample(&success.data),
    }
}
