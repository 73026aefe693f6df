use crate::commands::common::load_template;
use crate::contracts::envelope::{CommandName, SuccessEnvelope, success};
use crate::contracts::types::{TemplateData, TemplateListData, TemplateListItem, TemplateSampleData};
use crate::templates::TemplateRegistry;
use crate::ClientResult;

pub fn list() -> ClientResult<SuccessEnvelope> {
    let registry = TemplateRegistry::builtin()?;
    let templates = registry
        .iter()
        .map(|template| TemplateListItem {
            id: template.id.to_string(),
            title: template.title.clone(),
            column_count: template.columns.len(),
        })
        .collect();
    success(CommandName::TemplateList, TemplateListData { templates })
}

pub fn show(slug: &str) -> ClientResult<SuccessEnvelope> {
    let template = load_template(slug)?;
    success(
        CommandName::TemplateShow,
        TemplateData {
            id: template.id.to_string(),
            title: template.title.clone(),
            columns: template.columns.clone(),
            required_headers: template.config.required_headers.clone(),
            required_fields: template.config.required_fields.clone(),
            numeric_fields: template.config.numeric_fields.clone(),
            sample_rows: template.sample_rows.clone(),
        },
    )
}

pub fn sample(slug: &str) -> ClientResult<SuccessEnvelope> {
    let template = load_template(slug)?;
    success(
        CommandName::TemplateSample,
        TemplateSampleData {
            id: template.id.to_string(),
            file_name: template.sample_file_name(),
            csv: template.sample_csv()?,
        },
    )
}
