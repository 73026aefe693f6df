use serde::Serialize;
use serde_json::Value;

use crate::API_VERSION;
use crate::error::{ClientError, ClientResult};

/// Every command the client answers, under the name its envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    Validate,
    Preview,
    Correct,
    TemplateList,
    TemplateShow,
    TemplateSample,
}

impl CommandName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Preview => "preview",
            Self::Correct => "correct",
            Self::TemplateList => "template list",
            Self::TemplateShow => "template show",
            Self::TemplateSample => "template sample",
        }
    }

    /// Commands whose outcome is decided by the uploaded file's final status.
    pub const fn gates_on_file_status(self) -> bool {
        matches!(self, Self::Validate | Self::Correct)
    }

    pub fn parse(name: &str) -> Option<Self> {
        [
            Self::Validate,
            Self::Preview,
            Self::Correct,
            Self::TemplateList,
            Self::TemplateShow,
            Self::TemplateSample,
        ]
        .into_iter()
        .find(|command| command.as_str() == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub command: String,
    pub version: String,
    pub data: Value,
}

impl SuccessEnvelope {
    pub fn command_name(&self) -> Option<CommandName> {
        CommandName::parse(&self.command)
    }

    /// `data.file.status` for payloads that describe one uploaded file.
    pub fn file_status(&self) -> Option<&str> {
        self.data.get("file")?.get("status")?.as_str()
    }

    /// A file-gated command whose file still ended in `error`.
    pub fn left_file_in_error(&self) -> bool {
        self.command_name()
            .is_some_and(CommandName::gates_on_file_status)
            && self.file_status() == Some("error")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    pub ok: bool,
    pub error: ErrorContract,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorContract {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
}

impl From<&ClientError> for FailureEnvelope {
    fn from(error: &ClientError) -> Self {
        Self {
            ok: false,
            error: ErrorContract {
                code: error.code.clone(),
                message: error.message.clone(),
                recovery_steps: error.recovery_steps.clone(),
            },
            data: error.data.clone(),
        }
    }
}

pub(crate) fn success<T>(command: CommandName, data: T) -> ClientResult<SuccessEnvelope>
where
    T: Serialize,
{
    let data = serde_json::to_value(data)
        .map_err(|err| ClientError::internal_serialization(&err.to_string()))?;
    Ok(SuccessEnvelope {
        ok: true,
        command: command.as_str().to_string(),
        version: API_VERSION.to_string(),
        data,
    })
}
