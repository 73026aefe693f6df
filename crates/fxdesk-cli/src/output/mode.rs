use crate::cli::{Commands, TemplateCommand};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Validate { json, .. }
        | Commands::Preview { json, .. }
        | Commands::Correct { json, .. } => *json,
        Commands::Template { command } => match command {
            TemplateCommand::List { json }
            | TemplateCommand::Show { json, .. }
            | TemplateCommand::Sample { json, .. } => *json,
        },
    };
    if json {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}
