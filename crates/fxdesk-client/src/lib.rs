pub mod commands;
pub mod contracts;
pub mod dates;
pub mod error;
pub mod ingest;
pub mod preview;
pub mod reads;
pub mod rules;
pub mod session;
pub mod settings;
pub mod templates;
pub mod tokenize;

pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
