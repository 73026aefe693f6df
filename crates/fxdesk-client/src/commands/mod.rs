pub mod common;
pub mod correct;
pub mod preview;
pub mod templates;
pub mod validate;
