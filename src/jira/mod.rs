pub mod create;
pub mod types;

pub use create::JiraClient;
pub use types::{adf_document, CreatedIssue, OptionRef};
