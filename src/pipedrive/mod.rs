pub mod fetch;
pub mod types;

pub use fetch::PipedriveClient;
pub use types::{record_id, Deal, FileDescriptor, Organization};
