//! Request and response shapes exchanged with the in-pod API.

mod error;
mod files;
mod run;

pub use error::FileRequestError;
pub use files::{FileOperation, FileRequest, RelayResponse, RequestMethod};
pub use run::{ModelConfig, RunAcknowledgement, RunRequest};
