mod channel;
mod error;
mod http_channel;
mod orchestrator;
pub mod selection;
mod tracker;
mod types;
mod validation;

pub use channel::FileTransferChannel;
pub use error::UploadError;
pub use http_channel::HttpChannel;
pub use orchestrator::BatchUploader;
pub use tracker::CompletionPolicy;
pub use types::{BatchEvent, BatchReport, FileDescriptor, FileUploadStatus};
pub use validation::{ValidationRules, DEFAULT_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};

#[cfg(test)]
pub use types::FileFailure;
