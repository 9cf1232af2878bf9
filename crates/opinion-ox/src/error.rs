use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpinionError {
    /// Reference-case file could not be read
    #[error("cannot read reference cases from {}: {source}", path.display())]
    ReferenceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reference-case file is not a JSON array of cases
    #[error("invalid reference cases in {}: {source}", path.display())]
    ReferenceFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Image reference is neither a usable URL nor a readable local file
    #[error("unusable image reference {reference:?}: {reason}")]
    InvalidImage { reference: String, reason: String },
}
