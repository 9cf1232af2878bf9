use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OpinionError;

/// One labelled example shown to the model before the text under review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCase {
    #[serde(rename = "示例输入", default)]
    pub input: Option<String>,
    #[serde(rename = "结论", default)]
    pub conclusion: Option<String>,
    #[serde(rename = "原因", default)]
    pub reason: Option<String>,
}

impl ReferenceCase {
    pub fn new(
        input: impl Into<String>,
        conclusion: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            input: Some(input.into()),
            conclusion: Some(conclusion.into()),
            reason: Some(reason.into()),
        }
    }
}

/// Load the reference cases from a JSON array file
pub fn load_reference_cases(path: impl AsRef<Path>) -> Result<Vec<ReferenceCase>, OpinionError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| OpinionError::ReferenceFile {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| OpinionError::ReferenceFormat {
        path: path.to_path_buf(),
        source,
    })
}
