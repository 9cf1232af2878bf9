use std::fmt;

use serde::{Deserialize, Serialize};

/// Models served by the DashScope compatible-mode endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Model {
    /// Qwen3 235B MoE; the default text model
    Qwen3_235bA22b,
    /// Qwen vision-language model; the default for image description
    QwenVlMaxLatest,
    /// Custom model (for models not in this enum)
    Custom(String),
}

impl Model {
    /// Get the string representation of the model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Qwen3_235bA22b => "qwen3-235b-a22b",
            Model::QwenVlMaxLatest => "qwen-vl-max-latest",
            Model::Custom(s) => s,
        }
    }

    /// Whether the model accepts `image_url` content parts
    pub fn supports_vision(&self) -> bool {
        match self {
            Model::QwenVlMaxLatest => true,
            Model::Custom(s) => s.contains("-vl-"),
            Model::Qwen3_235bA22b => false,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Model {
    fn from(s: String) -> Self {
        match s.as_str() {
            "qwen3-235b-a22b" => Model::Qwen3_235bA22b,
            "qwen-vl-max-latest" => Model::QwenVlMaxLatest,
            _ => Model::Custom(s),
        }
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        Model::from(s.to_string())
    }
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        match model {
            Model::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_string_conversion() {
        let model: Model = "qwen-vl-max-latest".into();
        assert_eq!(model, Model::QwenVlMaxLatest);
        assert_eq!(model.to_string(), "qwen-vl-max-latest");
        assert!(model.supports_vision());
    }

    #[test]
    fn test_model_custom() {
        let model: Model = "qwen-plus".into();
        assert!(matches!(model, Model::Custom(ref s) if s == "qwen-plus"));
        assert_eq!(model.as_str(), "qwen-plus");
        assert!(!model.supports_vision());
    }

    #[test]
    fn test_model_serde_as_plain_string() {
        let json = serde_json::to_string(&Model::Qwen3_235bA22b).unwrap();
        assert_eq!(json, "\"qwen3-235b-a22b\"");
        let back: Model = serde_json::from_str("\"qwen2.5-vl-72b\"").unwrap();
        assert_eq!(back, Model::Custom("qwen2.5-vl-72b".to_string()));
    }
}
