//! Upload configuration.

use serde::{Deserialize, Serialize};

/// Multipart upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum request body size in bytes (default 5 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Multipart field names accepted as files. Empty accepts any file field.
    #[serde(default = "default_field_names")]
    pub field_names: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size_bytes: default_max_upload(),
            field_names: default_field_names(),
        }
    }
}

impl UploadConfig {
    /// Whether a multipart field with this name carries uploaded files.
    pub fn accepts_field(&self, name: &str) -> bool {
        self.field_names.is_empty() || self.field_names.iter().any(|f| f == name)
    }
}

fn default_max_upload() -> u64 {
    5_368_709_120 // 5 GB
}

fn default_field_names() -> Vec<String> {
    vec!["files".to_string()]
}
