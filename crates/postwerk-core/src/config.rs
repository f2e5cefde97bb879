// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composer configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{AttachmentContract, CompletionTracking};

/// Settings for translating and launching compose requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposerConfig {
    /// Lowest SDK level that reads `content_uri_paths` instead of deriving
    /// references from `attachment_paths` (Android 11 = 30).
    pub content_uri_min_sdk: u32,
    /// Appended to the package name to form the file-provider authority.
    pub file_provider_suffix: String,
    /// Title shown on the app chooser.
    pub chooser_title: String,
    /// First request code handed to `startActivityForResult`.
    pub request_code_base: i32,
    /// How long a handed-off send may wait for the user to return.
    /// `None` waits forever.
    pub completion_timeout_secs: Option<u64>,
    pub tracking: CompletionTracking,
    pub attachment_contract: AttachmentContract,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            content_uri_min_sdk: 30,
            file_provider_suffix: ".file_provider".into(),
            chooser_title: "Select Email app".into(),
            request_code_base: 607,
            completion_timeout_secs: Some(30 * 60),
            tracking: CompletionTracking::Correlated,
            attachment_contract: AttachmentContract::Warn,
        }
    }
}

impl ComposerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_secs.map(Duration::from_secs)
    }

    /// File-provider authority for the given application package.
    pub fn authority_for(&self, package_name: &str) -> String {
        format!("{package_name}{}", self.file_provider_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_platform_conventions() {
        let cfg = ComposerConfig::default();
        assert_eq!(cfg.content_uri_min_sdk, 30);
        assert_eq!(cfg.request_code_base, 607);
        assert_eq!(cfg.authority_for("com.example.app"), "com.example.app.file_provider");
        assert_eq!(cfg.completion_timeout(), Some(Duration::from_secs(1800)));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ComposerConfig::from_json_str(
            r#"{ "content_uri_min_sdk": 29, "tracking": "single_slot" }"#,
        )
        .unwrap();
        assert_eq!(cfg.content_uri_min_sdk, 29);
        assert_eq!(cfg.tracking, CompletionTracking::SingleSlot);
        assert_eq!(cfg.chooser_title, "Select Email app");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ComposerConfig::from_json_str(r#"{ "sdk": 30 }"#).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "attachment_contract": "strict", "completion_timeout_secs": null }}"#
        )
        .unwrap();

        let cfg = ComposerConfig::load(file.path()).unwrap();
        assert_eq!(cfg.attachment_contract, AttachmentContract::Strict);
        assert_eq!(cfg.completion_timeout(), None);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ComposerConfig::load("/nonexistent/postwerk.json").unwrap_err();
        assert!(matches!(err, crate::ComposerError::Io(_)));
    }
}
