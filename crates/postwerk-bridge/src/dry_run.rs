// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dry-run bridge: behaves like a configurable device but only records what
// would have been launched. Used by the preview tool and by tests.

use std::sync::Mutex;

use postwerk_core::error::{ComposerError, Result};
use postwerk_core::types::{ChooserRequest, ContentUri};

use crate::traits::*;

/// A recorded `uri_for_file` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFile {
    pub authority: String,
    pub path: String,
}

/// In-memory bridge that never touches a real OS.
///
/// File references are built the way a file provider with a `root-path`
/// entry named `root` builds them: `content://<authority>/root/<abs path>`.
pub struct DryRunBridge {
    sdk_int: u32,
    package_name: String,
    handler_available: bool,
    launch_error: Option<String>,
    shared: Mutex<Vec<SharedFile>>,
    launched: Mutex<Vec<ChooserRequest>>,
}

impl DryRunBridge {
    /// A device at `sdk_int` with an email app installed.
    pub fn new(sdk_int: u32) -> Self {
        Self {
            sdk_int,
            package_name: "org.hyperpolymath.postwerk".into(),
            handler_available: true,
            launch_error: None,
            shared: Mutex::new(Vec::new()),
            launched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    /// Simulate a device with no email app installed.
    pub fn without_handler(mut self) -> Self {
        self.handler_available = false;
        self
    }

    /// Make `start_chooser` fail with a bridge error.
    pub fn failing_launch(mut self, message: impl Into<String>) -> Self {
        self.launch_error = Some(message.into());
        self
    }

    /// Choosers launched so far, oldest first.
    pub fn launched(&self) -> Vec<ChooserRequest> {
        self.launched
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    /// Files shared through the provider so far, oldest first.
    pub fn shared_files(&self) -> Vec<SharedFile> {
        self.shared
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl PlatformBridge for DryRunBridge {
    fn platform_name(&self) -> &str {
        "Dry run"
    }
}

impl NativeDeviceInfo for DryRunBridge {
    fn sdk_int(&self) -> Result<u32> {
        Ok(self.sdk_int)
    }

    fn package_name(&self) -> Result<String> {
        Ok(self.package_name.clone())
    }
}

impl NativeFileSharing for DryRunBridge {
    fn uri_for_file(&self, authority: &str, path: &str) -> Result<ContentUri> {
        // Same failure a real provider reports for paths outside its roots.
        if !path.starts_with('/') {
            return Err(ComposerError::Bridge(format!(
                "Failed to find configured root that contains {path}"
            )));
        }
        if let Ok(mut shared) = self.shared.lock() {
            shared.push(SharedFile {
                authority: authority.to_string(),
                path: path.to_string(),
            });
        }
        Ok(ContentUri(format!("content://{authority}/root{path}")))
    }
}

impl NativeEmailChooser for DryRunBridge {
    fn resolves(&self, _chooser: &ChooserRequest) -> Result<bool> {
        Ok(self.handler_available)
    }

    fn start_chooser(&self, chooser: &ChooserRequest) -> Result<()> {
        if let Some(message) = &self.launch_error {
            return Err(ComposerError::Bridge(message.clone()));
        }
        tracing::info!(
            request_code = chooser.request_code,
            action = chooser.action.intent_action(),
            attachments = chooser.action.attachments.len(),
            "dry run: chooser recorded"
        );
        if let Ok(mut launched) = self.launched.lock() {
            launched.push(chooser.clone());
        }
        Ok(())
    }
}
