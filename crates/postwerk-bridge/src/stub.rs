// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where native mobile APIs are unavailable.
//
// Every trait method returns `PlatformUnavailable`; the real implementation
// lives in the `android` module.

use postwerk_core::error::{ComposerError, Result};
use postwerk_core::types::{ChooserRequest, ContentUri};

use crate::traits::*;

/// No-op bridge returned on non-mobile platforms.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeDeviceInfo for StubBridge {
    fn sdk_int(&self) -> Result<u32> {
        Err(ComposerError::PlatformUnavailable)
    }

    fn package_name(&self) -> Result<String> {
        Err(ComposerError::PlatformUnavailable)
    }
}

impl NativeFileSharing for StubBridge {
    fn uri_for_file(&self, _authority: &str, _path: &str) -> Result<ContentUri> {
        tracing::warn!("NativeFileSharing::uri_for_file called on stub bridge");
        Err(ComposerError::PlatformUnavailable)
    }
}

impl NativeEmailChooser for StubBridge {
    fn resolves(&self, _chooser: &ChooserRequest) -> Result<bool> {
        tracing::warn!("NativeEmailChooser::resolves called on stub bridge");
        Err(ComposerError::PlatformUnavailable)
    }

    fn start_chooser(&self, _chooser: &ChooserRequest) -> Result<()> {
        tracing::warn!("NativeEmailChooser::start_chooser called on stub bridge");
        Err(ComposerError::PlatformUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_call_is_unavailable() {
        let stub = StubBridge;
        assert!(matches!(stub.sdk_int(), Err(ComposerError::PlatformUnavailable)));
        assert!(matches!(
            stub.uri_for_file("a.file_provider", "/tmp/x"),
            Err(ComposerError::PlatformUnavailable)
        ));
    }

    #[test]
    fn platform_bridge_falls_back_to_stub() {
        let bridge = crate::platform_bridge().expect("desktop always has a bridge");
        assert_eq!(bridge.platform_name(), "Desktop (stub)");
    }
}
