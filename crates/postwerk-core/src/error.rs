// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Postwerk.

use thiserror::Error;

/// Top-level error type for all Postwerk operations.
#[derive(Debug, Error)]
pub enum ComposerError {
    // -- Preconditions --
    #[error("no foreground activity attached")]
    NoForegroundContext,

    #[error(
        "attachments were supplied in `{supplied}` but the active strategy reads `{expected}`"
    )]
    AttachmentMismatch {
        expected: &'static str,
        supplied: &'static str,
    },

    #[error("invalid method arguments: {0}")]
    InvalidArguments(String),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Pending completions --
    #[error("email client did not return before the completion timeout")]
    CompletionTimedOut,

    #[error("pending send was cancelled")]
    Cancelled,

    #[error("pending send was superseded by a newer request")]
    Superseded,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ComposerError {
    /// Error code reported on the method channel.
    ///
    /// `error` and `not_available` are the codes existing callers already
    /// match on; the rest only appear with the newer completion tracking.
    pub fn channel_code(&self) -> &'static str {
        match self {
            Self::NoForegroundContext | Self::InvalidArguments(_) => "error",
            Self::AttachmentMismatch { .. } => "attachment_mismatch",
            Self::Bridge(_) | Self::Io(_) | Self::Serialization(_) => "bridge_error",
            Self::PlatformUnavailable => "not_available",
            Self::CompletionTimedOut => "timeout",
            Self::Cancelled => "cancelled",
            Self::Superseded => "superseded",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ComposerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_codes_are_stable() {
        assert_eq!(ComposerError::NoForegroundContext.channel_code(), "error");
        assert_eq!(ComposerError::PlatformUnavailable.channel_code(), "not_available");
    }

    #[test]
    fn mismatch_message_names_both_fields() {
        let err = ComposerError::AttachmentMismatch {
            expected: "content_uri_paths",
            supplied: "attachment_paths",
        };
        let msg = err.to_string();
        assert!(msg.contains("content_uri_paths"));
        assert!(msg.contains("attachment_paths"));
        assert_eq!(err.channel_code(), "attachment_mismatch");
    }

    #[test]
    fn io_errors_convert() {
        let err: ComposerError = std::io::Error::other("disk").into();
        assert_eq!(err.channel_code(), "bridge_error");
    }
}
