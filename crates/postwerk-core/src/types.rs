// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Postwerk email composer bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Intent action for composing to an address without attachments.
pub const ACTION_SENDTO: &str = "android.intent.action.SENDTO";
/// Intent action for sending several streams at once.
pub const ACTION_SEND_MULTIPLE: &str = "android.intent.action.SEND_MULTIPLE";
/// Data URI used by the attachment-free action.
pub const MAILTO_URI: &str = "mailto:";
/// MIME type declared when attachments are present.
pub const ATTACHMENT_MIME_TYPE: &str = "text/plain";

/// A request to open the native email composer, as received from the
/// application layer.
///
/// Field names on the wire follow the method-channel argument keys. Absent
/// list fields stay `None` so they are left off the action entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_html: bool,
    #[serde(default)]
    pub recipients: Option<Vec<String>>,
    #[serde(default)]
    pub cc: Option<Vec<String>>,
    #[serde(default)]
    pub bcc: Option<Vec<String>>,
    /// Local file-system paths, shared through the app's file provider.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachment_paths: Vec<String>,
    /// Pre-resolved content references, used verbatim.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_uri_paths: Vec<String>,
    /// Force `content_uri_paths` regardless of OS version.
    #[serde(
        rename = "usb_mass_storage",
        default,
        deserialize_with = "null_as_default"
    )]
    pub force_content_uri: bool,
}

/// Treat an explicit JSON `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Opaque, permission-scoped reference to a file (`content://...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentUri(pub String);

impl ContentUri {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ContentUri {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which native action the composer launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// `SENDTO mailto:` with no stream payload.
    Simple,
    /// `SEND_MULTIPLE` carrying every attachment as a stream.
    WithAttachments,
}

impl ActionKind {
    pub fn for_attachment_count(count: usize) -> Self {
        if count == 0 {
            Self::Simple
        } else {
            Self::WithAttachments
        }
    }

    /// Android intent action string.
    pub fn intent_action(&self) -> &'static str {
        match self {
            Self::Simple => ACTION_SENDTO,
            Self::WithAttachments => ACTION_SEND_MULTIPLE,
        }
    }
}

/// Platform-neutral description of the compose intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeAction {
    pub kind: ActionKind,
    pub attachments: Vec<ContentUri>,
    pub subject: Option<String>,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub recipients: Option<Vec<String>>,
    pub cc: Option<Vec<String>>,
    pub bcc: Option<Vec<String>>,
}

impl ComposeAction {
    pub fn intent_action(&self) -> &'static str {
        self.kind.intent_action()
    }

    /// `mailto:` for the simple action; attachment sends carry no data URI.
    pub fn data_uri(&self) -> Option<&'static str> {
        match self.kind {
            ActionKind::Simple => Some(MAILTO_URI),
            ActionKind::WithAttachments => None,
        }
    }

    pub fn mime_type(&self) -> Option<&'static str> {
        match self.kind {
            ActionKind::Simple => None,
            ActionKind::WithAttachments => Some(ATTACHMENT_MIME_TYPE),
        }
    }

    /// Whether the receiving app must be granted read access to the streams.
    pub fn grants_read_permission(&self) -> bool {
        self.kind == ActionKind::WithAttachments
    }
}

/// A compose action wrapped in the OS chooser, ready to launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChooserRequest {
    pub action: ComposeAction,
    pub title: String,
    /// Echoed back by the OS when the user returns.
    pub request_code: i32,
}

/// Correlates one handed-off send with its eventual completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTag {
    pub id: Uuid,
    pub request_code: i32,
    pub issued_at: DateTime<Utc>,
}

impl RequestTag {
    pub fn new(request_code: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_code,
            issued_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for RequestTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.id, self.request_code)
    }
}

/// Result of a single `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The chooser was launched; completion arrives later.
    HandedOff(RequestTag),
    /// No installed app can handle the compose action.
    NoHandlerAvailable,
    /// No foreground context to launch from.
    PreconditionFailed,
}

/// Signal that the user came back from the chosen email app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    Returned { result_code: i32 },
}

/// How pending completions are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTracking {
    /// Every send gets its own request code and completion.
    #[default]
    Correlated,
    /// One outstanding send at a time; a new send supersedes the old one.
    SingleSlot,
}

/// What to do when attachments arrive in the list the active strategy
/// does not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentContract {
    /// Log a warning and send without attachments.
    #[default]
    Warn,
    /// Reject the request.
    Strict,
}
