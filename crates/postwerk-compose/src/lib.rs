// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Postwerk compose: turns "send email" requests into native compose actions, hands
// them to the OS chooser and tracks each send until the user returns.

pub mod channel;
pub mod composer;
pub mod pending;
pub mod plugin;
pub mod translate;

pub use channel::{MethodCall, MethodResponse};
pub use composer::{Dispatch, EmailComposer};
pub use pending::{CompletionHandle, PendingSends};
pub use plugin::EmailSenderPlugin;
