// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Email composer: translate a request, hand it to the OS chooser, and track
// the send until the user comes back.

use tracing::{info, instrument, warn};

use postwerk_bridge::traits::PlatformBridge;
use postwerk_core::config::ComposerConfig;
use postwerk_core::error::{ComposerError, Result};
use postwerk_core::types::{ChooserRequest, Completion, ComposeAction, SendOutcome, SendRequest};

use crate::pending::{CompletionHandle, PendingSends};
use crate::translate;

/// What happened to one send, plus the handle to await if it was handed off.
#[derive(Debug)]
pub struct Dispatch {
    pub outcome: SendOutcome,
    /// Present only for `SendOutcome::HandedOff`.
    pub completion: Option<CompletionHandle>,
}

impl Dispatch {
    fn without_handoff(outcome: SendOutcome) -> Self {
        Self {
            outcome,
            completion: None,
        }
    }
}

/// Stateless apart from the pending-completion registry.
pub struct EmailComposer {
    config: ComposerConfig,
    pending: PendingSends,
}

impl EmailComposer {
    pub fn new(config: ComposerConfig) -> Self {
        let pending = PendingSends::from_config(&config);
        Self { config, pending }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn pending(&self) -> &PendingSends {
        &self.pending
    }

    /// See [`translate::translate`].
    pub fn translate(
        &self,
        ctx: Option<&dyn PlatformBridge>,
        request: &SendRequest,
    ) -> Result<ComposeAction> {
        translate::translate(request, ctx, &self.config)
    }

    /// Launch `action` through the chooser.
    ///
    /// Nothing is launched when there is no context or no app can handle
    /// the action. Platform errors are returned as-is; no retry.
    pub fn send(&self, ctx: Option<&dyn PlatformBridge>, action: ComposeAction) -> Result<Dispatch> {
        let Some(ctx) = ctx else {
            return Ok(Dispatch::without_handoff(SendOutcome::PreconditionFailed));
        };

        let (tag, handle) = self.pending.register()?;
        let chooser = ChooserRequest {
            action,
            title: self.config.chooser_title.clone(),
            request_code: tag.request_code,
        };

        match ctx.resolves(&chooser) {
            Ok(true) => {}
            Ok(false) => {
                self.pending.discard(tag.request_code);
                warn!(platform = ctx.platform_name(), "no email client can handle the compose action");
                return Ok(Dispatch::without_handoff(SendOutcome::NoHandlerAvailable));
            }
            Err(e) => {
                self.pending.discard(tag.request_code);
                return Err(e);
            }
        }

        if let Err(e) = ctx.start_chooser(&chooser) {
            self.pending.discard(tag.request_code);
            return Err(e);
        }

        info!(
            tag = %tag,
            action = chooser.action.intent_action(),
            attachments = chooser.action.attachments.len(),
            "handed off to email chooser"
        );
        Ok(Dispatch {
            outcome: SendOutcome::HandedOff(tag),
            completion: Some(handle),
        })
    }

    /// Translate and send in one step.
    #[instrument(skip_all, fields(html = request.is_html))]
    pub fn compose(&self, ctx: Option<&dyn PlatformBridge>, request: &SendRequest) -> Result<Dispatch> {
        match self.translate(ctx, request) {
            Ok(action) => self.send(ctx, action),
            Err(ComposerError::NoForegroundContext) => {
                warn!("send requested with no foreground activity");
                Ok(Dispatch::without_handoff(SendOutcome::PreconditionFailed))
            }
            Err(e) => Err(e),
        }
    }

    /// Await a handed-off send, bounded by the configured timeout.
    ///
    /// A timed-out send is removed from the registry so a late result for
    /// its request code is ignored.
    pub async fn await_completion(&self, handle: CompletionHandle) -> Result<Completion> {
        let id = handle.tag().id;
        let result = handle.wait(self.config.completion_timeout()).await;
        if let Err(ComposerError::CompletionTimedOut) = &result {
            self.pending.forget(id);
        }
        result
    }
}
