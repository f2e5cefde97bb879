// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-runtime plugin.
//
// Tracks which Activity (if any) is attached, dispatches method-channel calls
// to the composer, and routes `onActivityResult` back to pending sends. The
// attached bridge is passed into each compose call; the composer itself
// holds no reference to it.

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use postwerk_bridge::traits::PlatformBridge;
use postwerk_core::config::ComposerConfig;
use postwerk_core::error::ComposerError;
use postwerk_core::types::{SendOutcome, SendRequest};

use crate::channel::{METHOD_SEND, MethodCall, MethodResponse};
use crate::composer::EmailComposer;

/// Email-sender plugin instance, one per engine.
pub struct EmailSenderPlugin {
    composer: EmailComposer,
    activity: RwLock<Option<Arc<dyn PlatformBridge>>>,
}

impl EmailSenderPlugin {
    pub fn new(config: ComposerConfig) -> Self {
        Self {
            composer: EmailComposer::new(config),
            activity: RwLock::new(None),
        }
    }

    pub fn composer(&self) -> &EmailComposer {
        &self.composer
    }

    // -- Activity lifecycle --------------------------------------------------

    pub fn attach_to_activity(&self, bridge: Arc<dyn PlatformBridge>) {
        info!(platform = bridge.platform_name(), "attached to activity");
        self.set_activity(Some(bridge));
    }

    /// Attach to whatever the current platform reports as foreground.
    /// Returns `false` if there is nothing to attach to.
    pub fn attach_current_platform(&self) -> bool {
        match postwerk_bridge::platform_bridge() {
            Some(bridge) => {
                self.attach_to_activity(Arc::from(bridge));
                true
            }
            None => false,
        }
    }

    pub fn detach_from_activity_for_config_changes(&self) {
        debug!("detached from activity for configuration change");
        self.set_activity(None);
    }

    pub fn reattach_to_activity_for_config_changes(&self, bridge: Arc<dyn PlatformBridge>) {
        debug!("reattached to activity after configuration change");
        self.set_activity(Some(bridge));
    }

    /// The activity is gone for good, so no result will arrive for sends
    /// still waiting on it. Those resolve as `Cancelled`.
    pub fn detach_from_activity(&self) {
        self.set_activity(None);
        let pending = self.composer.pending();
        let abandoned = pending.outstanding();
        for tag in &abandoned {
            pending.cancel(tag.id);
        }
        info!(abandoned = abandoned.len(), "detached from activity");
    }

    pub fn is_attached(&self) -> bool {
        self.current_activity().is_some()
    }

    // A poisoned slot still holds a valid `Option<Arc<_>>`.
    fn set_activity(&self, bridge: Option<Arc<dyn PlatformBridge>>) {
        let mut slot = self.activity.write().unwrap_or_else(|poisoned| {
            warn!("activity slot lock poisoned; recovering");
            poisoned.into_inner()
        });
        *slot = bridge;
    }

    fn current_activity(&self) -> Option<Arc<dyn PlatformBridge>> {
        let slot = self.activity.read().unwrap_or_else(|poisoned| {
            warn!("activity slot lock poisoned; recovering");
            poisoned.into_inner()
        });
        slot.clone()
    }

    // -- Method channel ------------------------------------------------------

    /// Handle one call. For `send` this resolves when the user returns from
    /// the email app, or earlier on failure.
    pub async fn handle(&self, call: MethodCall) -> MethodResponse {
        match call.method.as_str() {
            METHOD_SEND => self.send(&call).await,
            other => {
                debug!(method = other, "method not implemented");
                MethodResponse::NotImplemented
            }
        }
    }

    async fn send(&self, call: &MethodCall) -> MethodResponse {
        let request: SendRequest = match call.decode_arguments() {
            Ok(request) => request,
            Err(e) => return MethodResponse::from_error(&e),
        };

        let activity = self.current_activity();
        let dispatch = match self.composer.compose(activity.as_deref(), &request) {
            Ok(dispatch) => dispatch,
            Err(e) => return MethodResponse::from_error(&e),
        };

        match (dispatch.outcome, dispatch.completion) {
            (SendOutcome::PreconditionFailed, _) => {
                MethodResponse::from_error(&ComposerError::NoForegroundContext)
            }
            (SendOutcome::NoHandlerAvailable, _) => MethodResponse::no_handler(),
            (SendOutcome::HandedOff(_), Some(handle)) => {
                match self.composer.await_completion(handle).await {
                    Ok(_) => MethodResponse::success(),
                    Err(e) => MethodResponse::from_error(&e),
                }
            }
            (SendOutcome::HandedOff(_), None) => MethodResponse::success(),
        }
    }

    // -- Activity results ----------------------------------------------------

    /// Forward `onActivityResult`. Returns `true` if the request code
    /// belonged to a pending send.
    pub fn on_activity_result(&self, request_code: i32, result_code: i32) -> bool {
        self.composer.pending().complete(request_code, result_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postwerk_bridge::dry_run::DryRunBridge;
    use postwerk_core::types::{ActionKind, CompletionTracking};
    use serde_json::json;

    fn send_call() -> MethodCall {
        MethodCall::new(
            METHOD_SEND,
            json!({
                "subject": "Hello",
                "body": "<b>Hi</b>",
                "is_html": true,
                "recipients": ["a@example.com"],
                "cc": ["b@example.com"],
                "bcc": null,
                "attachment_paths": ["/data/user/0/app/files/a.txt"],
                "content_uri_paths": [],
                "usb_mass_storage": false,
            }),
        )
    }

    fn attached(bridge: &Arc<DryRunBridge>, config: ComposerConfig) -> EmailSenderPlugin {
        let plugin = EmailSenderPlugin::new(config);
        plugin.attach_to_activity(bridge.clone());
        plugin
    }

    async fn wait_for_launches(bridge: &DryRunBridge, count: usize) {
        while bridge.launched().len() < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn unknown_method_is_not_implemented() {
        let plugin = EmailSenderPlugin::new(ComposerConfig::default());
        let response = plugin.handle(MethodCall::new("open", json!({}))).await;
        assert_eq!(response, MethodResponse::NotImplemented);
    }

    #[tokio::test]
    async fn send_without_activity_is_error() {
        let plugin = EmailSenderPlugin::new(ComposerConfig::default());
        let response = plugin.handle(send_call()).await;
        assert_eq!(response.error_code(), Some("error"));
    }

    #[tokio::test]
    async fn detached_plugin_reports_error() {
        let bridge = Arc::new(DryRunBridge::new(29));
        let plugin = attached(&bridge, ComposerConfig::default());
        plugin.detach_from_activity_for_config_changes();
        assert!(!plugin.is_attached());

        let response = plugin.handle(send_call()).await;
        assert_eq!(response.error_code(), Some("error"));
        assert!(bridge.launched().is_empty());
    }

    #[tokio::test]
    async fn no_email_app_is_not_available() {
        let bridge = Arc::new(DryRunBridge::new(29).without_handler());
        let plugin = attached(&bridge, ComposerConfig::default());
        let response = plugin.handle(send_call()).await;
        assert_eq!(response, MethodResponse::no_handler());
        assert!(bridge.launched().is_empty());
    }

    #[tokio::test]
    async fn send_succeeds_after_activity_result() {
        let bridge = Arc::new(DryRunBridge::new(29).with_package_name("com.example"));
        let plugin = attached(&bridge, ComposerConfig::default());

        let (response, ()) = tokio::join!(plugin.handle(send_call()), async {
            wait_for_launches(&bridge, 1).await;
            assert!(plugin.on_activity_result(607, 0));
        });
        assert!(response.is_success());

        let chooser = &bridge.launched()[0];
        assert_eq!(chooser.action.kind, ActionKind::WithAttachments);
        assert_eq!(
            chooser.action.attachments[0].as_str(),
            "content://com.example.file_provider/root/data/user/0/app/files/a.txt"
        );
        assert_eq!(chooser.action.text_body.as_deref(), Some("Hi"));
        assert_eq!(chooser.action.bcc, None);
        assert!(plugin.composer().pending().is_empty());
    }

    #[tokio::test]
    async fn concurrent_sends_each_complete() {
        let bridge = Arc::new(DryRunBridge::new(34));
        let plugin = attached(&bridge, ComposerConfig::default());

        let (first, second, ()) = tokio::join!(
            plugin.handle(send_call()),
            plugin.handle(send_call()),
            async {
                wait_for_launches(&bridge, 2).await;
                assert!(plugin.on_activity_result(608, 0));
                assert!(plugin.on_activity_result(607, 0));
            }
        );
        assert!(first.is_success());
        assert!(second.is_success());
    }

    #[tokio::test]
    async fn single_slot_first_caller_is_superseded() {
        let bridge = Arc::new(DryRunBridge::new(34));
        let config = ComposerConfig {
            tracking: CompletionTracking::SingleSlot,
            ..ComposerConfig::default()
        };
        let plugin = attached(&bridge, config);

        let (first, second, ()) = tokio::join!(
            plugin.handle(send_call()),
            plugin.handle(send_call()),
            async {
                wait_for_launches(&bridge, 2).await;
                assert!(plugin.on_activity_result(607, 0));
                assert!(!plugin.on_activity_result(607, 0));
            }
        );
        assert_eq!(first.error_code(), Some("superseded"));
        assert!(second.is_success());
    }

    #[tokio::test]
    async fn final_detach_cancels_waiting_sends() {
        let bridge = Arc::new(DryRunBridge::new(34));
        let plugin = attached(&bridge, ComposerConfig::default());

        let (response, ()) = tokio::join!(plugin.handle(send_call()), async {
            wait_for_launches(&bridge, 1).await;
            plugin.detach_from_activity();
        });
        assert_eq!(response.error_code(), Some("cancelled"));
        assert!(plugin.composer().pending().is_empty());
        assert!(!plugin.on_activity_result(607, 0));
    }

    #[tokio::test]
    async fn config_change_detach_keeps_waiting_sends() {
        let bridge = Arc::new(DryRunBridge::new(34));
        let plugin = attached(&bridge, ComposerConfig::default());

        let (response, ()) = tokio::join!(plugin.handle(send_call()), async {
            wait_for_launches(&bridge, 1).await;
            plugin.detach_from_activity_for_config_changes();
            plugin.reattach_to_activity_for_config_changes(bridge.clone());
            assert!(plugin.on_activity_result(607, 0));
        });
        assert!(response.is_success());
    }

    #[test]
    fn poisoned_activity_slot_still_tracks_attachment() {
        let plugin = Arc::new(EmailSenderPlugin::new(ComposerConfig::default()));
        let holder = plugin.clone();
        let _ = std::thread::spawn(move || {
            let _slot = holder.activity.write().unwrap();
            panic!("activity slot writer panicked");
        })
        .join();
        assert!(plugin.activity.is_poisoned());

        plugin.attach_to_activity(Arc::new(DryRunBridge::new(34)));
        assert!(plugin.is_attached());
        plugin.detach_from_activity();
        assert!(!plugin.is_attached());
    }

    #[test]
    fn unrelated_activity_results_fall_through() {
        let plugin = EmailSenderPlugin::new(ComposerConfig::default());
        assert!(!plugin.on_activity_result(42, 0));
    }

    #[tokio::test]
    async fn malformed_arguments_are_reported() {
        let bridge = Arc::new(DryRunBridge::new(34));
        let plugin = attached(&bridge, ComposerConfig::default());
        let response = plugin
            .handle(MethodCall::new(METHOD_SEND, json!({ "is_html": "yes" })))
            .await;
        assert_eq!(response.error_code(), Some("error"));
        assert!(bridge.launched().is_empty());
    }
}
