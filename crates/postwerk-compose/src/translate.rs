// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composer request translation.
//
// Turns a `SendRequest` into a platform-neutral `ComposeAction`. The only
// real branching is how attachments become content references; that choice
// is an `AttachmentResolver` picked by `ResolverPolicy`, so the OS-version
// threshold is configuration rather than code.

use tracing::{debug, warn};

use postwerk_bridge::traits::{NativeFileSharing, PlatformBridge};
use postwerk_core::config::ComposerConfig;
use postwerk_core::error::{ComposerError, Result};
use postwerk_core::html::html_to_text;
use postwerk_core::types::{ActionKind, AttachmentContract, ComposeAction, ContentUri, SendRequest};

/// Wire name of the pre-resolved reference list.
pub const CONTENT_URI_FIELD: &str = "content_uri_paths";
/// Wire name of the local path list.
pub const ATTACHMENT_PATH_FIELD: &str = "attachment_paths";

/// Strategy for turning a request's attachments into content references.
pub trait AttachmentResolver {
    /// Wire name of the request field this strategy reads.
    fn field(&self) -> &'static str;

    /// The entries this strategy will resolve.
    fn inputs<'r>(&self, request: &'r SendRequest) -> &'r [String];

    /// One reference per input, order preserved.
    fn resolve(&self, request: &SendRequest) -> Result<Vec<ContentUri>>;
}

/// Uses `content_uri_paths` verbatim.
pub struct PassThroughResolver;

impl AttachmentResolver for PassThroughResolver {
    fn field(&self) -> &'static str {
        CONTENT_URI_FIELD
    }

    fn inputs<'r>(&self, request: &'r SendRequest) -> &'r [String] {
        &request.content_uri_paths
    }

    fn resolve(&self, request: &SendRequest) -> Result<Vec<ContentUri>> {
        Ok(request
            .content_uri_paths
            .iter()
            .cloned()
            .map(ContentUri::from)
            .collect())
    }
}

/// Shares each of `attachment_paths` through the app's file provider.
pub struct FileProviderResolver<'a, S: ?Sized> {
    sharing: &'a S,
    authority: String,
}

impl<'a, S: NativeFileSharing + ?Sized> FileProviderResolver<'a, S> {
    pub fn new(sharing: &'a S, authority: impl Into<String>) -> Self {
        Self {
            sharing,
            authority: authority.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }
}

impl<S: NativeFileSharing + ?Sized> AttachmentResolver for FileProviderResolver<'_, S> {
    fn field(&self) -> &'static str {
        ATTACHMENT_PATH_FIELD
    }

    fn inputs<'r>(&self, request: &'r SendRequest) -> &'r [String] {
        &request.attachment_paths
    }

    fn resolve(&self, request: &SendRequest) -> Result<Vec<ContentUri>> {
        request
            .attachment_paths
            .iter()
            .map(|path| self.sharing.uri_for_file(&self.authority, path))
            .collect()
    }
}

/// Picks the attachment strategy for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverPolicy {
    /// Devices at or above this SDK level read `content_uri_paths`.
    pub content_uri_min_sdk: u32,
}

impl ResolverPolicy {
    pub fn from_config(config: &ComposerConfig) -> Self {
        Self {
            content_uri_min_sdk: config.content_uri_min_sdk,
        }
    }

    /// Whether pre-resolved references are used for this device/request.
    pub fn uses_content_uris(&self, sdk_int: u32, force_content_uri: bool) -> bool {
        force_content_uri || sdk_int >= self.content_uri_min_sdk
    }

    /// Strategy for `request` on the device behind `ctx`.
    ///
    /// The SDK level is only queried when the request does not force
    /// content references.
    pub fn select<'a>(
        &self,
        ctx: &'a dyn PlatformBridge,
        request: &SendRequest,
        config: &ComposerConfig,
    ) -> Result<Box<dyn AttachmentResolver + 'a>> {
        let content_uris =
            request.force_content_uri || self.uses_content_uris(ctx.sdk_int()?, false);
        if content_uris {
            debug!(forced = request.force_content_uri, "attachments: using content references");
            return Ok(Box::new(PassThroughResolver));
        }
        let authority = config.authority_for(&ctx.package_name()?);
        debug!(authority = %authority, "attachments: sharing paths through file provider");
        Ok(Box::new(FileProviderResolver::new(ctx, authority)))
    }
}

/// Build the compose action for `request`.
///
/// Fails with `NoForegroundContext` when `ctx` is `None`.
pub fn translate(
    request: &SendRequest,
    ctx: Option<&dyn PlatformBridge>,
    config: &ComposerConfig,
) -> Result<ComposeAction> {
    let ctx = ctx.ok_or(ComposerError::NoForegroundContext)?;

    let (text_body, html_body) = render_body(request);

    let resolver = ResolverPolicy::from_config(config).select(ctx, request, config)?;
    check_attachment_contract(resolver.as_ref(), request, config.attachment_contract)?;
    let attachments = resolver.resolve(request)?;

    Ok(ComposeAction {
        kind: ActionKind::for_attachment_count(attachments.len()),
        attachments,
        subject: request.subject.clone(),
        text_body,
        html_body,
        recipients: request.recipients.clone(),
        cc: request.cc.clone(),
        bcc: request.bcc.clone(),
    })
}

/// `(text, html)` for the action. HTML bodies keep their markup and gain a
/// plain-text rendering for clients that ignore the HTML extra.
pub fn render_body(request: &SendRequest) -> (Option<String>, Option<String>) {
    match &request.body {
        Some(body) if request.is_html => (Some(html_to_text(body)), Some(body.clone())),
        Some(body) => (Some(body.clone()), None),
        None => (None, None),
    }
}

/// Attachments supplied only in the list the strategy ignores.
fn check_attachment_contract(
    resolver: &dyn AttachmentResolver,
    request: &SendRequest,
    contract: AttachmentContract,
) -> Result<()> {
    if !resolver.inputs(request).is_empty() {
        return Ok(());
    }
    let (supplied, ignored) = if resolver.field() == CONTENT_URI_FIELD {
        (ATTACHMENT_PATH_FIELD, request.attachment_paths.len())
    } else {
        (CONTENT_URI_FIELD, request.content_uri_paths.len())
    };
    if ignored == 0 {
        return Ok(());
    }

    match contract {
        AttachmentContract::Warn => {
            warn!(
                expected = resolver.field(),
                supplied,
                ignored,
                "attachments supplied in the wrong field; sending without them"
            );
            Ok(())
        }
        AttachmentContract::Strict => Err(ComposerError::AttachmentMismatch {
            expected: resolver.field(),
            supplied,
        }),
    }
}
