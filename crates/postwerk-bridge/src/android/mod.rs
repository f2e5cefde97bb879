// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Each trait method invokes the corresponding
// Android API through JNI calls into the ART runtime.
//
// ## Architecture notes
//
// The compose intent is rebuilt from the platform-neutral `ComposeAction` on
// every call; nothing Java-side is cached between calls.
//
// The chooser is launched with `startActivityForResult`. The host Activity
// must forward `onActivityResult(requestCode, resultCode, data)` to
// `EmailSenderPlugin::on_activity_result` so the pending send completes.

#![cfg(target_os = "android")]

use jni::JNIEnv;
use jni::objects::{JObject, JObjectArray, JString, JValue};
use jni::sys::jsize;

use postwerk_core::error::{ComposerError, Result};
use postwerk_core::types::{ActionKind, ChooserRequest, ComposeAction, ContentUri};

use crate::traits::*;

// ---------------------------------------------------------------------------
// Intent constants
// ---------------------------------------------------------------------------

const FLAG_GRANT_READ_URI_PERMISSION: i32 = 0x0000_0001;

const EXTRA_STREAM: &str = "android.intent.extra.STREAM";
const EXTRA_TEXT: &str = "android.intent.extra.TEXT";
const EXTRA_HTML_TEXT: &str = "android.intent.extra.HTML_TEXT";
const EXTRA_SUBJECT: &str = "android.intent.extra.SUBJECT";
const EXTRA_EMAIL: &str = "android.intent.extra.EMAIL";
const EXTRA_CC: &str = "android.intent.extra.CC";
const EXTRA_BCC: &str = "android.intent.extra.BCC";

const PUT_STRING_EXTRA: &str = "(Ljava/lang/String;Ljava/lang/String;)Landroid/content/Intent;";
const PUT_CHARSEQ_EXTRA: &str =
    "(Ljava/lang/String;Ljava/lang/CharSequence;)Landroid/content/Intent;";
const PUT_STRING_ARRAY_EXTRA: &str =
    "(Ljava/lang/String;[Ljava/lang/String;)Landroid/content/Intent;";

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// Local references reserved per bridge call.
const LOCAL_FRAME_CAPACITY: i32 = 32;

/// Run `f` with a [`JNIEnv`] attached to the current thread and the hosting
/// `Activity`.
///
/// The `JavaVM*` and activity `jobject` come from `ndk_context`, set by
/// `android_main` or `ANativeActivity_onCreate`. A Java exception left
/// pending by a failed call is cleared before returning so the next JNI call
/// on this thread starts clean.
fn with_activity<T>(f: impl FnOnce(&mut JNIEnv<'_>, &JObject<'_>) -> Result<T>) -> Result<T> {
    let ctx = ndk_context::android_context();
    let activity_ptr = ctx.context();
    if activity_ptr.is_null() {
        return Err(ComposerError::NoForegroundContext);
    }

    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    let vm = unsafe { jni::JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| ComposerError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
    let mut env = vm
        .attach_current_thread()
        .map_err(|e| ComposerError::Bridge(format!("failed to attach JNI thread: {e}")))?;

    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    let activity = unsafe { JObject::from_raw(activity_ptr.cast()) };

    // Locals created by `f` are released when the frame pops, even when the
    // thread was already attached and control has not returned to Java.
    env.with_local_frame(LOCAL_FRAME_CAPACITY, |env| -> jni::errors::Result<Result<T>> {
        let result = f(env, &activity);
        if result.is_err() && env.exception_check().unwrap_or(false) {
            let _ = env.exception_describe();
            let _ = env.exception_clear();
        }
        Ok(result)
    })
    .map_err(|e| jni_err("local reference frame", e))?
}

/// Convenience: map any `jni::errors::Error` into `ComposerError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> ComposerError {
    ComposerError::Bridge(format!("{context}: {e}"))
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the Postwerk platform bridge.
///
/// Zero-sized; all state lives on the Java side.
pub struct AndroidBridge;

impl AndroidBridge {
    /// Bridge for the hosting Activity, or `None` if no Activity is attached.
    ///
    /// Does not touch JNI; the first JNI call happens when a trait method
    /// is invoked.
    pub fn attach() -> Option<Self> {
        let ctx = ndk_context::android_context();
        if ctx.context().is_null() {
            tracing::warn!("Android: no activity attached to the native context");
            return None;
        }
        Some(Self)
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// NativeDeviceInfo: Build.VERSION / Context
// ---------------------------------------------------------------------------

impl NativeDeviceInfo for AndroidBridge {
    fn sdk_int(&self) -> Result<u32> {
        with_activity(|env, _activity| {
            let sdk = env
                .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
                .map_err(|e| jni_err("Build.VERSION.SDK_INT", e))?
                .i()
                .map_err(|e| jni_err("SDK_INT->i", e))?;
            u32::try_from(sdk)
                .map_err(|_| ComposerError::Bridge(format!("negative SDK_INT: {sdk}")))
        })
    }

    fn package_name(&self) -> Result<String> {
        with_activity(|env, activity| {
            let j_pkg: JObject = env
                .call_method(activity, "getPackageName", "()Ljava/lang/String;", &[])
                .map_err(|e| jni_err("getPackageName", e))?
                .l()
                .map_err(|e| jni_err("getPackageName->l", e))?;

            let pkg: String = env
                .get_string(&JString::from(j_pkg))
                .map_err(|e| jni_err("get_string(packageName)", e))?
                .into();
            Ok(pkg)
        })
    }
}

// ---------------------------------------------------------------------------
// NativeFileSharing: androidx FileProvider
// ---------------------------------------------------------------------------

impl NativeFileSharing for AndroidBridge {
    /// `FileProvider.getUriForFile(activity, authority, new File(path))`.
    ///
    /// Fails if `path` is outside the roots declared in the provider's
    /// `file_paths` XML.
    fn uri_for_file(&self, authority: &str, path: &str) -> Result<ContentUri> {
        with_activity(|env, activity| {
            let j_path: JString = env
                .new_string(path)
                .map_err(|e| jni_err("new_string(path)", e))?;

            let file_obj: JObject = env
                .new_object(
                    "java/io/File",
                    "(Ljava/lang/String;)V",
                    &[JValue::Object(&j_path)],
                )
                .map_err(|e| jni_err("new File(path)", e))?;

            let j_authority: JString = env
                .new_string(authority)
                .map_err(|e| jni_err("new_string(authority)", e))?;

            let content_uri: JObject = env
                .call_static_method(
                    "androidx/core/content/FileProvider",
                    "getUriForFile",
                    "(Landroid/content/Context;Ljava/lang/String;Ljava/io/File;)Landroid/net/Uri;",
                    &[
                        JValue::Object(activity),
                        JValue::Object(&j_authority),
                        JValue::Object(&file_obj),
                    ],
                )
                .map_err(|e| jni_err("FileProvider.getUriForFile", e))?
                .l()
                .map_err(|e| jni_err("getUriForFile->l", e))?;

            let j_uri_str: JObject = env
                .call_method(&content_uri, "toString", "()Ljava/lang/String;", &[])
                .map_err(|e| jni_err("Uri.toString", e))?
                .l()
                .map_err(|e| jni_err("Uri.toString->l", e))?;

            let uri: String = env
                .get_string(&JString::from(j_uri_str))
                .map_err(|e| jni_err("get_string(uri)", e))?
                .into();

            tracing::debug!(path, uri = %uri, "Android: shared file through FileProvider");
            Ok(ContentUri(uri))
        })
    }
}

// ---------------------------------------------------------------------------
// NativeEmailChooser: Intent.createChooser + PackageManager
// ---------------------------------------------------------------------------

impl NativeEmailChooser for AndroidBridge {
    /// `packageManager.resolveActivity(chooser, 0) != null`.
    fn resolves(&self, chooser: &ChooserRequest) -> Result<bool> {
        with_activity(|env, activity| {
            let chooser_intent = build_chooser_intent(env, chooser)?;

            let package_manager: JObject = env
                .call_method(
                    activity,
                    "getPackageManager",
                    "()Landroid/content/pm/PackageManager;",
                    &[],
                )
                .map_err(|e| jni_err("getPackageManager", e))?
                .l()
                .map_err(|e| jni_err("getPackageManager->l", e))?;

            let resolve_info: JObject = env
                .call_method(
                    &package_manager,
                    "resolveActivity",
                    "(Landroid/content/Intent;I)Landroid/content/pm/ResolveInfo;",
                    &[JValue::Object(&chooser_intent), JValue::Int(0)],
                )
                .map_err(|e| jni_err("resolveActivity", e))?
                .l()
                .map_err(|e| jni_err("resolveActivity->l", e))?;

            Ok(!resolve_info.is_null())
        })
    }

    /// `activity.startActivityForResult(chooser, requestCode)`.
    fn start_chooser(&self, chooser: &ChooserRequest) -> Result<()> {
        with_activity(|env, activity| {
            let chooser_intent = build_chooser_intent(env, chooser)?;

            env.call_method(
                activity,
                "startActivityForResult",
                "(Landroid/content/Intent;I)V",
                &[
                    JValue::Object(&chooser_intent),
                    JValue::Int(chooser.request_code),
                ],
            )
            .map_err(|e| jni_err("startActivityForResult(chooser)", e))?;

            tracing::info!(
                request_code = chooser.request_code,
                action = chooser.action.intent_action(),
                "Android: email chooser dispatched, awaiting onActivityResult"
            );
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// Intent construction
// ---------------------------------------------------------------------------

/// `Intent.createChooser(composeIntent, title)`.
fn build_chooser_intent<'a>(env: &mut JNIEnv<'a>, chooser: &ChooserRequest) -> Result<JObject<'a>> {
    let intent = build_compose_intent(env, &chooser.action)?;

    let j_title: JString = env
        .new_string(&chooser.title)
        .map_err(|e| jni_err("new_string(chooser_title)", e))?;

    env.call_static_method(
        "android/content/Intent",
        "createChooser",
        "(Landroid/content/Intent;Ljava/lang/CharSequence;)Landroid/content/Intent;",
        &[JValue::Object(&intent), JValue::Object(&j_title)],
    )
    .map_err(|e| jni_err("Intent.createChooser", e))?
    .l()
    .map_err(|e| jni_err("createChooser->l", e))
}

/// Translate a [`ComposeAction`] into an `android.content.Intent`.
fn build_compose_intent<'a>(env: &mut JNIEnv<'a>, action: &ComposeAction) -> Result<JObject<'a>> {
    let intent: JObject = env
        .new_object("android/content/Intent", "()V", &[])
        .map_err(|e| jni_err("new Intent", e))?;

    let j_action: JString = env
        .new_string(action.intent_action())
        .map_err(|e| jni_err("new_string(action)", e))?;
    env.call_method(
        &intent,
        "setAction",
        "(Ljava/lang/String;)Landroid/content/Intent;",
        &[JValue::Object(&j_action)],
    )
    .map_err(|e| jni_err("setAction", e))?;

    match action.kind {
        ActionKind::Simple => {
            if let Some(data) = action.data_uri() {
                let uri = parse_uri(env, data)?;
                env.call_method(
                    &intent,
                    "setData",
                    "(Landroid/net/Uri;)Landroid/content/Intent;",
                    &[JValue::Object(&uri)],
                )
                .map_err(|e| jni_err("setData(mailto)", e))?;
            }
        }
        ActionKind::WithAttachments => {
            env.call_method(
                &intent,
                "addFlags",
                "(I)Landroid/content/Intent;",
                &[JValue::Int(FLAG_GRANT_READ_URI_PERMISSION)],
            )
            .map_err(|e| jni_err("addFlags(grant read)", e))?;

            if let Some(mime) = action.mime_type() {
                let j_mime: JString = env
                    .new_string(mime)
                    .map_err(|e| jni_err("new_string(mime)", e))?;
                env.call_method(
                    &intent,
                    "setType",
                    "(Ljava/lang/String;)Landroid/content/Intent;",
                    &[JValue::Object(&j_mime)],
                )
                .map_err(|e| jni_err("setType", e))?;
            }

            let uri_list: JObject = env
                .new_object("java/util/ArrayList", "()V", &[])
                .map_err(|e| jni_err("new ArrayList", e))?;
            for attachment in &action.attachments {
                let uri = parse_uri(env, attachment.as_str())?;
                env.call_method(
                    &uri_list,
                    "add",
                    "(Ljava/lang/Object;)Z",
                    &[JValue::Object(&uri)],
                )
                .map_err(|e| jni_err("ArrayList.add(uri)", e))?;
                env.delete_local_ref(uri)
                    .map_err(|e| jni_err("delete_local_ref(uri)", e))?;
            }

            let j_extra_stream: JString = env
                .new_string(EXTRA_STREAM)
                .map_err(|e| jni_err("new_string(EXTRA_STREAM)", e))?;
            env.call_method(
                &intent,
                "putParcelableArrayListExtra",
                "(Ljava/lang/String;Ljava/util/ArrayList;)Landroid/content/Intent;",
                &[JValue::Object(&j_extra_stream), JValue::Object(&uri_list)],
            )
            .map_err(|e| jni_err("putParcelableArrayListExtra(EXTRA_STREAM)", e))?;
        }
    }

    if let Some(text) = &action.text_body {
        put_string_extra(env, &intent, EXTRA_TEXT, text, PUT_CHARSEQ_EXTRA)?;
    }
    if let Some(html) = &action.html_body {
        put_string_extra(env, &intent, EXTRA_HTML_TEXT, html, PUT_STRING_EXTRA)?;
    }
    if let Some(subject) = &action.subject {
        put_string_extra(env, &intent, EXTRA_SUBJECT, subject, PUT_STRING_EXTRA)?;
    }
    if let Some(recipients) = &action.recipients {
        put_string_array_extra(env, &intent, EXTRA_EMAIL, recipients)?;
    }
    if let Some(cc) = &action.cc {
        put_string_array_extra(env, &intent, EXTRA_CC, cc)?;
    }
    if let Some(bcc) = &action.bcc {
        put_string_array_extra(env, &intent, EXTRA_BCC, bcc)?;
    }

    Ok(intent)
}

/// `Uri.parse(value)`.
fn parse_uri<'a>(env: &mut JNIEnv<'a>, value: &str) -> Result<JObject<'a>> {
    let j_value: JString = env
        .new_string(value)
        .map_err(|e| jni_err("new_string(uri)", e))?;

    let uri = env
        .call_static_method(
            "android/net/Uri",
            "parse",
            "(Ljava/lang/String;)Landroid/net/Uri;",
            &[JValue::Object(&j_value)],
        )
        .map_err(|e| jni_err("Uri.parse", e))?
        .l()
        .map_err(|e| jni_err("Uri.parse->l", e))?;
    env.delete_local_ref(j_value)
        .map_err(|e| jni_err("delete_local_ref(uri string)", e))?;
    Ok(uri)
}

/// `intent.putExtra(key, value)` using the overload named by `signature`.
fn put_string_extra(
    env: &mut JNIEnv<'_>,
    intent: &JObject<'_>,
    key: &str,
    value: &str,
    signature: &str,
) -> Result<()> {
    let j_key: JString = env
        .new_string(key)
        .map_err(|e| jni_err("new_string(extra key)", e))?;
    let j_value: JString = env
        .new_string(value)
        .map_err(|e| jni_err("new_string(extra value)", e))?;

    env.call_method(
        intent,
        "putExtra",
        signature,
        &[JValue::Object(&j_key), JValue::Object(&j_value)],
    )
    .map_err(|e| jni_err(key, e))?;
    Ok(())
}

/// `intent.putExtra(key, String[])`.
fn put_string_array_extra(
    env: &mut JNIEnv<'_>,
    intent: &JObject<'_>,
    key: &str,
    values: &[String],
) -> Result<()> {
    let array = string_array(env, values)?;
    let j_key: JString = env
        .new_string(key)
        .map_err(|e| jni_err("new_string(extra key)", e))?;

    env.call_method(
        intent,
        "putExtra",
        PUT_STRING_ARRAY_EXTRA,
        &[JValue::Object(&j_key), JValue::Object(&array)],
    )
    .map_err(|e| jni_err(key, e))?;
    Ok(())
}

/// Build a `String[]` from a slice.
fn string_array<'a>(env: &mut JNIEnv<'a>, values: &[String]) -> Result<JObjectArray<'a>> {
    let string_class = env
        .find_class("java/lang/String")
        .map_err(|e| jni_err("find_class(String)", e))?;

    let array = env
        .new_object_array(values.len() as jsize, &string_class, &JObject::null())
        .map_err(|e| jni_err("new_object_array(String)", e))?;

    for (i, value) in values.iter().enumerate() {
        let j_value: JString = env
            .new_string(value)
            .map_err(|e| jni_err("new_string(array element)", e))?;
        env.set_object_array_element(&array, i as jsize, &j_value)
            .map_err(|e| jni_err("set_object_array_element", e))?;
        env.delete_local_ref(j_value)
            .map_err(|e| jni_err("delete_local_ref(array element)", e))?;
    }

    Ok(array)
}
