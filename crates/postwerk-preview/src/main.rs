// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Postwerk preview tool.
//
// Reads a method call as JSON (from a file argument or stdin), runs it
// through the plugin against a dry-run device, and prints the chooser that
// would have been launched followed by the channel reply.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use postwerk_bridge::dry_run::DryRunBridge;
use postwerk_compose::{EmailSenderPlugin, MethodCall};
use postwerk_core::config::ComposerConfig;
use postwerk_core::error::{ComposerError, Result};

/// `Activity.RESULT_OK`, reported as if the user sent the mail.
const RESULT_OK: i32 = -1;

#[derive(Debug, Parser)]
#[command(name = "postwerk-preview")]
#[command(about = "Show the email chooser a method call would launch", long_about = None)]
#[command(version)]
struct Cli {
    /// SDK level the simulated device reports
    #[arg(long, default_value_t = 34)]
    sdk: u32,

    /// Simulate a device with no email app installed
    #[arg(long)]
    no_handler: bool,

    /// Composer configuration (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Method call to run (JSON); read from stdin when omitted
    #[arg(value_name = "CALL")]
    input: Option<PathBuf>,
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ComposerConfig::load(path)?,
        None => ComposerConfig::default(),
    };

    let raw = match &cli.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let call: MethodCall = serde_json::from_str(&raw)?;

    let mut bridge = DryRunBridge::new(cli.sdk);
    if cli.no_handler {
        bridge = bridge.without_handler();
    }
    let bridge = Arc::new(bridge);

    let plugin = Arc::new(EmailSenderPlugin::new(config));
    plugin.attach_to_activity(bridge.clone());

    let task = {
        let plugin = plugin.clone();
        tokio::spawn(async move { plugin.handle(call).await })
    };

    // Pretend the user comes straight back from whichever app was chosen.
    while !task.is_finished() {
        for chooser in bridge.launched() {
            plugin.on_activity_result(chooser.request_code, RESULT_OK);
        }
        tokio::task::yield_now().await;
    }
    let response = task
        .await
        .map_err(|e| ComposerError::Bridge(format!("send task failed: {e}")))?;

    for chooser in bridge.launched() {
        println!("{}", serde_json::to_string_pretty(&chooser)?);
    }
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "preview failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_input() {
        let cli = Cli::try_parse_from(["postwerk-preview", "--sdk", "29", "--no-handler", "call.json"])
            .unwrap();
        assert_eq!(cli.sdk, 29);
        assert!(cli.no_handler);
        assert_eq!(cli.input, Some(PathBuf::from("call.json")));
        assert!(cli.config.is_none());
    }

    #[test]
    fn defaults_to_current_sdk_and_stdin() {
        let cli = Cli::try_parse_from(["postwerk-preview"]).unwrap();
        assert_eq!(cli.sdk, 34);
        assert!(!cli.no_handler);
        assert!(cli.input.is_none());
    }

    #[test]
    fn rejects_bad_sdk() {
        assert!(Cli::try_parse_from(["postwerk-preview", "--sdk", "eleven"]).is_err());
        assert!(Cli::try_parse_from(["postwerk-preview", "--sdk"]).is_err());
    }

    #[test]
    fn misspelled_flag_is_not_taken_as_input() {
        assert!(Cli::try_parse_from(["postwerk-preview", "--skd", "29"]).is_err());
    }
}
