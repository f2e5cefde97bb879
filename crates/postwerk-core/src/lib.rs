// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Postwerk core: types, errors and configuration shared across all crates.

pub mod config;
pub mod error;
pub mod html;
pub mod types;

pub use config::ComposerConfig;
pub use error::ComposerError;
pub use types::*;
