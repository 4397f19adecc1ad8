// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! JSON presentation: one object per line on stdout or stderr.

use std::io::Write;

use serde::Serialize;

use crate::error::CliError;

/// Serialize `payload` as a single newline-terminated JSON object.
pub fn write_json<T: Serialize + ?Sized>(w: &mut dyn Write, payload: &T) -> std::io::Result<()> {
    serde_json::to_writer(&mut *w, payload)?;
    w.write_all(b"\n")
}

/// Print a failure as `{"error": code, "message": message}`.
pub fn write_error(w: &mut dyn Write, err: &CliError) {
    let payload = serde_json::json!({
        "error": err.code,
        "message": err.message,
    });
    if let Err(e) = write_json(w, &payload) {
        tracing::error!("Failed to write error output: {}", e);
    }
}
