//! `stamp` command.

use super::helpers::{emit, stamper};
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::version::StampResult;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StampRecord<'a> {
    files: &'a [StampResult],
}

/// Execute stamp command
pub(super) fn execute_stamp(version: &str, pre: Option<&str>, config: &RuntimeConfig) -> Result<i32> {
    let results = stamper(config).stamp_all(version, pre)?;

    for result in &results {
        let message = format!("{} ({}) → {}", result.file_path.display(), result.file_type, result.version);
        if result.updated {
            config.success_println(&message);
        } else {
            config.indent(&format!("{message}, unchanged"));
        }
    }

    emit(config, &StampRecord { files: &results })?;
    Ok(0)
}
