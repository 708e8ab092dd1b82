//! Non-interactive command building for `--print`

use tracing::{debug, info};

use crate::clipboard::ClipboardSink;
use crate::command::{serialize, CommandString};
use crate::config::Config;
use crate::error::{FormError, Result};
use crate::form::FieldRegistry;

/// Split a `LABEL=VALUE` argument
///
/// Only the first `=` separates, so values may contain more of them.
///
/// # Errors
/// Returns a message when there is no `=` or the label is blank
pub fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    let (label, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=VALUE, got '{raw}'"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("missing field label in '{raw}'"));
    }
    Ok((label.to_string(), value.to_string()))
}

/// Fill a fresh form from `assignments` and serialize it
///
/// # Errors
/// Fails on an invalid field list, an unknown label, a bad yes/no value,
/// or when a mandatory field is still empty
pub fn build_command(config: &Config, assignments: &[(String, String)]) -> Result<CommandString> {
    let mut registry = FieldRegistry::new(config.fields.clone())?;
    for (label, value) in assignments {
        debug!("Setting '{}' = '{}'", label, value);
        registry.set_from_str(label, value)?;
    }

    let missing = registry.missing_mandatory();
    if !missing.is_empty() {
        return Err(FormError::MissingMandatory(missing));
    }

    Ok(serialize(
        &config.command.prefix,
        config.command.quote_policy,
        registry.values(),
    ))
}

/// Copy a finished command before the process exits
///
/// Uses [`ClipboardSink::set_text_and_wait`] so the text outlives the
/// short-lived clipboard handle.
///
/// # Errors
/// Returns [`FormError::Clipboard`] if the write fails
pub fn copy_command<C: ClipboardSink>(clipboard: &mut C, command: &CommandString) -> Result<()> {
    clipboard.set_text_and_wait(command.as_str())?;
    info!("Copied command to clipboard");
    Ok(())
}
