//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use firedock_core::{BuildError, SessionError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingRegistry => {
                "What happened: No dock registry was provided to the coordinator.\nLikely causes: The store handle was not wired into the builder.\nHow to fix: Pass the store via with_registry(...).".to_string()
            }
            BuildError::MissingFeed => {
                "What happened: No scale feed was provided to the coordinator.\nLikely causes: The store handle was not wired into the builder.\nHow to fix: Pass the store via with_feed(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SessionError>() {
        return match se {
            SessionError::Unreachable(detail) => format!(
                "What happened: The dock store is unreachable ({detail}).\nLikely causes: Network down, store offline, or credentials lapsed.\nHow to fix: Check connectivity and retry; saves are safe to repeat."
            ),
            SessionError::NotFound(id) => format!(
                "What happened: Dock {id} does not exist (it may have been deleted).\nLikely causes: The dock was removed from another surface mid-session.\nHow to fix: Run `firedock list` and pick an existing dock id."
            ),
            SessionError::InvalidInput(msg) => format!(
                "What happened: Invalid input ({msg}).\nHow to fix: Check the command arguments and retry."
            ),
            SessionError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: The scale never settled or the session ran too long.\nHow to fix: Re-run, or raise --max-run-ms."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("dock seed csv must have headers") {
        return "Invalid headers in dock seed CSV. Expected 'name,location,expires_in_days'."
            .to_string();
    }

    if lower.contains("invalid csv row") {
        return format!(
            "What happened: A dock seed CSV row failed validation.\nHow to fix: Correct the row and re-run the import. Original: {msg}"
        );
    }

    if lower.starts_with("policy.") || lower.starts_with("scale.") || lower.starts_with("reconcile.")
        || lower.starts_with("logging.")
    {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error family; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use firedock_core::SessionError;
    match err.downcast_ref::<SessionError>() {
        Some(SessionError::Unreachable(_)) => 3,
        Some(SessionError::NotFound(_)) => 4,
        Some(SessionError::State(_)) => 5,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use firedock_core::SessionError;
    use serde_json::json;

    let reason = match err.downcast_ref::<SessionError>() {
        Some(SessionError::Unreachable(_)) => "Unreachable",
        Some(SessionError::NotFound(_)) => "NotFound",
        Some(SessionError::InvalidInput(_)) => "InvalidInput",
        Some(SessionError::State(_)) => "State",
        None => "Error",
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
