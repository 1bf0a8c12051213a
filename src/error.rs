//! Error kind classification (spec §7).
//!
//! The teacher propagates almost everything as `anyhow::Result` with
//! `.context(...)` at call sites; this crate keeps that style everywhere
//! except at the one boundary — the pipeline dispatcher — that needs to
//! classify *which kind* of failure happened in order to log and ledger
//! it correctly. `ControllerError` exists only for that classification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("config invalid: {0}")]
    ConfigInvalid(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("data missing: {0}")]
    DataMissing(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("policy violation: {0}")]
    PolicyViolation(String),
}

impl ControllerError {
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerError::ConfigInvalid(_) => "config-invalid",
            ControllerError::Transport(_) => "transport",
            ControllerError::Protocol(_) => "protocol",
            ControllerError::DataMissing(_) => "data-missing",
            ControllerError::Storage(_) => "storage",
            ControllerError::PolicyViolation(_) => "policy-violation",
        }
    }

    /// Best-effort classification of an opaque `anyhow::Error` for
    /// logging purposes, used at pipeline boundaries that call into
    /// plumbing (HTTP fetch, store, driver) which propagate as `anyhow`.
    pub fn classify(err: &anyhow::Error) -> &'static str {
        if let Some(e) = err.downcast_ref::<ControllerError>() {
            e.kind()
        } else if let Some(e) = err.downcast_ref::<sqlx::Error>() {
            let _ = e;
            "storage"
        } else if err.downcast_ref::<reqwest::Error>().is_some() {
            "transport"
        } else {
            "protocol"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_match_spec_names() {
        assert_eq!(ControllerError::ConfigInvalid("x".into()).kind(), "config-invalid");
        assert_eq!(ControllerError::Transport("x".into()).kind(), "transport");
        assert_eq!(ControllerError::Protocol("x".into()).kind(), "protocol");
        assert_eq!(ControllerError::DataMissing("x".into()).kind(), "data-missing");
        assert_eq!(ControllerError::Storage("x".into()).kind(), "storage");
        assert_eq!(ControllerError::PolicyViolation("x".into()).kind(), "policy-violation");
    }
}
