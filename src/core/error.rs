//! Provisioning error taxonomy.

use crate::models::artifact::{Artifact, ProvisionState};
use std::fmt;
use thiserror::Error;

/// An external tool ran but reported failure.
#[derive(Debug, Error)]
#[error("{tool} failed ({status}){}", detail_suffix(.detail))]
pub struct ToolError {
    pub tool: String,
    pub status: String,
    pub detail: String,
}

fn detail_suffix(detail: &str) -> String {
    let trimmed = detail.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

fn step_label(step: &Artifact) -> &'static str {
    step.step_name()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Directory or file could not be created or read, or a tool could not be started.
    Io,
    /// An invoked primitive returned failure.
    ToolFailure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => f.write_str("I/O error"),
            Self::ToolFailure => f.write_str("tool failure"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("step {} failed ({kind}) after reaching state {reached}", step_label(.step))]
    Step {
        step: Artifact,
        kind: FailureKind,
        reached: ProvisionState,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("{0} is locked by another provisioning run")]
    Locked(String),
}

impl ProvisionError {
    /// Label a step failure, classifying it by whether a tool reported failure.
    pub fn step(step: Artifact, reached: ProvisionState, err: anyhow::Error) -> Self {
        let kind = if err.chain().any(|e| e.is::<ToolError>()) {
            FailureKind::ToolFailure
        } else {
            FailureKind::Io
        };
        Self::Step {
            step,
            kind,
            reached,
            source: err.into(),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Step { kind, .. } => Some(*kind),
            Self::Locked(_) => None,
        }
    }

    pub fn failed_step(&self) -> Option<Artifact> {
        match self {
            Self::Step { step, .. } => Some(*step),
            Self::Locked(_) => None,
        }
    }
}
