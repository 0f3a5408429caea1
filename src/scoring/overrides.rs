use tracing::{debug, warn};

use super::engine::Outcome;
use crate::access::Role;
use crate::notify::OverrideListener;

/// Hard failures of the override channel. The previous value is kept.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OverrideError {
    #[error("Override score cannot exceed {cap}.")]
    ExceedsCap { value: f64, cap: u32 },

    #[error("Override score must be a number, got '{0}'")]
    NotANumber(String),
}

/// A reviewer-entered total, independent of the row scores.
pub struct OverrideScore {
    cap: u32,
    role: Role,
    value: Option<String>,
    listener: Option<Box<dyn OverrideListener>>,
}

impl OverrideScore {
    pub fn new(cap: u32, role: Role) -> Self {
        Self {
            cap,
            role,
            value: None,
            listener: None,
        }
    }

    /// Seed a previously stored value without notifying.
    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub fn with_listener<L>(mut self, listener: L) -> Self
    where
        L: OverrideListener + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Whether the override input should be shown at all.
    pub fn is_editable(&self) -> bool {
        self.role.capabilities().set_override
    }

    /// Record a new override total.
    ///
    /// A blank value is accepted and reads as zero. Anything above the cap is
    /// refused with an error the caller must surface to the actor.
    pub fn set(&mut self, raw: &str) -> Result<Outcome, OverrideError> {
        if !self.is_editable() {
            return Ok(Outcome::NotPermitted);
        }

        let number = parse_number(raw)?;
        if number > f64::from(self.cap) {
            warn!(value = raw, cap = self.cap, "override score rejected");
            return Err(OverrideError::ExceedsCap {
                value: number,
                cap: self.cap,
            });
        }

        self.value = Some(raw.to_string());
        debug!(value = raw, "override score updated");
        if let Some(listener) = self.listener.as_mut() {
            listener.override_changed(raw);
        }
        Ok(Outcome::Applied)
    }
}

fn parse_number(raw: &str) -> Result<f64, OverrideError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(OverrideError::NotANumber(raw.to_string())),
    }
}
