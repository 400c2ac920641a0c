//! Result of a structured generation.

use mangaweave_schema::Payload;

/// What a structured generation produced.
///
/// A degraded outcome still carries a payload, filled with the shape's
/// defaults, so a stage can keep going. It is never a silent success:
/// callers decide whether to persist it and must report it.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    /// A candidate passed validation.
    Valid {
        /// The validated record
        payload: Payload,
        /// Attempts spent, including the successful one
        attempts: u32,
    },
    /// Every attempt failed; the payload is the shape's default.
    Degraded {
        /// Default record for the shape
        payload: Payload,
        /// Attempts spent
        attempts: u32,
        /// One entry per failed attempt
        errors: Vec<String>,
    },
}

impl Generated {
    /// The payload, valid or default.
    pub fn payload(&self) -> &Payload {
        match self {
            Generated::Valid { payload, .. } | Generated::Degraded { payload, .. } => payload,
        }
    }

    /// Consume the outcome, keeping the payload.
    pub fn into_payload(self) -> Payload {
        match self {
            Generated::Valid { payload, .. } | Generated::Degraded { payload, .. } => payload,
        }
    }

    /// True when the attempt budget ran out.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Generated::Degraded { .. })
    }

    /// Attempts spent.
    pub fn attempts(&self) -> u32 {
        match self {
            Generated::Valid { attempts, .. } | Generated::Degraded { attempts, .. } => *attempts,
        }
    }

    /// The final failure message of a degraded outcome.
    pub fn last_error(&self) -> Option<&str> {
        match self {
            Generated::Valid { .. } => None,
            Generated::Degraded { errors, .. } => errors.last().map(String::as_str),
        }
    }
}
