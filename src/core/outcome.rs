//! Results of best-effort operations.
//!
//! A best-effort step never fails the request that runs it. Instead of
//! swallowing the error, it reports whether the value it hands back is the real
//! one or a stand-in, so callers cannot mistake a degraded path for a clean one.

/// Value produced by a best-effort operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The operation succeeded.
    Complete(T),
    /// The operation failed; `value` is the stand-in the caller continues with.
    Degraded { value: T, reason: String },
}

impl<T> Outcome<T> {
    /// Turns a fallible result into an outcome, substituting `fallback` on error.
    pub fn or_degrade<E: std::fmt::Display>(result: Result<T, E>, fallback: T) -> Self {
        match result {
            Ok(value) => Outcome::Complete(value),
            Err(err) => Outcome::Degraded {
                value: fallback,
                reason: err.to_string(),
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Complete(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Complete(value) | Outcome::Degraded { value, .. } => value,
        }
    }
}
