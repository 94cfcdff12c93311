//! Explicit success-or-degraded values for per-post metrics.

/// Result of a metric computation that is never allowed to fail a run.
///
/// `Degraded` carries the value actually used (always the metric's zero
/// value in this crate) together with the reason, so callers and tests can
/// tell a genuine zero from a fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Value(T),
    Degraded { fallback: T, reason: String },
}

impl<T> Outcome<T> {
    /// Wrap a fallible computation, substituting `fallback` on error.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>, fallback: T) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(e) => Outcome::Degraded {
                fallback,
                reason: e.to_string(),
            },
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Value(v) | Outcome::Degraded { fallback: v, .. } => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Value(v) | Outcome::Degraded { fallback: v, .. } => v,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Value(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }
}
