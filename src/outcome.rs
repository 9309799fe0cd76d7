//! Explicit result type for operations that degrade instead of failing.
//!
//! The reranker, the generation step and the orchestrators never hide a
//! fallback inside control flow: they return an [`Outcome`], so callers and
//! tests can see whether the value came from the primary path.

use serde::Serialize;

/// Value produced by a primary path, a degraded fallback, or nothing at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The primary path succeeded.
    Ok(T),
    /// A fallback produced `value`; `reason` says why the primary path was skipped.
    Degraded { value: T, reason: String },
    /// No value could be produced.
    Failed { reason: String },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Outcome::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Outcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    /// Returns the value of either `Ok` or `Degraded`.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Ok(value) | Outcome::Degraded { value, .. } => Some(value),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Ok(value) | Outcome::Degraded { value, .. } => Some(value),
            Outcome::Failed { .. } => None,
        }
    }

    /// Returns the degradation or failure reason.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded { reason, .. } | Outcome::Failed { reason } => Some(reason),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
            Outcome::Failed { reason } => Outcome::Failed { reason },
        }
    }

    /// Short label for logs.
    pub fn debug_status(&self) -> &'static str {
        match self {
            Outcome::Ok(_) => "OK",
            Outcome::Degraded { .. } => "DEGRADED",
            Outcome::Failed { .. } => "FAILED",
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Returns the carried value, or `T::default()` for `Failed`.
    pub fn unwrap_or_default(self) -> T {
        self.into_value().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_access() {
        let ok: Outcome<u32> = Outcome::Ok(3);
        let degraded = Outcome::degraded(4u32, "model offline");
        let failed: Outcome<u32> = Outcome::failed("top_k must be >= 1");

        assert_eq!(ok.value(), Some(&3));
        assert_eq!(degraded.value(), Some(&4));
        assert_eq!(failed.value(), None);

        assert_eq!(ok.reason(), None);
        assert_eq!(degraded.reason(), Some("model offline"));
        assert_eq!(failed.reason(), Some("top_k must be >= 1"));
    }

    #[test]
    fn test_map_preserves_variant() {
        let degraded = Outcome::degraded(2u32, "fallback").map(|v| v * 10);
        assert!(degraded.is_degraded());
        assert_eq!(degraded.value(), Some(&20));

        let failed: Outcome<u32> = Outcome::failed("nope");
        assert!(failed.map(|v| v + 1).is_failed());
    }

    #[test]
    fn test_unwrap_or_default() {
        let failed: Outcome<Vec<u8>> = Outcome::failed("x");
        assert!(failed.unwrap_or_default().is_empty());
    }
}
