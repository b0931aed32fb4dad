//! Maps `Box<dyn Error>` from trait boundaries to typed `SessionError`.
//!
//! The traits in `firedock_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error
//! enum, with an optional feature-gated path for
//! `firedock_store::error::StoreError` downcasting.

use crate::error::SessionError;

/// Map a trait-boundary error to a typed `SessionError`.
///
/// Attempts to downcast the known store error type first, then falls back
/// to string-based heuristics. Unknown errors map to `Unreachable`: the
/// safe assumption for a flaky external store is "try again later".
pub fn map_store_error(e: &(dyn std::error::Error + 'static)) -> SessionError {
    #[cfg(feature = "store-errors")]
    {
        if let Some(se) = e.downcast_ref::<firedock_store::error::StoreError>() {
            return match se {
                firedock_store::error::StoreError::NotFound(id) => {
                    SessionError::NotFound(id.clone())
                }
                firedock_store::error::StoreError::Unreachable => {
                    SessionError::Unreachable(se.to_string())
                }
                other => SessionError::Unreachable(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("not found") {
        SessionError::NotFound(s)
    } else {
        SessionError::Unreachable(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_detects_not_found() {
        let e = std::io::Error::other("dock not found: dock-0001");
        assert!(matches!(map_store_error(&e), SessionError::NotFound(_)));
    }

    #[test]
    fn unknown_errors_map_to_unreachable() {
        let e = std::io::Error::other("connection reset by peer");
        assert!(matches!(map_store_error(&e), SessionError::Unreachable(_)));
    }

    #[cfg(feature = "store-errors")]
    #[test]
    fn downcasts_typed_store_errors() {
        use firedock_store::error::StoreError;
        let e = StoreError::NotFound("dock-0007".to_string());
        match map_store_error(&e) {
            SessionError::NotFound(id) => assert_eq!(id, "dock-0007"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        let e = StoreError::Unreachable;
        assert!(matches!(map_store_error(&e), SessionError::Unreachable(_)));
    }
}
