//! Assertion helpers. Each returns [`LifecycleError::AssertionFailed`]
//! naming the check instead of panicking, so a failing scenario is reported
//! and the run moves on.

use std::fmt::Debug;
use std::future::Future;

use alloy::primitives::U256;

use crate::error::LifecycleError;

/// Lower bound a recovered balance must exceed: 99% of `amount`.
pub fn tolerance_floor(amount: U256) -> U256 {
    amount * U256::from(99u8) / U256::from(100u8)
}

fn failed(check: &str, detail: String) -> LifecycleError {
    LifecycleError::AssertionFailed {
        check: check.to_string(),
        detail,
    }
}

pub fn ensure_gt(check: &str, actual: U256, bound: U256) -> Result<(), LifecycleError> {
    if actual > bound {
        Ok(())
    } else {
        Err(failed(check, format!("expected {actual} > {bound}")))
    }
}

pub fn ensure_gte(check: &str, actual: U256, bound: U256) -> Result<(), LifecycleError> {
    if actual >= bound {
        Ok(())
    } else {
        Err(failed(check, format!("expected {actual} >= {bound}")))
    }
}

pub fn ensure_lte(check: &str, actual: U256, bound: U256) -> Result<(), LifecycleError> {
    if actual <= bound {
        Ok(())
    } else {
        Err(failed(check, format!("expected {actual} <= {bound}")))
    }
}

pub fn ensure_eq<T>(check: &str, actual: T, expected: T) -> Result<(), LifecycleError>
where
    T: PartialEq + Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(failed(check, format!("expected {expected:?}, got {actual:?}")))
    }
}

pub fn ensure(check: &str, condition: bool, detail: impl Into<String>) -> Result<(), LifecycleError> {
    if condition {
        Ok(())
    } else {
        Err(failed(check, detail.into()))
    }
}

/// Await `call` and require it to revert with exactly `expected`.
pub async fn expect_revert<T, F>(method: &str, call: F, expected: &str) -> Result<(), LifecycleError>
where
    F: Future<Output = Result<T, LifecycleError>>,
{
    match call.await {
        Ok(_) => Err(LifecycleError::UnexpectedSuccess {
            method: method.to_string(),
            expected: expected.to_string(),
        }),
        Err(LifecycleError::Reverted { reason, .. }) if reason.as_deref() == Some(expected) => {
            Ok(())
        }
        Err(LifecycleError::Reverted { reason, .. }) => Err(LifecycleError::RevertMismatch {
            method: method.to_string(),
            expected: expected.to_string(),
            actual: reason.unwrap_or_else(|| "<no reason>".into()),
        }),
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_floor() {
        assert_eq!(tolerance_floor(U256::from(1000u64)), U256::from(990u64));
        assert_eq!(tolerance_floor(U256::from(150u64)), U256::from(148u64));
        assert_eq!(tolerance_floor(U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_comparisons() {
        let one = U256::from(1u8);
        let two = U256::from(2u8);
        assert!(ensure_gt("gt", two, one).is_ok());
        assert!(ensure_gt("gt", one, one).is_err());
        assert!(ensure_gte("gte", one, one).is_ok());
        assert!(ensure_lte("lte", one, two).is_ok());
        assert!(ensure_lte("lte", two, one).is_err());
    }

    #[test]
    fn test_failure_names_the_check() {
        let err = ensure_eq("keeper", 1u8, 2u8).unwrap_err();
        assert_eq!(err.to_string(), "Assertion failed [keeper]: expected 2, got 1");
    }

    #[tokio::test]
    async fn test_expect_revert_matches_reason() {
        let call = async {
            Err::<(), _>(LifecycleError::Reverted {
                method: "depositAll".into(),
                reason: Some("Pausable: paused".into()),
            })
        };
        assert!(expect_revert("depositAll", call, "Pausable: paused").await.is_ok());
    }

    #[tokio::test]
    async fn test_expect_revert_rejects_other_reason_and_success() {
        let wrong = async {
            Err::<(), _>(LifecycleError::Reverted {
                method: "depositAll".into(),
                reason: None,
            })
        };
        let err = expect_revert("depositAll", wrong, "Pausable: paused").await.unwrap_err();
        assert!(matches!(err, LifecycleError::RevertMismatch { .. }));

        let ok = async { Ok::<(), LifecycleError>(()) };
        let err = expect_revert("depositAll", ok, "Pausable: paused").await.unwrap_err();
        assert!(matches!(err, LifecycleError::UnexpectedSuccess { .. }));
    }
}
