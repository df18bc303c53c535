//! Expected strategy fee settings per network.

use crate::error::LifecycleError;

/// Strategy call fee (out of the strategy's 1000 fee denominator) expected
/// on each network.
pub const CHAIN_CALL_FEE_MAP: &[(&str, u64)] = &[
    ("bsc", 111),
    ("avax", 111),
    ("polygon", 111),
    ("heco", 111),
    ("fantom", 111),
    ("one", 111),
    ("arbitrum", 111),
    ("moonriver", 111),
    ("celo", 111),
    ("cronos", 111),
];

/// Look up the expected call fee for `chain`.
pub fn expected_call_fee(chain: &str) -> Result<u64, LifecycleError> {
    CHAIN_CALL_FEE_MAP
        .iter()
        .find(|(name, _)| *name == chain)
        .map(|(_, fee)| *fee)
        .ok_or_else(|| {
            LifecycleError::ConfigError(format!("No expected call fee for network '{chain}'"))
        })
}

/// A strategy that harvests on every deposit must not charge a withdrawal
/// fee; one that does not must charge one.
pub fn withdrawal_fee_consistent(harvest_on_deposit: bool, withdrawal_fee: u64) -> bool {
    if harvest_on_deposit {
        withdrawal_fee == 0
    } else {
        withdrawal_fee != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_call_fee_known_chain() {
        assert_eq!(expected_call_fee("moonriver").unwrap(), 111);
    }

    #[test]
    fn test_expected_call_fee_unknown_chain() {
        assert!(expected_call_fee("atlantis").is_err());
    }

    #[test]
    fn test_withdrawal_fee_consistency() {
        assert!(withdrawal_fee_consistent(true, 0));
        assert!(!withdrawal_fee_consistent(true, 10));
        assert!(withdrawal_fee_consistent(false, 10));
        assert!(!withdrawal_fee_consistent(false, 0));
    }
}
