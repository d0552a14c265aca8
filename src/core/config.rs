//! Engine configuration
//!
//! Holds the tunables of the cart reservation policy and the borrow rules.
//! Invalid values fall back to defaults with a warning rather than failing
//! startup.

use chrono::Duration;
use tracing::warn;

/// Default lifetime of a cart reservation
pub const DEFAULT_CART_TTL_SECS: i64 = 5 * 60;

/// Default upper bound on a loan length
pub const DEFAULT_MAX_LOAN_DAYS: u32 = 365;

/// Configuration for the inventory engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long an added cart item stays visible without being re-added
    pub cart_ttl: Duration,
    /// Longest loan a single borrow may request, in days
    pub max_loan_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cart_ttl: Duration::seconds(DEFAULT_CART_TTL_SECS),
            max_loan_days: DEFAULT_MAX_LOAN_DAYS,
        }
    }
}

impl EngineConfig {
    /// Create a new EngineConfig with custom values
    ///
    /// A non-positive TTL or a zero loan bound is replaced by its default.
    ///
    /// # Arguments
    ///
    /// * `cart_ttl_secs` - Cart reservation lifetime in seconds
    /// * `max_loan_days` - Longest allowed loan in days
    pub fn new(cart_ttl_secs: i64, max_loan_days: u32) -> Self {
        let default = Self::default();

        let cart_ttl = if cart_ttl_secs <= 0 {
            warn!(
                cart_ttl_secs,
                default = DEFAULT_CART_TTL_SECS,
                "invalid cart TTL, using default"
            );
            default.cart_ttl
        } else {
            Duration::try_seconds(cart_ttl_secs).unwrap_or(default.cart_ttl)
        };

        let max_loan_days = if max_loan_days == 0 {
            warn!(
                max_loan_days,
                default = DEFAULT_MAX_LOAN_DAYS,
                "invalid max loan days, using default"
            );
            default.max_loan_days
        } else {
            max_loan_days
        };

        Self {
            cart_ttl,
            max_loan_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cart_ttl, Duration::minutes(5));
        assert_eq!(config.max_loan_days, 365);
    }

    #[rstest]
    #[case::custom(60, 14, Duration::seconds(60), 14)]
    #[case::zero_ttl(0, 14, Duration::minutes(5), 14)]
    #[case::negative_ttl(-5, 14, Duration::minutes(5), 14)]
    #[case::zero_days(60, 0, Duration::seconds(60), 365)]
    fn test_new_falls_back_on_invalid_values(
        #[case] ttl_secs: i64,
        #[case] days: u32,
        #[case] expected_ttl: Duration,
        #[case] expected_days: u32,
    ) {
        let config = EngineConfig::new(ttl_secs, days);
        assert_eq!(config.cart_ttl, expected_ttl);
        assert_eq!(config.max_loan_days, expected_days);
    }
}
