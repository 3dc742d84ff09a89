//! Environment variable parsing shared by config types and binaries.

use std::str::FromStr;

use tracing::warn;

use crate::defaults::{CLASSIFICATION_MAX_DEPTH, ENV_CLASSIFICATION_MAX_DEPTH};

/// Parse `key` from the environment. Unset yields `None`; a value that does
/// not parse is logged and yields `None`.
pub fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

/// [`parse_env`], falling back to `default`.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_env(key).unwrap_or(default)
}

/// Maximum classification lineage depth from `CLASSIFICATION_MAX_DEPTH`.
pub fn classification_max_depth() -> usize {
    env_or(ENV_CLASSIFICATION_MAX_DEPTH, CLASSIFICATION_MAX_DEPTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env() {
        let key = "LECTERN_CORE_TEST_PARSE_ENV";
        std::env::remove_var(key);
        assert_eq!(parse_env::<u64>(key), None);
        assert_eq!(env_or(key, 7u64), 7);

        std::env::set_var(key, " 42 ");
        assert_eq!(parse_env::<u64>(key), Some(42));

        std::env::set_var(key, "forty-two");
        assert_eq!(parse_env::<u64>(key), None);
        assert_eq!(env_or(key, 7u64), 7);
        std::env::remove_var(key);
    }
}
