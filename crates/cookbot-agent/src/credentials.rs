//! Credential pool for the model backend
//!
//! Keys come from the environment only: `<BASE>`, then `<BASE>_2` up to
//! `<BASE>_10`. Several keys spread the load across rate-limit buckets.

use rand::seq::IndexedRandom;
use rand::Rng;
use std::env;
use std::fmt;

/// Highest numbered suffix probed by [`CredentialPool::from_env`]
const MAX_NUMBERED_KEY: usize = 10;

/// One opaque API token; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the request header
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(***)")
    }
}

/// Ordered, read-only set of credentials
#[derive(Debug, Clone, Default)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    /// Build a pool from raw tokens, skipping blank ones
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials = tokens
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !t.trim().is_empty())
            .map(Credential)
            .collect();
        Self { credentials }
    }

    /// Read `<base>` and `<base>_2` .. `<base>_10` from the environment
    pub fn from_env(base: &str) -> Self {
        let names = std::iter::once(base.to_string())
            .chain((2..=MAX_NUMBERED_KEY).map(|i| format!("{}_{}", base, i)));

        let pool = Self::new(names.filter_map(|name| env::var(name).ok()));
        tracing::debug!("Loaded {} credential(s) from {}*", pool.len(), base);
        pool
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Pick one credential uniformly at random
    pub fn choose(&self) -> Option<&Credential> {
        self.choose_with_rng(&mut rand::rng())
    }

    pub fn choose_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Credential> {
        self.credentials.choose(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // Mutex to prevent concurrent env var modifications
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env_vars<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap();

        let originals: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();

        for (key, value) in vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        let result = f();

        for (key, original) in originals {
            match original {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        result
    }

    #[test]
    fn test_from_env_collects_numbered_keys() {
        with_env_vars(
            &[
                ("COOKBOT_TEST_KEY", Some("primary")),
                ("COOKBOT_TEST_KEY_2", Some("second")),
                ("COOKBOT_TEST_KEY_3", None),
                ("COOKBOT_TEST_KEY_10", Some("tenth")),
                ("COOKBOT_TEST_KEY_11", Some("ignored")),
            ],
            || {
                let pool = CredentialPool::from_env("COOKBOT_TEST_KEY");
                assert_eq!(pool.len(), 3);
            },
        );
    }

    #[test]
    fn test_from_env_without_primary() {
        with_env_vars(
            &[
                ("COOKBOT_SPARE_KEY", None),
                ("COOKBOT_SPARE_KEY_4", Some("only-spare")),
            ],
            || {
                let pool = CredentialPool::from_env("COOKBOT_SPARE_KEY");
                assert_eq!(pool.len(), 1);
                assert_eq!(pool.choose().unwrap().secret(), "only-spare");
            },
        );
    }

    #[test]
    fn test_empty_pool() {
        with_env_vars(&[("COOKBOT_MISSING_KEY", None)], || {
            let pool = CredentialPool::from_env("COOKBOT_MISSING_KEY");
            assert!(pool.is_empty());
            assert!(pool.choose().is_none());
        });
        assert!(CredentialPool::new(["", "  "]).is_empty());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let pool = CredentialPool::new(["gsk_super_secret"]);
        let printed = format!("{:?}", pool);
        assert!(!printed.contains("gsk_super_secret"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn test_choice_spreads_across_pool() {
        let pool = CredentialPool::new(["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for _ in 0..300 {
            let credential = pool.choose_with_rng(&mut rng).unwrap();
            *counts.entry(credential.secret()).or_default() += 1;
        }

        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&n| n > 50));
    }
}
