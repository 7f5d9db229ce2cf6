//! Identity service: registered users, bearer tokens, collateral limits
//!
//! The matching engine consumes exactly two things from here: token
//! resolution and per-user collateral limits. Token resolution is a plain
//! map lookup; an unknown token is simply absence.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use types::errors::ExchangeError;
use uuid::Uuid;

/// Per-user cap on open exposure.
///
/// `Unlimited` is the default for newly registered users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollateralLimit {
    Unlimited,
    Limit(i64),
}

impl CollateralLimit {
    /// Wire encoding: unlimited collateral serializes as -1.
    pub fn wire_value(self) -> i64 {
        match self {
            CollateralLimit::Unlimited => -1,
            CollateralLimit::Limit(c) => c,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    password_digest: String,
    collateral: CollateralLimit,
}

/// Registered users and their active bearer tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identity {
    users: HashMap<String, UserRecord>,
    tokens: HashMap<String, String>,
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user with an unlimited collateral default.
    pub fn register(&mut self, username: &str, password: &str) -> Result<(), ExchangeError> {
        if username.is_empty() || password.is_empty() {
            return Err(ExchangeError::InvalidInput(
                "username and password must be non-empty".to_string(),
            ));
        }
        if self.users.contains_key(username) {
            return Err(ExchangeError::Conflict(format!(
                "username {username} is already taken"
            )));
        }
        self.users.insert(
            username.to_string(),
            UserRecord {
                password_digest: digest(username, password),
                collateral: CollateralLimit::Unlimited,
            },
        );
        Ok(())
    }

    /// Verify credentials and issue a fresh bearer token.
    pub fn login(&mut self, username: &str, password: &str) -> Result<String, ExchangeError> {
        let user = self
            .users
            .get(username)
            .ok_or_else(credentials_rejected)?;
        if user.password_digest != digest(username, password) {
            return Err(credentials_rejected());
        }
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), username.to_string());
        Ok(token)
    }

    /// Swap the password digest and invalidate every outstanding token
    /// for the user.
    pub fn change_password(
        &mut self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ExchangeError> {
        if new_password.is_empty() {
            return Err(ExchangeError::InvalidInput(
                "new password must be non-empty".to_string(),
            ));
        }
        let user = self
            .users
            .get_mut(username)
            .ok_or_else(credentials_rejected)?;
        if user.password_digest != digest(username, old_password) {
            return Err(credentials_rejected());
        }
        user.password_digest = digest(username, new_password);
        self.tokens.retain(|_, owner| owner != username);
        Ok(())
    }

    /// O(1) token lookup. Unknown tokens are `None`.
    pub fn resolve_token(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }

    pub fn is_registered(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Collateral limit for admissions; unknown users default to unlimited.
    pub fn collateral_limit(&self, username: &str) -> CollateralLimit {
        self.users
            .get(username)
            .map(|u| u.collateral)
            .unwrap_or(CollateralLimit::Unlimited)
    }

    /// Update a user's collateral limit.
    ///
    /// Takes effect for subsequent admissions only; resting orders are
    /// left untouched.
    pub fn set_collateral(
        &mut self,
        username: &str,
        limit: CollateralLimit,
    ) -> Result<(), ExchangeError> {
        let user = self
            .users
            .get_mut(username)
            .ok_or_else(|| ExchangeError::NotFound(format!("user {username}")))?;
        user.collateral = limit;
        Ok(())
    }
}

fn credentials_rejected() -> ExchangeError {
    ExchangeError::Unauthorized("unknown user or wrong password".to_string())
}

fn digest(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_login() {
        let mut identity = Identity::new();
        identity.register("alice", "hunter2").unwrap();

        let token = identity.login("alice", "hunter2").unwrap();
        assert_eq!(identity.resolve_token(&token), Some("alice"));
    }

    #[test]
    fn test_register_rejects_empty_credentials() {
        let mut identity = Identity::new();
        assert!(matches!(
            identity.register("", "pw"),
            Err(ExchangeError::InvalidInput(_))
        ));
        assert!(matches!(
            identity.register("alice", ""),
            Err(ExchangeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let mut identity = Identity::new();
        identity.register("alice", "pw").unwrap();
        assert!(matches!(
            identity.register("alice", "other"),
            Err(ExchangeError::Conflict(_))
        ));
    }

    #[test]
    fn test_login_rejects_wrong_password() {
        let mut identity = Identity::new();
        identity.register("alice", "pw").unwrap();
        assert!(matches!(
            identity.login("alice", "wrong"),
            Err(ExchangeError::Unauthorized(_))
        ));
        assert!(matches!(
            identity.login("nobody", "pw"),
            Err(ExchangeError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_tokens_are_unique_per_login() {
        let mut identity = Identity::new();
        identity.register("alice", "pw").unwrap();
        let t1 = identity.login("alice", "pw").unwrap();
        let t2 = identity.login("alice", "pw").unwrap();
        assert_ne!(t1, t2);
        assert_eq!(identity.resolve_token(&t1), Some("alice"));
        assert_eq!(identity.resolve_token(&t2), Some("alice"));
    }

    #[test]
    fn test_password_change_invalidates_all_tokens() {
        let mut identity = Identity::new();
        identity.register("alice", "pw").unwrap();
        identity.register("bob", "pw").unwrap();
        let alice_token = identity.login("alice", "pw").unwrap();
        let bob_token = identity.login("bob", "pw").unwrap();

        identity.change_password("alice", "pw", "newpw").unwrap();

        assert_eq!(identity.resolve_token(&alice_token), None);
        assert_eq!(identity.resolve_token(&bob_token), Some("bob"));
        assert!(identity.login("alice", "pw").is_err());
        assert!(identity.login("alice", "newpw").is_ok());
    }

    #[test]
    fn test_password_change_rejects_wrong_old_password() {
        let mut identity = Identity::new();
        identity.register("alice", "pw").unwrap();
        let token = identity.login("alice", "pw").unwrap();

        assert!(identity.change_password("alice", "wrong", "newpw").is_err());
        assert_eq!(
            identity.resolve_token(&token),
            Some("alice"),
            "failed change must not invalidate tokens"
        );
    }

    #[test]
    fn test_collateral_defaults_unlimited() {
        let mut identity = Identity::new();
        identity.register("alice", "pw").unwrap();
        assert_eq!(
            identity.collateral_limit("alice"),
            CollateralLimit::Unlimited
        );
    }

    #[test]
    fn test_set_collateral() {
        let mut identity = Identity::new();
        identity.register("alice", "pw").unwrap();
        identity
            .set_collateral("alice", CollateralLimit::Limit(5_000))
            .unwrap();
        assert_eq!(
            identity.collateral_limit("alice"),
            CollateralLimit::Limit(5_000)
        );
    }

    #[test]
    fn test_set_collateral_unknown_user() {
        let mut identity = Identity::new();
        assert!(matches!(
            identity.set_collateral("ghost", CollateralLimit::Limit(1)),
            Err(ExchangeError::NotFound(_))
        ));
    }

    #[test]
    fn test_wire_value() {
        assert_eq!(CollateralLimit::Unlimited.wire_value(), -1);
        assert_eq!(CollateralLimit::Limit(0).wire_value(), 0);
        assert_eq!(CollateralLimit::Limit(42).wire_value(), 42);
    }
}
