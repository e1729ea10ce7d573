//! Access credential and the profile it was issued for.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::AccessToken;

/// Role name that grants administrative access.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Tier assigned when the backend did not report one.
pub const DEFAULT_TIER: &str = "BRONZE";

/// Display data issued alongside the access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Backend user id.
    pub user_id: u64,
    /// Display name.
    pub user_name: String,
    /// Membership tier code.
    pub tier_code: String,
    /// Avatar reference.
    pub image_url: String,
    /// Free-form status text.
    pub status_message: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            user_id: 0,
            user_name: String::new(),
            tier_code: DEFAULT_TIER.to_string(),
            image_url: String::new(),
            status_message: String::new(),
        }
    }
}

/// Token and expiry returned by the renewal endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Newly issued token.
    pub token: AccessToken,
    /// Absolute expiry of the new token.
    pub expires_at: DateTime<Utc>,
}

/// Access token with its expiry, roles, and profile.
///
/// Replaced as a whole; a token is never paired with another token's expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: AccessToken,
    expires_at: DateTime<Utc>,
    roles: BTreeSet<String>,
    profile: UserProfile,
}

impl Credential {
    /// Creates credential without roles and with a default profile.
    #[must_use]
    pub fn new(token: AccessToken, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            expires_at,
            roles: BTreeSet::new(),
            profile: UserProfile::default(),
        }
    }

    /// Sets the issued roles.
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the user profile.
    #[must_use]
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Returns a credential carrying the granted token and expiry, keeping roles and profile.
    #[must_use]
    pub fn renewed(&self, grant: TokenGrant) -> Self {
        Self {
            token: grant.token,
            expires_at: grant.expires_at,
            roles: self.roles.clone(),
            profile: self.profile.clone(),
        }
    }

    #[must_use]
    pub const fn token(&self) -> &AccessToken {
        &self.token
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub const fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[must_use]
    pub const fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Returns whether role was issued.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns whether the token is still valid at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Returns lifetime left at `now`, or `None` once expired.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.expires_at - now).to_std().ok().filter(|d| !d.is_zero())
    }
}

impl From<TokenGrant> for Credential {
    fn from(grant: TokenGrant) -> Self {
        Self::new(grant.token, grant.expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn credential(expires_at: DateTime<Utc>) -> Credential {
        Credential::new(AccessToken::new_unchecked("token-a"), expires_at)
            .with_roles(["USER", "ADMIN"])
            .with_profile(UserProfile {
                user_id: 7,
                user_name: "kim".into(),
                ..UserProfile::default()
            })
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let cred = credential(now + TimeDelta::seconds(60));

        assert!(cred.is_valid_at(now));
        assert!(!cred.is_valid_at(now + TimeDelta::seconds(60)));
        assert!(cred.remaining(now).is_some());
        assert!(cred.remaining(now + TimeDelta::seconds(61)).is_none());
    }

    #[test]
    fn test_renewed_keeps_profile_and_roles() {
        let now = Utc::now();
        let cred = credential(now);
        let renewed = cred.renewed(TokenGrant {
            token: AccessToken::new_unchecked("token-b"),
            expires_at: now + TimeDelta::hours(1),
        });

        assert_eq!(renewed.token().as_str(), "token-b");
        assert_eq!(renewed.expires_at(), now + TimeDelta::hours(1));
        assert_eq!(renewed.profile().user_id, 7);
        assert!(renewed.has_role(ADMIN_ROLE));
    }

    #[test]
    fn test_default_profile_tier() {
        assert_eq!(UserProfile::default().tier_code, DEFAULT_TIER);
    }
}
