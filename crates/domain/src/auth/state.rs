//! Persisted authentication state snapshot.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::TokenGrant;

/// Lifetime assumed for tokens whose grant carried no `expires_in`.
const FALLBACK_LIFETIME_SECS: u64 = 3600;

/// The complete snapshot of a user's token material.
///
/// A snapshot is replaced wholesale after every successful login, refresh
/// or logout; it is never mutated field by field. Storage therefore holds
/// either the previous snapshot or the new one, never a mixture.
///
/// Invariant: when `access_token` is present, `access_token_expiry` is
/// present too. The constructors uphold this; a token without a provable
/// lifetime is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthState {
    /// Short-lived credential sent with API requests.
    pub access_token: Option<String>,
    /// Longer-lived credential used to obtain new access tokens without
    /// interactive login.
    pub refresh_token: Option<String>,
    /// OpenID Connect identity token, when the provider issued one.
    pub id_token: Option<String>,
    /// Absolute expiry of the access token.
    pub access_token_expiry: Option<DateTime<Utc>>,
    /// Space-separated scope granted with the tokens.
    #[serde(default)]
    pub scope: String,
}

impl AuthState {
    /// The state held before any login, and after logout.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a fresh snapshot from newly granted token material.
    ///
    /// Grants that omit `expires_in` get [`FALLBACK_LIFETIME_SECS`]; some
    /// token endpoints leave the field out for tokens with a fixed,
    /// documented lifetime.
    #[must_use]
    pub fn from_grant(grant: &TokenGrant, now: DateTime<Utc>) -> Self {
        let lifetime = grant.expires_in.unwrap_or(FALLBACK_LIFETIME_SECS);
        let expiry = now + Duration::seconds(lifetime.cast_signed());

        Self {
            access_token: Some(grant.access_token.clone()),
            refresh_token: grant.refresh_token.clone(),
            id_token: grant.id_token.clone(),
            access_token_expiry: Some(expiry),
            scope: grant.scope.clone(),
        }
    }

    /// Returns the access token while it is still valid at `now`.
    ///
    /// `skew_seconds` is subtracted from the stored expiry, so a token
    /// about to lapse mid-request already counts as expired.
    #[must_use]
    pub fn valid_access_token(&self, now: DateTime<Utc>, skew_seconds: i64) -> Option<&str> {
        let token = self.access_token.as_deref()?;
        let expiry = self.access_token_expiry?;
        if now + Duration::seconds(skew_seconds) < expiry {
            Some(token)
        } else {
            None
        }
    }

    /// True when a refresh token is held.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Returns a copy with the access token and its expiry blanked.
    ///
    /// The refresh and identity tokens survive, so the next access-token
    /// request goes through a silent refresh instead of an interactive
    /// login.
    #[must_use]
    pub fn without_access_token(&self) -> Self {
        Self {
            access_token: None,
            access_token_expiry: None,
            ..self.clone()
        }
    }

    /// True when no token material is held at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.id_token.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grant() -> TokenGrant {
        TokenGrant {
            access_token: "AT1".to_string(),
            refresh_token: Some("RT1".to_string()),
            id_token: None,
            expires_in: Some(3600),
            scope: "openid profile api".to_string(),
        }
    }

    #[test]
    fn test_from_grant_sets_expiry() {
        let now = Utc::now();
        let state = AuthState::from_grant(&grant(), now);

        assert_eq!(state.access_token.as_deref(), Some("AT1"));
        assert_eq!(state.refresh_token.as_deref(), Some("RT1"));
        assert_eq!(state.access_token_expiry, Some(now + Duration::seconds(3600)));
        assert!(state.can_refresh());
    }

    #[test]
    fn test_grant_without_expires_in_gets_fallback() {
        let now = Utc::now();
        let mut g = grant();
        g.expires_in = None;

        let state = AuthState::from_grant(&g, now);
        assert_eq!(
            state.access_token_expiry,
            Some(now + Duration::seconds(FALLBACK_LIFETIME_SECS.cast_signed()))
        );
    }

    #[test]
    fn test_valid_access_token_respects_skew() {
        let now = Utc::now();
        let mut g = grant();
        g.expires_in = Some(20);
        let state = AuthState::from_grant(&g, now);

        assert_eq!(state.valid_access_token(now, 0), Some("AT1"));
        // 30s skew pushes a token with 20s left over the edge
        assert_eq!(state.valid_access_token(now, 30), None);
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let now = Utc::now();
        let state = AuthState::from_grant(&grant(), now - Duration::seconds(7200));
        assert_eq!(state.valid_access_token(now, 0), None);
    }

    #[test]
    fn test_without_access_token_keeps_refresh_token() {
        let now = Utc::now();
        let cleared = AuthState::from_grant(&grant(), now).without_access_token();

        assert_eq!(cleared.access_token, None);
        assert_eq!(cleared.access_token_expiry, None);
        assert_eq!(cleared.refresh_token.as_deref(), Some("RT1"));
        assert!(!cleared.is_empty());
    }

    #[test]
    fn test_empty_state() {
        let state = AuthState::empty();
        assert!(state.is_empty());
        assert!(!state.can_refresh());
        assert_eq!(state.valid_access_token(Utc::now(), 0), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let now = Utc::now();
        let state = AuthState::from_grant(&grant(), now);

        let json = serde_json::to_string(&state).unwrap();
        let restored: AuthState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, restored);
    }
}
