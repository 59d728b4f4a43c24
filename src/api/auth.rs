use super::{ApiError, ApiResult, AuthApi, SupabaseClient};
use crate::models::{Session, User};
use crate::util::now_secs;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PasswordGrantRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/v1/token?grant_type=password`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl TokenResponse {
    /// Older auth servers only send `expires_in`; derive the absolute expiry from it.
    pub(crate) fn into_session(self, now_secs: i64) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now_secs + secs));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

impl SupabaseClient {
    /// Email/password sign-in. The new session is kept in memory; callers persist it with
    /// `save_to_storage`.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<Session> {
        let req = reqwest::Client::new()
            .post(self.url("/auth/v1/token?grant_type=password"))
            .json(&PasswordGrantRequest {
                email: email.to_string(),
                password: password.to_string(),
            });

        // The anon key is the bearer here; a stale session token would be rejected.
        *self.session.borrow_mut() = None;

        let token: TokenResponse = self.request_json(req, "Sign in failed").await?;
        let session = token.into_session(now_secs());
        self.set_session(session.clone());
        Ok(session)
    }
}

impl AuthApi for SupabaseClient {
    async fn get_session(&self) -> ApiResult<Option<Session>> {
        let now = now_secs();
        Ok(self.stored_session().filter(|s| !s.is_expired(now)))
    }

    async fn get_user(&self) -> ApiResult<Option<User>> {
        if self.stored_session().is_none() {
            return Ok(None);
        }

        let req = reqwest::Client::new().get(self.url("/auth/v1/user"));
        match self.request_json::<User>(req, "Get user failed").await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self) -> ApiResult<()> {
        let result = if self.stored_session().is_some() {
            let req = reqwest::Client::new().post(self.url("/auth/v1/logout"));
            self.request_empty(req, "Sign out failed").await
        } else {
            Ok(())
        };

        // Local sign-out always succeeds; a revoked or expired token is already unusable.
        self.clear_session();
        result.or_else(|e: ApiError| if e.is_unauthorized() { Ok(()) } else { Err(e) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_contract_deserialize() {
        let json = r#"{
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1717000000,
            "refresh_token": "r-token",
            "user": {"id": "8d0f", "email": "u@example.com", "role": "authenticated"}
        }"#;
        let parsed: TokenResponse =
            serde_json::from_str(json).expect("token response should parse");
        let session = parsed.into_session(0);
        assert_eq!(session.access_token, "jwt-token");
        assert_eq!(session.refresh_token.as_deref(), Some("r-token"));
        assert_eq!(session.expires_at, Some(1_717_000_000));
        assert_eq!(session.user.id, "8d0f");
        assert_eq!(session.user.email.as_deref(), Some("u@example.com"));
    }

    #[test]
    fn test_token_response_derives_expiry_from_expires_in() {
        let json = r#"{"access_token": "t", "expires_in": 60, "user": {"id": "u"}}"#;
        let parsed: TokenResponse = serde_json::from_str(json).expect("should parse");
        assert_eq!(parsed.into_session(1_000).expires_at, Some(1_060));
    }

    #[test]
    fn test_password_grant_request_serialization() {
        let req = PasswordGrantRequest {
            email: "u@example.com".to_string(),
            password: "pass".to_string(),
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["email"], "u@example.com");
        assert_eq!(v["password"], "pass");
    }
}
