//! Session Service (mock identity provider)
//!
//! Supplies the `user_id` that scopes every deposit query. Passwords are
//! accepted but never checked; this exists only so the API has a stable
//! notion of "the current user".

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid email address")]
    InvalidEmail,

    #[error("password is required")]
    MissingPassword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// 로그인 결과: bearer token + 사용자
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Default)]
pub struct SessionService {
    /// token → user
    sessions: RwLock<HashMap<String, User>>,
    /// email → user id (같은 이메일은 같은 사용자)
    users: RwLock<HashMap<String, String>>,
    counter: AtomicU64,
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        self.open_session(email, password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        self.open_session(email, password).await
    }

    async fn open_session(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(SessionError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(SessionError::MissingPassword);
        }

        let user_id = {
            let mut users = self.users.write().await;
            users
                .entry(email.clone())
                .or_insert_with(|| self.next_user_id())
                .clone()
        };

        let user = User { id: user_id, email };
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), user.clone());

        tracing::info!(user_id = %user.id, "session opened");
        Ok(Session { token, user })
    }

    /// `user_<millis>_<n>`
    fn next_user_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("user_{}_{}", chrono::Utc::now().timestamp_millis(), n)
    }

    pub async fn resolve(&self, token: &str) -> Option<User> {
        self.sessions.read().await.get(token).cloned()
    }

    /// 멱등: 없는 토큰도 성공
    pub async fn logout(&self, token: &str) {
        if let Some(user) = self.sessions.write().await.remove(token) {
            tracing::info!(user_id = %user.id, "session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_resolve_logout() {
        let sessions = SessionService::new();

        let session = sessions.login("Alice@Example.com", "pw").await.unwrap();
        assert!(session.user.id.starts_with("user_"));
        assert_eq!(session.user.email, "alice@example.com");

        assert_eq!(sessions.resolve(&session.token).await, Some(session.user.clone()));

        sessions.logout(&session.token).await;
        sessions.logout(&session.token).await;
        assert_eq!(sessions.resolve(&session.token).await, None);
    }

    #[tokio::test]
    async fn test_same_email_same_user() {
        let sessions = SessionService::new();
        let a = sessions.signup("bob@example.com", "pw").await.unwrap();
        let b = sessions.login("bob@example.com", "other").await.unwrap();
        let c = sessions.login("carol@example.com", "pw").await.unwrap();

        assert_eq!(a.user.id, b.user.id);
        assert_ne!(a.token, b.token);
        assert_ne!(a.user.id, c.user.id);
    }

    #[tokio::test]
    async fn test_rejects_bad_credentials() {
        let sessions = SessionService::new();
        assert_eq!(sessions.login("not-an-email", "pw").await.unwrap_err(), SessionError::InvalidEmail);
        assert_eq!(sessions.login("a@b.c", "").await.unwrap_err(), SessionError::MissingPassword);
    }
}
