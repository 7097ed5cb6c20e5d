//! Authentication providers
//!
//! Email/password accounts. [`LocalAuth`] keeps bcrypt hashes and session
//! tokens in the document store; the Firebase provider lives in
//! [`super::firebase`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::store::{DocumentStore, FieldFilter, Fields, FilterOp, Query};
use super::SdkError;

/// Shortest password either provider accepts
pub const MIN_PASSWORD_LEN: usize = 6;

const CREDENTIALS: &str = "credentials";
const SESSIONS: &str = "sessions";

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub uid: String,
    pub email: String,
    /// Bearer token for later requests
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, SdkError>;

    /// Create an account, returning its uid
    async fn sign_up(&self, email: &str, password: &str) -> Result<String, SdkError>;

    /// Resolve a bearer token to a uid
    async fn verify(&self, token: &str) -> Result<String, SdkError>;

    async fn update_password(&self, uid: &str, password: &str) -> Result<(), SdkError>;

    /// End a session; unknown tokens are ignored
    async fn sign_out(&self, token: &str) -> Result<(), SdkError>;
}

pub(crate) fn check_password(password: &str) -> Result<(), SdkError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SdkError::WeakPassword(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Accounts stored next to the application data
pub struct LocalAuth {
    store: Arc<dyn DocumentStore>,
    cost: u32,
    session_ttl: Duration,
}

impl LocalAuth {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            cost: bcrypt::DEFAULT_COST,
            session_ttl: Duration::hours(24),
        }
    }

    /// bcrypt work factor (4..=31)
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<(String, String)>, SdkError> {
        let query = Query::collection(CREDENTIALS).where_eq("email", email).limit(1);
        let doc = self.store.query(&query).await?.into_iter().next();
        Ok(doc.and_then(|d| {
            let hash = d.get("password_hash")?.as_str()?.to_string();
            Some((d.id, hash))
        }))
    }

    /// bcrypt is CPU bound, so it runs on the blocking pool
    async fn hash(&self, password: &str) -> Result<String, SdkError> {
        let (password, cost) = (password.to_string(), self.cost);
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await?
            .map_err(SdkError::from)
    }

    async fn password_matches(password: &str, hash: String) -> Result<bool, SdkError> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await?
            .map_err(SdkError::from)
    }

    /// Drop every session whose expiry has passed
    async fn prune_sessions(&self, now: DateTime<Utc>) -> Result<usize, SdkError> {
        let query = Query::collection(SESSIONS).filter(FieldFilter::new(
            "expires_at",
            FilterOp::Lte,
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
        let expired = self.store.query(&query).await?;
        for doc in &expired {
            self.store.delete(SESSIONS, &doc.id).await?;
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "Pruned expired sessions");
        }
        Ok(expired.len())
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, SdkError> {
        let email = normalize_email(email);
        let (uid, hash) = self
            .find_by_email(&email)
            .await?
            .ok_or(SdkError::InvalidCredentials)?;

        if !Self::password_matches(password, hash).await? {
            tracing::debug!(uid = %uid, "Password mismatch");
            return Err(SdkError::InvalidCredentials);
        }

        let now = Utc::now();
        self.prune_sessions(now).await?;

        let token = uuid::Uuid::new_v4().simple().to_string();
        let expires_at = now + self.session_ttl;

        let mut fields = Fields::new();
        fields.insert("uid".to_string(), Value::String(uid.clone()));
        fields.insert(
            "expires_at".to_string(),
            Value::String(expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        self.store.set(SESSIONS, &token, fields).await?;

        Ok(AuthSession {
            uid,
            email,
            token,
            expires_at,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<String, SdkError> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(SdkError::Config(format!("invalid email address: {}", email)));
        }
        check_password(password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(SdkError::EmailExists(email));
        }

        let mut fields = Fields::new();
        fields.insert("email".to_string(), Value::String(email.clone()));
        fields.insert("password_hash".to_string(), Value::String(self.hash(password).await?));
        let uid = self.store.add(CREDENTIALS, fields).await?;

        tracing::info!(uid = %uid, "Account created");
        Ok(uid)
    }

    async fn verify(&self, token: &str) -> Result<String, SdkError> {
        let doc = self
            .store
            .get(SESSIONS, token)
            .await?
            .ok_or(SdkError::InvalidToken)?;

        let expires_at = doc
            .get("expires_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .ok_or(SdkError::InvalidToken)?;
        if expires_at.with_timezone(&Utc) <= Utc::now() {
            self.store.delete(SESSIONS, token).await?;
            return Err(SdkError::InvalidToken);
        }

        doc.get("uid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(SdkError::InvalidToken)
    }

    async fn update_password(&self, uid: &str, password: &str) -> Result<(), SdkError> {
        check_password(password)?;

        let mut fields = Fields::new();
        fields.insert("password_hash".to_string(), Value::String(self.hash(password).await?));
        self.store.update(CREDENTIALS, uid, fields).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), SdkError> {
        self.store.delete(SESSIONS, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::SqliteStore;

    fn auth() -> LocalAuth {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::in_memory().unwrap());
        LocalAuth::new(store).with_cost(4)
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let auth = auth();
        let uid = auth.sign_up("Ayu@Example.com", "rahasia1").await.unwrap();

        let session = auth.sign_in("ayu@example.com", "rahasia1").await.unwrap();
        assert_eq!(session.uid, uid);
        assert_eq!(session.email, "ayu@example.com");
        assert_eq!(auth.verify(&session.token).await.unwrap(), uid);
    }

    #[tokio::test]
    async fn test_rejections() {
        let auth = auth();
        auth.sign_up("ayu@example.com", "rahasia1").await.unwrap();

        assert!(matches!(
            auth.sign_up("ayu@example.com", "another1").await,
            Err(SdkError::EmailExists(_))
        ));
        assert!(matches!(
            auth.sign_up("budi@example.com", "123").await,
            Err(SdkError::WeakPassword(_))
        ));
        assert!(matches!(
            auth.sign_in("ayu@example.com", "wrong-pass").await,
            Err(SdkError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("nobody@example.com", "rahasia1").await,
            Err(SdkError::InvalidCredentials)
        ));
        assert!(matches!(auth.verify("bogus").await, Err(SdkError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_expired_session() {
        let auth = auth().with_session_ttl(Duration::seconds(-1));
        auth.sign_up("ayu@example.com", "rahasia1").await.unwrap();
        let session = auth.sign_in("ayu@example.com", "rahasia1").await.unwrap();
        assert!(matches!(auth.verify(&session.token).await, Err(SdkError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_update_password() {
        let auth = auth();
        let uid = auth.sign_up("ayu@example.com", "rahasia1").await.unwrap();
        auth.update_password(&uid, "baru12345").await.unwrap();

        assert!(auth.sign_in("ayu@example.com", "rahasia1").await.is_err());
        assert!(auth.sign_in("ayu@example.com", "baru12345").await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_in_prunes_expired_sessions() {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let stale = LocalAuth::new(Arc::clone(&store))
            .with_cost(4)
            .with_session_ttl(Duration::seconds(-1));
        stale.sign_up("ayu@example.com", "rahasia1").await.unwrap();
        let old = stale.sign_in("ayu@example.com", "rahasia1").await.unwrap();
        assert!(store.get(SESSIONS, &old.token).await.unwrap().is_some());

        let auth = LocalAuth::new(Arc::clone(&store)).with_cost(4);
        let fresh = auth.sign_in("ayu@example.com", "rahasia1").await.unwrap();

        let sessions = store.query(&Query::collection(SESSIONS)).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, fresh.token);
    }

    #[tokio::test]
    async fn test_sign_out() {
        let auth = auth();
        let uid = auth.sign_up("ayu@example.com", "rahasia1").await.unwrap();
        let session = auth.sign_in("ayu@example.com", "rahasia1").await.unwrap();
        assert_eq!(auth.verify(&session.token).await.unwrap(), uid);

        auth.sign_out(&session.token).await.unwrap();
        assert!(matches!(auth.verify(&session.token).await, Err(SdkError::InvalidToken)));
        auth.sign_out(&session.token).await.unwrap();
    }
}
