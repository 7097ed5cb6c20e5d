//! User accounts and profiles

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{DomainError, DomainResult, USERS};
use crate::sdk::{to_fields, AuthProvider, AuthSession, DocumentStore, Query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "pemilik")]
    Owner,
    #[serde(alias = "penghuni")]
    Tenant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Tenant => "tenant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "id")]
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Clone)]
pub struct UserService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { auth, store }
    }

    /// Create the account and its profile
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> DomainResult<UserProfile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("name is required".to_string()));
        }

        let uid = self.auth.sign_up(email, password).await?;
        let profile = UserProfile {
            uid,
            name: name.to_string(),
            email: email.trim().to_lowercase(),
            role,
        };
        self.save(&profile).await?;

        tracing::info!(uid = %profile.uid, role = profile.role.as_str(), "User registered");
        Ok(profile)
    }

    pub async fn login(&self, email: &str, password: &str) -> DomainResult<(AuthSession, UserProfile)> {
        let session = self.auth.sign_in(email, password).await?;
        let profile = self.profile(&session.uid).await?;
        Ok((session, profile))
    }

    /// Resolve a bearer token to its profile
    pub async fn authenticate(&self, token: &str) -> DomainResult<UserProfile> {
        let uid = self.auth.verify(token).await?;
        self.profile(&uid).await
    }

    pub async fn logout(&self, token: &str) -> DomainResult<()> {
        self.auth.sign_out(token).await?;
        Ok(())
    }

    pub async fn profile(&self, uid: &str) -> DomainResult<UserProfile> {
        self.store
            .get(USERS, uid)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user data for {}", uid)))?
            .decode()
            .map_err(DomainError::from)
    }

    pub async fn rename(&self, uid: &str, name: &str) -> DomainResult<UserProfile> {
        let mut profile = self.profile(uid).await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("name is required".to_string()));
        }
        profile.name = name.to_string();
        self.save(&profile).await?;
        Ok(profile)
    }

    pub async fn change_password(&self, uid: &str, password: &str) -> DomainResult<()> {
        self.auth.update_password(uid, password).await?;
        tracing::info!(uid = %uid, "Password changed");
        Ok(())
    }

    /// Every tenant, by name
    pub async fn tenants(&self) -> DomainResult<Vec<UserProfile>> {
        let query = Query::collection(USERS).where_eq("role", Role::Tenant.as_str());
        let mut tenants = self
            .store
            .query(&query)
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect::<Result<Vec<UserProfile>, _>>()?;
        tenants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tenants)
    }

    async fn save(&self, profile: &UserProfile) -> DomainResult<()> {
        let mut fields = to_fields(profile)?;
        fields.remove("uid");
        self.store.set(USERS, &profile.uid, fields).await?;
        Ok(())
    }
}
