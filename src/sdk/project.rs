//! Firebase project identity
//!
//! The same fields the browser SDK is initialised with. Only `api_key` and
//! `project_id` are needed by the REST back ends; the rest are passed through
//! to the front end.

use serde::{Deserialize, Serialize};

use super::SdkError;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub measurement_id: String,
}

impl ProjectConfig {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            api_key: api_key.into(),
            auth_domain: format!("{}.firebaseapp.com", project_id),
            storage_bucket: format!("{}.appspot.com", project_id),
            project_id,
            ..Default::default()
        }
    }

    /// Check the fields the REST back ends need
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.api_key.trim().is_empty() {
            return Err(SdkError::Config("firebase.api_key is empty".to_string()));
        }
        if self.project_id.trim().is_empty() {
            return Err(SdkError::Config("firebase.project_id is empty".to_string()));
        }
        Ok(())
    }

    /// `accounts:<method>` endpoint of the identity toolkit
    pub fn accounts_url(&self, method: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            IDENTITY_TOOLKIT_URL, method, self.api_key
        )
    }

    /// Root of the default database's documents
    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            FIRESTORE_URL, self.project_id
        )
    }

    /// Resource name of a document, as used in `runQuery` results
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!(
            "projects/{}/databases/(default)/documents/{}/{}",
            self.project_id, collection, id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ProjectConfig::default().validate().is_err());
        assert!(ProjectConfig::new("key", "").validate().is_err());
        assert!(ProjectConfig::new("key", "daya-iot").validate().is_ok());
    }

    #[test]
    fn test_urls() {
        let project = ProjectConfig::new("abc", "daya-iot");
        assert_eq!(project.auth_domain, "daya-iot.firebaseapp.com");
        assert_eq!(
            project.accounts_url("signInWithPassword"),
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=abc"
        );
        assert_eq!(
            project.documents_url(),
            "https://firestore.googleapis.com/v1/projects/daya-iot/databases/(default)/documents"
        );
        assert!(project.document_name("rooms", "r1").ends_with("/documents/rooms/r1"));
    }
}
