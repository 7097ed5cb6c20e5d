//! Firebase REST back ends
//!
//! Identity toolkit for accounts and Firestore for documents, both spoken
//! over HTTPS with the project's web api key.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::auth::{check_password, normalize_email, AuthProvider, AuthSession};
use super::store::{Direction, Document, DocumentStore, Fields, Query};
use super::{ProjectConfig, SdkError};

fn http_client(timeout_ms: u64) -> Result<Client, SdkError> {
    Ok(Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()?)
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Pass successful responses through, turn the rest into [`SdkError::Remote`]
async fn check(response: Response) -> Result<Response, SdkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(SdkError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// Map identity toolkit error codes onto the provider-neutral errors
fn auth_error(err: SdkError, email: &str) -> SdkError {
    let message = match &err {
        SdkError::Remote { message, .. } => message.clone(),
        _ => return err,
    };
    let code = message
        .split(|c: char| c == ' ' || c == ':')
        .next()
        .unwrap_or_default();
    match code {
        "EMAIL_EXISTS" => SdkError::EmailExists(email.to_string()),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            SdkError::InvalidCredentials
        }
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
            SdkError::InvalidToken
        }
        "WEAK_PASSWORD" => SdkError::WeakPassword(message.clone()),
        _ => err,
    }
}

// ============================================
// AUTH
// ============================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    #[serde(default)]
    expires_in: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

/// Firebase Authentication (email/password)
///
/// Password changes over REST need the user's id token, so the last token
/// seen for each uid is remembered.
pub struct FirebaseAuth {
    client: Client,
    project: ProjectConfig,
    tokens: RwLock<HashMap<String, String>>,
}

impl FirebaseAuth {
    pub fn new(project: ProjectConfig, timeout_ms: u64) -> Result<Self, SdkError> {
        project.validate()?;
        Ok(Self {
            client: http_client(timeout_ms)?,
            project,
            tokens: RwLock::new(HashMap::new()),
        })
    }

    async fn post(&self, method: &str, body: &Value) -> Result<Response, SdkError> {
        let response = self
            .client
            .post(self.project.accounts_url(method))
            .json(body)
            .send()
            .await
            .map_err(SdkError::from_transport)?;
        check(response).await
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuth {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, SdkError> {
        let email = normalize_email(email);
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let response: SignInResponse = self
            .post("signInWithPassword", &body)
            .await
            .map_err(|e| auth_error(e, &email))?
            .json()
            .await?;

        let ttl: i64 = response.expires_in.parse().unwrap_or(3600);
        self.tokens
            .write()
            .await
            .insert(response.local_id.clone(), response.id_token.clone());

        Ok(AuthSession {
            uid: response.local_id,
            email: if response.email.is_empty() { email } else { response.email },
            token: response.id_token,
            expires_at: Utc::now() + Duration::seconds(ttl),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<String, SdkError> {
        let email = normalize_email(email);
        check_password(password)?;

        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let response: SignUpResponse = self
            .post("signUp", &body)
            .await
            .map_err(|e| auth_error(e, &email))?
            .json()
            .await?;

        tracing::info!(uid = %response.local_id, "Firebase account created");
        Ok(response.local_id)
    }

    async fn verify(&self, token: &str) -> Result<String, SdkError> {
        let response: LookupResponse = self
            .post("lookup", &json!({ "idToken": token }))
            .await
            .map_err(|e| auth_error(e, ""))?
            .json()
            .await?;

        let uid = response
            .users
            .into_iter()
            .next()
            .map(|u| u.local_id)
            .ok_or(SdkError::InvalidToken)?;
        self.tokens.write().await.insert(uid.clone(), token.to_string());
        Ok(uid)
    }

    async fn update_password(&self, uid: &str, password: &str) -> Result<(), SdkError> {
        check_password(password)?;
        let token = self
            .tokens
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or(SdkError::InvalidToken)?;

        let body = json!({ "idToken": token, "password": password, "returnSecureToken": true });
        let response: SignInResponse = self
            .post("update", &body)
            .await
            .map_err(|e| auth_error(e, ""))?
            .json()
            .await?;

        // the old token is revoked by a password change
        self.tokens
            .write()
            .await
            .insert(uid.to_string(), response.id_token);
        Ok(())
    }

    /// Id tokens cannot be revoked over REST; forgetting the cached one is enough
    async fn sign_out(&self, token: &str) -> Result<(), SdkError> {
        self.tokens.write().await.retain(|_, cached| cached != token);
        Ok(())
    }
}

// ============================================
// FIRESTORE
// ============================================

/// Encode a JSON value as a Firestore typed value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Decode a Firestore typed value; unknown kinds become null
pub fn decode_value(typed: &Value) -> Value {
    let Some((kind, inner)) = typed.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "booleanValue" => inner.clone(),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "doubleValue" => inner.clone(),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|vs| vs.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))),
        "geoPointValue" => inner.clone(),
        _ => Value::Null,
    }
}

pub fn decode_fields(fields: Option<&Value>) -> Fields {
    fields
        .and_then(Value::as_object)
        .map(|o| o.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect())
        .unwrap_or_default()
}

#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

impl RawDocument {
    fn into_document(self) -> Document {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        Document::new(id, decode_fields(self.fields.as_ref()))
    }
}

#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

/// Build the `structuredQuery` body of `:runQuery`
pub fn structured_query(query: &Query) -> Value {
    let mut structured = Map::new();
    structured.insert(
        "from".to_string(),
        json!([{ "collectionId": query.collection }]),
    );

    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|f| {
            json!({ "fieldFilter": {
                "field": { "fieldPath": f.field },
                "op": f.op.as_firestore(),
                "value": encode_value(&f.value),
            }})
        })
        .collect();
    match filters.len() {
        0 => {}
        1 => {
            structured.insert("where".to_string(), filters[0].clone());
        }
        _ => {
            structured.insert(
                "where".to_string(),
                json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
            );
        }
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured.insert(
            "orderBy".to_string(),
            json!([{ "field": { "fieldPath": order.field }, "direction": direction }]),
        );
    }

    if let Some(limit) = query.limit {
        structured.insert("limit".to_string(), json!(limit));
    }

    json!({ "structuredQuery": structured })
}

/// Cloud Firestore over REST
pub struct FirestoreStore {
    client: Client,
    project: ProjectConfig,
}

impl FirestoreStore {
    pub fn new(project: ProjectConfig, timeout_ms: u64) -> Result<Self, SdkError> {
        project.validate()?;
        Ok(Self {
            client: http_client(timeout_ms)?,
            project,
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.project.documents_url(), collection, id)
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        mask: Option<Vec<String>>,
    ) -> Result<(), SdkError> {
        let mut params: Vec<(&str, String)> = vec![("key", self.project.api_key.clone())];
        if let Some(mask) = mask {
            params.push(("currentDocument.exists", "true".to_string()));
            params.extend(mask.into_iter().map(|f| ("updateMask.fieldPaths", f)));
        }

        let response = self
            .client
            .patch(self.document_url(collection, id))
            .query(&params)
            .json(&json!({ "fields": encode_fields(fields) }))
            .send()
            .await
            .map_err(SdkError::from_transport)?;

        match check(response).await {
            Err(SdkError::Remote { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(SdkError::not_found(collection, id))
            }
            other => other.map(|_| ()),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &'static str {
        "firestore"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, SdkError> {
        let response = self
            .client
            .get(self.document_url(collection, id))
            .query(&[("key", &self.project.api_key)])
            .send()
            .await
            .map_err(SdkError::from_transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawDocument = check(response).await?.json().await?;
        Ok(Some(raw.into_document()))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), SdkError> {
        self.patch(collection, id, &fields, None).await
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, SdkError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let response = self
            .client
            .post(format!("{}/{}", self.project.documents_url(), collection))
            .query(&[("key", self.project.api_key.as_str()), ("documentId", id.as_str())])
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await
            .map_err(SdkError::from_transport)?;
        check(response).await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), SdkError> {
        let mask = fields.keys().cloned().collect();
        self.patch(collection, id, &fields, Some(mask)).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), SdkError> {
        let response = self
            .client
            .delete(self.document_url(collection, id))
            .query(&[("key", &self.project.api_key)])
            .send()
            .await
            .map_err(SdkError::from_transport)?;
        check(response).await?;
        Ok(())
    }

    async fn remove_field(&self, collection: &str, id: &str, field: &str) -> Result<(), SdkError> {
        // a masked field absent from the body is deleted
        self.patch(collection, id, &Fields::new(), Some(vec![field.to_string()]))
            .await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, SdkError> {
        let response = self
            .client
            .post(format!("{}:runQuery", self.project.documents_url()))
            .query(&[("key", &self.project.api_key)])
            .json(&structured_query(query))
            .send()
            .await
            .map_err(SdkError::from_transport)?;

        let items: Vec<RunQueryItem> = check(response).await?.json().await?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(RawDocument::into_document)
            .collect())
    }

    async fn ping(&self) -> Result<(), SdkError> {
        let response = self
            .client
            .get(self.project.documents_url())
            .query(&[("key", self.project.api_key.as_str()), ("pageSize", "1")])
            .send()
            .await
            .map_err(SdkError::from_transport)?;

        if response.status().is_server_error() {
            return Err(SdkError::Unavailable);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::store::FieldFilter;

    #[test]
    fn test_value_encoding() {
        let fields = match json!({
            "number": "101",
            "limit_kwh": 12.5,
            "count": 3,
            "relay_on": true,
            "tenant_id": null,
            "tags": ["a"],
            "meta": {"floor": 1}
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let encoded = encode_fields(&fields);
        assert_eq!(encoded["number"], json!({"stringValue": "101"}));
        assert_eq!(encoded["limit_kwh"], json!({"doubleValue": 12.5}));
        assert_eq!(encoded["count"], json!({"integerValue": "3"}));
        assert_eq!(encoded["relay_on"], json!({"booleanValue": true}));
        assert_eq!(encoded["meta"]["mapValue"]["fields"]["floor"], json!({"integerValue": "1"}));

        assert_eq!(decode_fields(Some(&encoded)), fields);
    }

    #[test]
    fn test_decode_timestamp_as_string() {
        let decoded = decode_value(&json!({"timestampValue": "2024-05-01T01:00:00Z"}));
        assert_eq!(decoded, json!("2024-05-01T01:00:00Z"));
        assert_eq!(decode_value(&json!({})), Value::Null);
    }

    #[test]
    fn test_structured_query() {
        let query = Query::collection("bills")
            .filter(FieldFilter::eq("room_id", "r1"))
            .filter(FieldFilter::eq("month", "2024-05"))
            .order_by("month", Direction::Descending)
            .limit(1);
        let body = structured_query(&query);
        let structured = &body["structuredQuery"];

        assert_eq!(structured["from"][0]["collectionId"], "bills");
        assert_eq!(structured["where"]["compositeFilter"]["op"], "AND");
        assert_eq!(
            structured["where"]["compositeFilter"]["filters"][1]["fieldFilter"]["value"],
            json!({"stringValue": "2024-05"})
        );
        assert_eq!(structured["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(structured["limit"], 1);

        let single = structured_query(&Query::collection("rooms").where_eq("number", "101"));
        assert_eq!(single["structuredQuery"]["where"]["fieldFilter"]["op"], "EQUAL");
    }

    #[test]
    fn test_auth_error_mapping() {
        let remote = |m: &str| SdkError::Remote {
            status: 400,
            message: m.to_string(),
        };
        assert!(matches!(auth_error(remote("EMAIL_EXISTS"), "a@b.c"), SdkError::EmailExists(_)));
        assert!(matches!(
            auth_error(remote("INVALID_LOGIN_CREDENTIALS"), ""),
            SdkError::InvalidCredentials
        ));
        assert!(matches!(
            auth_error(remote("WEAK_PASSWORD : Password should be at least 6 characters"), ""),
            SdkError::WeakPassword(_)
        ));
        assert!(matches!(auth_error(remote("QUOTA_EXCEEDED"), ""), SdkError::Remote { .. }));
    }

    #[test]
    fn test_raw_document_id() {
        let raw = RawDocument {
            name: "projects/p/databases/(default)/documents/rooms/abc123".to_string(),
            fields: Some(json!({"number": {"stringValue": "101"}})),
        };
        let doc = raw.into_document();
        assert_eq!(doc.id, "abc123");
        assert_eq!(doc.get("number"), Some(&json!("101")));
    }

    #[test]
    fn test_requires_project() {
        assert!(matches!(
            FirestoreStore::new(ProjectConfig::default(), 1000),
            Err(SdkError::Config(_))
        ));
    }
}
