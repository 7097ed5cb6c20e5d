//! Rooms
//!
//! A room number is unique and a tenant occupies at most one room.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{store_timestamp, DomainError, DomainResult, ROOMS};
use crate::sdk::{to_fields, Direction, DocumentStore, Fields, Query};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(default)]
    pub id: String,
    pub number: String,
    pub tariff_per_kwh: f64,
    /// Monthly allowance before billing starts
    #[serde(default)]
    pub limit_kwh: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub relay_on: bool,
    pub created_at: DateTime<Utc>,
}

/// Editable room fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoomInput {
    pub number: String,
    pub tariff_per_kwh: f64,
    #[serde(default)]
    pub limit_kwh: f64,
}

impl RoomInput {
    fn validate(&self) -> DomainResult<()> {
        if self.number.trim().is_empty() {
            return Err(DomainError::Validation("room number is required".to_string()));
        }
        if !self.tariff_per_kwh.is_finite() || self.tariff_per_kwh < 0.0 {
            return Err(DomainError::Validation(format!(
                "invalid tariff: {}",
                self.tariff_per_kwh
            )));
        }
        if !self.limit_kwh.is_finite() || self.limit_kwh < 0.0 {
            return Err(DomainError::Validation(format!("invalid limit: {}", self.limit_kwh)));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct RoomService {
    store: Arc<dyn DocumentStore>,
}

impl RoomService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Rooms in creation order
    pub async fn list(&self) -> DomainResult<Vec<Room>> {
        let query = Query::collection(ROOMS).order_by("created_at", Direction::Ascending);
        decode_all(&self.store.query(&query).await?)
    }

    pub async fn get(&self, id: &str) -> DomainResult<Room> {
        self.store
            .get(ROOMS, id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("room {}", id)))?
            .decode()
            .map_err(DomainError::from)
    }

    pub async fn create(&self, input: RoomInput) -> DomainResult<Room> {
        input.validate()?;
        let number = input.number.trim().to_string();
        self.ensure_number_free(&number, None).await?;

        let mut room = Room {
            id: String::new(),
            number,
            tariff_per_kwh: input.tariff_per_kwh,
            limit_kwh: input.limit_kwh,
            tenant_id: None,
            relay_on: false,
            created_at: Utc::now().trunc_subsecs(0),
        };
        room.id = self.store.add(ROOMS, room_fields(&room)?).await?;

        tracing::info!(room_id = %room.id, number = %room.number, "Room created");
        Ok(room)
    }

    pub async fn update(&self, id: &str, input: RoomInput) -> DomainResult<Room> {
        input.validate()?;
        let mut room = self.get(id).await?;
        let number = input.number.trim().to_string();
        self.ensure_number_free(&number, Some(id)).await?;

        room.number = number;
        room.tariff_per_kwh = input.tariff_per_kwh;
        room.limit_kwh = input.limit_kwh;

        let mut fields = Fields::new();
        fields.insert("number".to_string(), Value::String(room.number.clone()));
        fields.insert("tariff_per_kwh".to_string(), Value::from(room.tariff_per_kwh));
        fields.insert("limit_kwh".to_string(), Value::from(room.limit_kwh));
        self.store.update(ROOMS, id, fields).await?;

        Ok(room)
    }

    pub async fn delete(&self, id: &str) -> DomainResult<Room> {
        let room = self.get(id).await?;
        self.store.delete(ROOMS, id).await?;
        tracing::info!(room_id = %id, "Room deleted");
        Ok(room)
    }

    /// Put a tenant in a room, or empty it with `None`
    pub async fn assign(&self, id: &str, tenant_id: Option<&str>) -> DomainResult<Room> {
        let mut room = self.get(id).await?;

        match tenant_id.map(str::trim).filter(|t| !t.is_empty()) {
            None => {
                self.store.remove_field(ROOMS, id, "tenant_id").await?;
                room.tenant_id = None;
            }
            Some(tenant) => {
                if let Some(current) = self.room_of_tenant(tenant).await? {
                    if current.id != id {
                        return Err(DomainError::Conflict(format!(
                            "tenant already occupies room {}",
                            current.number
                        )));
                    }
                }
                let mut fields = Fields::new();
                fields.insert("tenant_id".to_string(), Value::String(tenant.to_string()));
                self.store.update(ROOMS, id, fields).await?;
                room.tenant_id = Some(tenant.to_string());
            }
        }

        Ok(room)
    }

    pub async fn set_relay(&self, id: &str, on: bool) -> DomainResult<Room> {
        let mut room = self.get(id).await?;
        let mut fields = Fields::new();
        fields.insert("relay_on".to_string(), Value::Bool(on));
        self.store.update(ROOMS, id, fields).await?;
        room.relay_on = on;

        tracing::info!(room_id = %id, relay_on = on, "Relay switched");
        Ok(room)
    }

    pub async fn room_of_tenant(&self, tenant_id: &str) -> DomainResult<Option<Room>> {
        let query = Query::collection(ROOMS).where_eq("tenant_id", tenant_id).limit(1);
        Ok(decode_all(&self.store.query(&query).await?)?.into_iter().next())
    }

    async fn ensure_number_free(&self, number: &str, except: Option<&str>) -> DomainResult<()> {
        let query = Query::collection(ROOMS).where_eq("number", number);
        let taken = self
            .store
            .query(&query)
            .await?
            .into_iter()
            .any(|doc| Some(doc.id.as_str()) != except);
        if taken {
            return Err(DomainError::Conflict(format!("room number {} is already used", number)));
        }
        Ok(())
    }
}

fn room_fields(room: &Room) -> DomainResult<Fields> {
    let mut fields = to_fields(room)?;
    fields.insert(
        "created_at".to_string(),
        Value::String(store_timestamp(room.created_at)),
    );
    Ok(fields)
}

fn decode_all(docs: &[crate::sdk::Document]) -> DomainResult<Vec<Room>> {
    docs.iter()
        .map(|doc| doc.decode().map_err(DomainError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::services;

    fn input(number: &str) -> RoomInput {
        RoomInput {
            number: number.to_string(),
            tariff_per_kwh: 1400.0,
            limit_kwh: 10.0,
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (_, rooms, ..) = services();
        let a = rooms.create(input("101")).await.unwrap();
        rooms.create(input("102")).await.unwrap();

        let listed = rooms.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a.id);
        assert_eq!(rooms.get(&a.id).await.unwrap().number, "101");
    }

    #[tokio::test]
    async fn test_duplicate_numbers_rejected() {
        let (_, rooms, ..) = services();
        let a = rooms.create(input("101")).await.unwrap();
        let b = rooms.create(input("102")).await.unwrap();

        assert!(matches!(rooms.create(input(" 101 ")).await, Err(DomainError::Conflict(_))));
        assert!(matches!(rooms.update(&b.id, input("101")).await, Err(DomainError::Conflict(_))));
        // keeping its own number is fine
        let updated = rooms.update(&a.id, RoomInput { limit_kwh: 20.0, ..input("101") }).await.unwrap();
        assert_eq!(updated.limit_kwh, 20.0);
    }

    #[tokio::test]
    async fn test_assign_one_room_per_tenant() {
        let (_, rooms, ..) = services();
        let a = rooms.create(input("101")).await.unwrap();
        let b = rooms.create(input("102")).await.unwrap();

        rooms.assign(&a.id, Some("u1")).await.unwrap();
        assert!(matches!(rooms.assign(&b.id, Some("u1")).await, Err(DomainError::Conflict(_))));
        assert_eq!(rooms.room_of_tenant("u1").await.unwrap().unwrap().id, a.id);

        let emptied = rooms.assign(&a.id, Some("")).await.unwrap();
        assert!(emptied.tenant_id.is_none());
        assert!(rooms.get(&a.id).await.unwrap().tenant_id.is_none());
        rooms.assign(&b.id, Some("u1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_relay_and_delete() {
        let (_, rooms, ..) = services();
        let room = rooms.create(input("101")).await.unwrap();
        assert!(rooms.set_relay(&room.id, true).await.unwrap().relay_on);
        assert!(rooms.get(&room.id).await.unwrap().relay_on);

        rooms.delete(&room.id).await.unwrap();
        assert!(matches!(rooms.get(&room.id).await, Err(DomainError::NotFound(_))));
        assert!(matches!(rooms.set_relay("nope", false).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_validation() {
        let (_, rooms, ..) = services();
        assert!(matches!(rooms.create(input("")).await, Err(DomainError::Validation(_))));
        let negative = RoomInput { limit_kwh: -1.0, ..input("103") };
        assert!(matches!(rooms.create(negative).await, Err(DomainError::Validation(_))));
    }
}
