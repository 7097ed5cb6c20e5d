//! Monthly bills
//!
//! A room is billed for the kWh it used above its monthly limit. At most one
//! bill exists per room and month.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::power::PowerService;
use super::rooms::Room;
use super::users::{Role, UserProfile};
use super::{round_to, store_timestamp, DomainConfig, DomainError, DomainResult, Page, BILLS, ROOMS};
use crate::aggregate::MonthKey;
use crate::sdk::{to_fields, Direction, DocumentStore, Fields, Query};

/// Default price of one kWh above the limit
pub const RATE_PER_KWH: f64 = 1400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Issued, nothing uploaded yet
    Unpaid,
    /// Proof uploaded, waiting for the owner
    Pending,
    Paid,
    /// Proof refused; the tenant may upload again
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub fn accepts_proof(&self) -> bool {
        !matches!(self, PaymentStatus::Paid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    #[serde(default)]
    pub id: String,
    pub room_id: String,
    /// `YYYY-MM`
    pub month: String,
    pub kwh_over_limit: f64,
    pub total: f64,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_uploaded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BillFilter {
    pub room_id: Option<String>,
    pub month: Option<MonthKey>,
    pub page: usize,
}

#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn DocumentStore>,
    power: PowerService,
    config: DomainConfig,
}

impl BillingService {
    pub fn new(store: Arc<dyn DocumentStore>, config: DomainConfig) -> Self {
        Self {
            power: PowerService::new(Arc::clone(&store), config),
            store,
            config,
        }
    }

    pub async fn get(&self, id: &str) -> DomainResult<Bill> {
        self.store
            .get(BILLS, id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("bill {}", id)))?
            .decode()
            .map_err(DomainError::from)
    }

    /// Bill every room over its limit for the month containing `now`
    ///
    /// Returns how many bills were created.
    pub async fn generate_monthly_bills(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let month = self.config.local_month(now);
        let rooms: Vec<Room> = self
            .store
            .query(&Query::collection(ROOMS))
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect::<Result<_, _>>()?;

        let mut created = 0;
        for room in &rooms {
            let used = round_to(self.power.month_kwh(&room.id, month).await?, 3);
            if used <= room.limit_kwh {
                continue;
            }

            let existing = Query::collection(BILLS)
                .where_eq("room_id", room.id.as_str())
                .where_eq("month", month.iso())
                .limit(1);
            if !self.store.query(&existing).await?.is_empty() {
                tracing::debug!(room_id = %room.id, month = %month.iso(), "Bill already issued");
                continue;
            }

            let over = round_to(used - room.limit_kwh, 3);
            let bill = Bill {
                id: String::new(),
                room_id: room.id.clone(),
                month: month.iso(),
                kwh_over_limit: over,
                total: round_to(over * self.config.rate_per_kwh, 2),
                status: PaymentStatus::Unpaid,
                proof_url: None,
                proof_uploaded_at: None,
                created_at: now.trunc_subsecs(0),
            };
            self.store.add(BILLS, bill_fields(&bill)?).await?;
            created += 1;

            tracing::info!(
                room_id = %room.id,
                month = %bill.month,
                kwh_over_limit = over,
                total = bill.total,
                "Bill issued"
            );
        }

        Ok(created)
    }

    /// Bills visible to `user`, newest month first
    ///
    /// Tenants only ever see their own room's bills.
    pub async fn list(&self, user: &UserProfile, filter: &BillFilter) -> DomainResult<Page<Bill>> {
        let room_id = match user.role {
            Role::Owner => filter.room_id.clone(),
            Role::Tenant => match self.tenant_room(&user.uid).await? {
                Some(room) => Some(room.id),
                None => return Ok(Page::of(&[], filter.page, self.config.page_size)),
            },
        };

        let mut query = Query::collection(BILLS).order_by("month", Direction::Descending);
        if let Some(room) = room_id {
            query = query.where_eq("room_id", room);
        }
        if let Some(month) = filter.month {
            query = query.where_eq("month", month.iso());
        }

        let bills: Vec<Bill> = self
            .store
            .query(&query)
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect::<Result<_, _>>()?;
        Ok(Page::of(&bills, filter.page, self.config.page_size))
    }

    /// Most recent bill of a room
    pub async fn latest(&self, room_id: &str) -> DomainResult<Option<Bill>> {
        let query = Query::collection(BILLS)
            .where_eq("room_id", room_id)
            .order_by("month", Direction::Descending)
            .limit(1);
        match self.store.query(&query).await?.first() {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Owner decision on an uploaded proof
    pub async fn verify(&self, id: &str, accept: bool) -> DomainResult<Bill> {
        let mut bill = self.get(id).await?;
        bill.status = if accept {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Rejected
        };
        self.set_status(id, bill.status, Fields::new()).await?;

        tracing::info!(bill_id = %id, status = bill.status.as_str(), "Payment verified");
        Ok(bill)
    }

    /// Attach a payment proof; only the room's tenant may do this
    pub async fn upload_proof(&self, id: &str, tenant_id: &str, proof_url: &str) -> DomainResult<Bill> {
        let proof_url = proof_url.trim();
        if proof_url.is_empty() {
            return Err(DomainError::Validation("proof_url is required".to_string()));
        }

        let mut bill = self.get(id).await?;
        let owns_room = self
            .tenant_room(tenant_id)
            .await?
            .is_some_and(|room| room.id == bill.room_id);
        if !owns_room {
            return Err(DomainError::Forbidden("bill belongs to another room".to_string()));
        }
        if !bill.status.accepts_proof() {
            return Err(DomainError::Conflict(format!(
                "bill is {}, proof can no longer be uploaded",
                bill.status.as_str()
            )));
        }

        let now = Utc::now().trunc_subsecs(0);
        let mut extra = Fields::new();
        extra.insert("proof_url".to_string(), Value::String(proof_url.to_string()));
        extra.insert("proof_uploaded_at".to_string(), Value::String(store_timestamp(now)));
        self.set_status(id, PaymentStatus::Pending, extra).await?;

        bill.status = PaymentStatus::Pending;
        bill.proof_url = Some(proof_url.to_string());
        bill.proof_uploaded_at = Some(now);
        Ok(bill)
    }

    async fn set_status(&self, id: &str, status: PaymentStatus, mut fields: Fields) -> DomainResult<()> {
        fields.insert("status".to_string(), Value::String(status.as_str().to_string()));
        self.store.update(BILLS, id, fields).await?;
        Ok(())
    }

    async fn tenant_room(&self, tenant_id: &str) -> DomainResult<Option<Room>> {
        let query = Query::collection(ROOMS).where_eq("tenant_id", tenant_id).limit(1);
        match self.store.query(&query).await?.first() {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }
}

fn bill_fields(bill: &Bill) -> DomainResult<Fields> {
    let mut fields = to_fields(bill)?;
    fields.insert(
        "created_at".to_string(),
        Value::String(store_timestamp(bill.created_at)),
    );
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{services, utc};
    use crate::domain::RoomInput;

    fn room(number: &str, limit_kwh: f64) -> RoomInput {
        RoomInput {
            number: number.to_string(),
            tariff_per_kwh: 1400.0,
            limit_kwh,
        }
    }

    fn owner() -> UserProfile {
        UserProfile {
            uid: "owner".to_string(),
            name: "Owner".to_string(),
            email: "owner@example.com".to_string(),
            role: Role::Owner,
        }
    }

    #[tokio::test]
    async fn test_generate_bills_once_per_month() {
        let (_, rooms, power, billing) = services();
        let heavy = rooms.create(room("101", 1.0)).await.unwrap();
        let light = rooms.create(room("102", 5.0)).await.unwrap();

        // 2.5 kWh and 1 kWh in May (local)
        power.record(&heavy.id, 9_000_000.0, Some(utc("2024-05-03T01:00:00Z"))).await.unwrap();
        power.record(&light.id, 3_600_000.0, Some(utc("2024-05-03T01:00:00Z"))).await.unwrap();
        // April usage is ignored
        power.record(&light.id, 36_000_000.0, Some(utc("2024-04-03T01:00:00Z"))).await.unwrap();

        let now = utc("2024-05-20T05:00:00Z");
        assert_eq!(billing.generate_monthly_bills(now).await.unwrap(), 1);
        assert_eq!(billing.generate_monthly_bills(now).await.unwrap(), 0);

        let bill = billing.latest(&heavy.id).await.unwrap().unwrap();
        assert_eq!(bill.month, "2024-05");
        assert_eq!(bill.kwh_over_limit, 1.5);
        assert_eq!(bill.total, 2100.0);
        assert_eq!(bill.status, PaymentStatus::Unpaid);
        assert!(billing.latest(&light.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_proof_and_verification() {
        let (users, rooms, power, billing) = services();
        let tenant = users
            .register("Budi", "budi@example.com", "rahasia1", Role::Tenant)
            .await
            .unwrap();
        let r = rooms.create(room("101", 0.0)).await.unwrap();
        rooms.assign(&r.id, Some(&tenant.uid)).await.unwrap();
        power.record(&r.id, 3_600_000.0, Some(utc("2024-05-03T01:00:00Z"))).await.unwrap();
        billing.generate_monthly_bills(utc("2024-05-20T05:00:00Z")).await.unwrap();

        let bill = billing.latest(&r.id).await.unwrap().unwrap();
        assert!(matches!(
            billing.upload_proof(&bill.id, "someone-else", "https://x/proof.jpg").await,
            Err(DomainError::Forbidden(_))
        ));

        let pending = billing
            .upload_proof(&bill.id, &tenant.uid, "https://x/proof.jpg")
            .await
            .unwrap();
        assert_eq!(pending.status, PaymentStatus::Pending);

        let rejected = billing.verify(&bill.id, false).await.unwrap();
        assert_eq!(rejected.status, PaymentStatus::Rejected);
        billing
            .upload_proof(&bill.id, &tenant.uid, "https://x/proof-2.jpg")
            .await
            .unwrap();

        let paid = billing.verify(&bill.id, true).await.unwrap();
        assert_eq!(paid.status, PaymentStatus::Paid);
        assert_eq!(billing.get(&bill.id).await.unwrap().proof_url.as_deref(), Some("https://x/proof-2.jpg"));
        assert!(matches!(
            billing.upload_proof(&bill.id, &tenant.uid, "https://x/late.jpg").await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_list_scopes_tenants() {
        let (users, rooms, power, billing) = services();
        let tenant = users
            .register("Budi", "budi@example.com", "rahasia1", Role::Tenant)
            .await
            .unwrap();
        let mine = rooms.create(room("101", 0.0)).await.unwrap();
        let other = rooms.create(room("102", 0.0)).await.unwrap();
        rooms.assign(&mine.id, Some(&tenant.uid)).await.unwrap();

        for (room_id, at) in [
            (&mine.id, "2024-04-03T01:00:00Z"),
            (&mine.id, "2024-05-03T01:00:00Z"),
            (&other.id, "2024-05-03T01:00:00Z"),
        ] {
            power.record(room_id, 3_600_000.0, Some(utc(at))).await.unwrap();
        }
        billing.generate_monthly_bills(utc("2024-04-20T00:00:00Z")).await.unwrap();
        billing.generate_monthly_bills(utc("2024-05-20T00:00:00Z")).await.unwrap();

        let all = billing.list(&owner(), &BillFilter::default()).await.unwrap();
        assert_eq!(all.total_items, 3);
        assert_eq!(all.items[0].month, "2024-05");

        let may = BillFilter {
            month: MonthKey::new(2024, 5),
            ..BillFilter::default()
        };
        assert_eq!(billing.list(&owner(), &may).await.unwrap().total_items, 2);

        let own = billing.list(&tenant, &BillFilter::default()).await.unwrap();
        assert_eq!(own.total_items, 2);
        assert!(own.items.iter().all(|b| b.room_id == mine.id));
    }

    #[tokio::test]
    async fn test_verify_missing_bill() {
        let (.., billing) = services();
        assert!(matches!(billing.verify("nope", true).await, Err(DomainError::NotFound(_))));
    }
}
