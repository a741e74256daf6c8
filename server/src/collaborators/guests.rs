use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{ReservationError, Result};
use crate::models::guest::normalize_email;
use crate::models::{Guest, GuestIdentity};
use crate::store::StoreError;

/// Lookup-or-create of guest profiles. The profile store itself belongs to
/// the guest management side of the platform.
#[async_trait]
pub trait GuestDirectory: Send + Sync {
    /// Authenticated identities must already exist. Contact identities are
    /// matched by email and created on first use.
    async fn find_or_create(&self, identity: &GuestIdentity) -> Result<Guest>;

    async fn find_by_id(&self, id: Uuid) -> Result<Guest>;
}

fn validate_contact(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ReservationError::Validation("guest name is required".into()));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ReservationError::Validation(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PgGuestDirectory {
    pool: PgPool,
}

impl PgGuestDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestDirectory for PgGuestDirectory {
    async fn find_or_create(&self, identity: &GuestIdentity) -> Result<Guest> {
        match identity {
            GuestIdentity::Authenticated { guest_id } => self.find_by_id(*guest_id).await,
            GuestIdentity::Contact { name, email, phone } => {
                validate_contact(name, email)?;
                // The no-op update makes RETURNING yield the existing row too.
                let guest = sqlx::query_as::<_, Guest>(
                    r#"
                    INSERT INTO guests (id, name, email, phone, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
                    RETURNING id, name, email, phone, created_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(name.trim())
                .bind(normalize_email(email))
                .bind(phone)
                .bind(Utc::now())
                .fetch_one(&self.pool)
                .await
                .map_err(StoreError::from)?;
                Ok(guest)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Guest> {
        sqlx::query_as::<_, Guest>(
            "SELECT id, name, email, phone, created_at FROM guests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?
        .ok_or(ReservationError::GuestNotFound(id))
    }
}

#[derive(Clone, Default)]
pub struct MemoryGuestDirectory {
    guests: Arc<Mutex<HashMap<Uuid, Guest>>>,
}

impl MemoryGuestDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.guests.lock().await.len()
    }
}

#[async_trait]
impl GuestDirectory for MemoryGuestDirectory {
    async fn find_or_create(&self, identity: &GuestIdentity) -> Result<Guest> {
        match identity {
            GuestIdentity::Authenticated { guest_id } => self.find_by_id(*guest_id).await,
            GuestIdentity::Contact { name, email, phone } => {
                validate_contact(name, email)?;
                let email = normalize_email(email);
                let mut guests = self.guests.lock().await;
                if let Some(existing) = guests.values().find(|g| g.email == email) {
                    return Ok(existing.clone());
                }
                let guest = Guest {
                    id: Uuid::new_v4(),
                    name: name.trim().to_string(),
                    email,
                    phone: phone.clone(),
                    created_at: Utc::now(),
                };
                guests.insert(guest.id, guest.clone());
                Ok(guest)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Guest> {
        self.guests
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(ReservationError::GuestNotFound(id))
    }
}
