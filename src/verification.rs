use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use tokio::sync::RwLock;

use crate::{db::DbPool, error::AppResult};

pub const CODE_MIN: u32 = 100_000;
pub const CODE_MAX: u32 = 999_999;

/// A registration waiting for its SMS code. Keyed by canonical phone.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PendingVerification {
    pub phone: String,
    pub code: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// Six-digit code drawn uniformly from `CODE_MIN..=CODE_MAX`.
pub fn generate_code() -> String {
    let span = CODE_MAX - CODE_MIN + 1;
    // reject the tail of the u32 range so the modulo stays uniform
    let zone = u32::MAX - (u32::MAX % span);
    loop {
        let n = OsRng.next_u32();
        if n < zone {
            return (CODE_MIN + n % span).to_string();
        }
    }
}

#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Insert or replace the pending record for `pending.phone`.
    async fn put(&self, pending: PendingVerification) -> AppResult<()>;
    async fn get(&self, phone: &str) -> AppResult<Option<PendingVerification>>;
    async fn remove(&self, phone: &str) -> AppResult<()>;
}

/// Process-local store. Only correct for a single server instance.
#[derive(Default)]
pub struct InMemoryVerificationStore {
    entries: RwLock<HashMap<String, PendingVerification>>,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn put(&self, pending: PendingVerification) -> AppResult<()> {
        self.entries
            .write()
            .await
            .insert(pending.phone.clone(), pending);
        Ok(())
    }

    async fn get(&self, phone: &str) -> AppResult<Option<PendingVerification>> {
        Ok(self.entries.read().await.get(phone).cloned())
    }

    async fn remove(&self, phone: &str) -> AppResult<()> {
        self.entries.write().await.remove(phone);
        Ok(())
    }
}

/// Store backed by the `pending_verifications` table, shared by every instance.
pub struct PgVerificationStore {
    pool: DbPool,
}

impl PgVerificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationStore for PgVerificationStore {
    async fn put(&self, pending: PendingVerification) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pending_verifications (phone, code, name, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (phone) DO UPDATE
            SET code = EXCLUDED.code,
                name = EXCLUDED.name,
                password_hash = EXCLUDED.password_hash,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&pending.phone)
        .bind(&pending.code)
        .bind(&pending.name)
        .bind(&pending.password_hash)
        .bind(pending.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, phone: &str) -> AppResult<Option<PendingVerification>> {
        let row = sqlx::query_as::<_, PendingVerification>(
            "SELECT phone, code, name, password_hash, created_at FROM pending_verifications WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn remove(&self, phone: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM pending_verifications WHERE phone = $1")
            .bind(phone)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(phone: &str, code: &str, created_at: DateTime<Utc>) -> PendingVerification {
        PendingVerification {
            phone: phone.into(),
            code: code.into(),
            name: "Ana".into(),
            password_hash: "hash".into(),
            created_at,
        }
    }

    #[test]
    fn codes_are_six_digits_in_range() {
        for _ in 0..500 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((CODE_MIN..=CODE_MAX).contains(&n));
        }
    }

    #[test]
    fn expiry_is_strictly_after_ttl() {
        let created = Utc::now();
        let record = pending("+525512345678", "123456", created);
        let ttl = Duration::minutes(5);
        assert!(!record.is_expired_at(created + Duration::minutes(5), ttl));
        assert!(record.is_expired_at(created + Duration::minutes(5) + Duration::seconds(1), ttl));
    }

    #[tokio::test]
    async fn newer_registration_overwrites_pending_entry() {
        let store = InMemoryVerificationStore::new();
        let phone = "+525512345678";
        store.put(pending(phone, "111111", Utc::now())).await.unwrap();
        store.put(pending(phone, "222222", Utc::now())).await.unwrap();

        let current = store.get(phone).await.unwrap().unwrap();
        assert_eq!(current.code, "222222");

        store.remove(phone).await.unwrap();
        assert!(store.get(phone).await.unwrap().is_none());
    }
}
