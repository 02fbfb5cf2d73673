//! Moderation Record Repository (append-only)

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{ModerationRecord, RestaurantId};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "moderation_record";

#[derive(Clone)]
pub struct ModerationRecordRepository {
    base: BaseRepository,
}

impl ModerationRecordRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Append one audit entry. Records are never mutated afterwards.
    pub async fn create(&self, record: ModerationRecord) -> RepoResult<ModerationRecord> {
        let created: Option<ModerationRecord> =
            self.base.db().create(TABLE).content(record).await?;
        created
            .ok_or_else(|| RepoError::Database("Failed to create moderation record".to_string()))
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, limit: u64) -> RepoResult<Vec<ModerationRecord>> {
        let records: Vec<ModerationRecord> = self
            .base
            .db()
            .query("SELECT * FROM moderation_record ORDER BY created_at DESC LIMIT $limit")
            .bind(("limit", limit))
            .await?
            .take(0)?;
        Ok(records)
    }

    /// Decision history for one restaurant, newest first
    pub async fn by_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> RepoResult<Vec<ModerationRecord>> {
        let records: Vec<ModerationRecord> = self
            .base
            .db()
            .query(
                "SELECT * FROM moderation_record \
                 WHERE restaurant_id = $rid ORDER BY created_at DESC",
            )
            .bind(("rid", restaurant_id.to_string()))
            .await?
            .take(0)?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ModerationDecision, RecordKind};
    use surrealdb::RecordId;
    use surrealdb::engine::local::Mem;

    async fn test_db() -> Surreal<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_append_and_query_by_restaurant() {
        let repo = ModerationRecordRepository::new(test_db().await);
        let rid = RecordId::from_table_key("restaurant", "abc");

        repo.create(ModerationRecord::new(
            "admin-1",
            rid.clone(),
            ModerationDecision::Approved,
            "looks good",
            RecordKind::Listing,
        ))
        .await
        .unwrap();

        repo.create(ModerationRecord::new(
            "admin-1",
            rid.clone(),
            ModerationDecision::Rejected,
            "tax id mismatch",
            RecordKind::Modification,
        ))
        .await
        .unwrap();

        let records = repo.by_restaurant(&rid).await.unwrap();
        assert_eq!(records.len(), 2);

        let other = RecordId::from_table_key("restaurant", "other");
        assert!(repo.by_restaurant(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let repo = ModerationRecordRepository::new(test_db().await);
        for i in 0..5 {
            repo.create(ModerationRecord::new(
                "admin-1",
                RecordId::from_table_key("restaurant", format!("r{i}")),
                ModerationDecision::Approved,
                "",
                RecordKind::Listing,
            ))
            .await
            .unwrap();
        }

        assert_eq!(repo.recent(3).await.unwrap().len(), 3);
    }
}
