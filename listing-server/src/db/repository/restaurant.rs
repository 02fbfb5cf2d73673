//! Restaurant Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Restaurant, RestaurantId};
use serde::Deserialize;
use shared::types::ListingStatus;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "restaurant";

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Clone)]
pub struct RestaurantRepository {
    base: BaseRepository,
}

impl RestaurantRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn parse_id(id: &str) -> RepoResult<RestaurantId> {
        id.parse::<RecordId>()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))
    }

    /// Find a restaurant by id with the default non-deleted filter
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Restaurant>> {
        let thing = Self::parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM $id WHERE is_deleted = false")
            .bind(("id", thing))
            .await?;
        let found: Vec<Restaurant> = result.take(0)?;
        Ok(found.into_iter().next())
    }

    /// Raw identity lookup, including soft-deleted records
    pub async fn find_by_id_raw(&self, id: &str) -> RepoResult<Option<Restaurant>> {
        let thing = Self::parse_id(id)?;
        let found: Option<Restaurant> = self.base.db().select(thing).await?;
        Ok(found)
    }

    /// Find a restaurant by slug (non-deleted)
    pub async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Restaurant>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM restaurant WHERE slug = $slug AND is_deleted = false LIMIT 1")
            .bind(("slug", slug.to_string()))
            .await?;
        let found: Vec<Restaurant> = result.take(0)?;
        Ok(found.into_iter().next())
    }

    /// Find a non-deleted record colliding on name or tax id, optionally
    /// excluding one restaurant (the one being edited)
    pub async fn find_duplicate(
        &self,
        name: &str,
        tax_id: &str,
        exclude: Option<&RestaurantId>,
    ) -> RepoResult<Option<Restaurant>> {
        let mut result = match exclude {
            Some(id) => {
                self.base
                    .db()
                    .query(
                        "SELECT * FROM restaurant \
                         WHERE (name = $name OR tax_id = $tax_id) \
                         AND is_deleted = false AND id != $exclude LIMIT 1",
                    )
                    .bind(("name", name.to_string()))
                    .bind(("tax_id", tax_id.to_string()))
                    .bind(("exclude", id.clone()))
                    .await?
            }
            None => {
                self.base
                    .db()
                    .query(
                        "SELECT * FROM restaurant \
                         WHERE (name = $name OR tax_id = $tax_id) \
                         AND is_deleted = false LIMIT 1",
                    )
                    .bind(("name", name.to_string()))
                    .bind(("tax_id", tax_id.to_string()))
                    .await?
            }
        };
        let found: Vec<Restaurant> = result.take(0)?;
        Ok(found.into_iter().next())
    }

    /// All records, including pending and soft-deleted (admin view)
    pub async fn find_all(&self) -> RepoResult<Vec<Restaurant>> {
        let restaurants: Vec<Restaurant> = self
            .base
            .db()
            .query("SELECT * FROM restaurant ORDER BY created_at")
            .await?
            .take(0)?;
        Ok(restaurants)
    }

    /// Approved, non-deleted records with offset pagination
    pub async fn find_approved(&self, offset: u64, limit: u64) -> RepoResult<Vec<Restaurant>> {
        let restaurants: Vec<Restaurant> = self
            .base
            .db()
            .query(
                "SELECT * FROM restaurant \
                 WHERE status = $status AND is_deleted = false \
                 ORDER BY created_at LIMIT $limit START $offset",
            )
            .bind(("status", ListingStatus::Approved))
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await?
            .take(0)?;
        Ok(restaurants)
    }

    /// Count of approved, non-deleted records
    pub async fn count_approved(&self) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS count FROM restaurant \
                 WHERE status = $status AND is_deleted = false GROUP ALL",
            )
            .bind(("status", ListingStatus::Approved))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.count).unwrap_or(0))
    }

    /// Pending, non-deleted records (moderation queue)
    pub async fn find_pending(&self) -> RepoResult<Vec<Restaurant>> {
        let restaurants: Vec<Restaurant> = self
            .base
            .db()
            .query(
                "SELECT * FROM restaurant \
                 WHERE status = $status AND is_deleted = false ORDER BY created_at",
            )
            .bind(("status", ListingStatus::Pending))
            .await?
            .take(0)?;
        Ok(restaurants)
    }

    /// Non-deleted records owned by the given user
    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<Restaurant>> {
        let restaurants: Vec<Restaurant> = self
            .base
            .db()
            .query(
                "SELECT * FROM restaurant \
                 WHERE user_id = $user_id AND is_deleted = false ORDER BY created_at",
            )
            .bind(("user_id", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(restaurants)
    }

    /// Slug projection of every approved, non-deleted record
    pub async fn approved_slugs(&self) -> RepoResult<Vec<String>> {
        let slugs: Vec<String> = self
            .base
            .db()
            .query(
                "SELECT VALUE slug FROM restaurant \
                 WHERE status = $status AND is_deleted = false",
            )
            .bind(("status", ListingStatus::Approved))
            .await?
            .take(0)?;
        Ok(slugs)
    }

    /// Create a new restaurant record
    pub async fn create(&self, data: Restaurant) -> RepoResult<Restaurant> {
        let created: Option<Restaurant> = self.base.db().create(TABLE).content(data).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create restaurant".to_string()))
    }

    /// Persist a full snapshot of an existing record (replace semantics)
    pub async fn save(&self, restaurant: &Restaurant) -> RepoResult<Restaurant> {
        let id = restaurant
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("Restaurant has no id".to_string()))?;

        let mut data = restaurant.clone();
        data.id = None;

        let updated: Option<Restaurant> = self.base.db().update(id).content(data).await?;
        updated.ok_or_else(|| RepoError::NotFound("Restaurant not found".to_string()))
    }

    /// Hard delete a record
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let thing = Self::parse_id(id)?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::RestaurantDetails;
    use shared::types::{Address, GeoPoint};
    use surrealdb::engine::local::Mem;

    async fn test_db() -> Surreal<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        db
    }

    fn details(name: &str, tax_id: &str) -> RestaurantDetails {
        RestaurantDetails {
            name: name.to_string(),
            tax_id: tax_id.to_string(),
            cuisine: vec!["spanish".to_string()],
            address: Address {
                country: "ES".to_string(),
                city: "Valencia".to_string(),
                street: "Carrer de la Pau 12".to_string(),
            },
            location: GeoPoint {
                longitude: -0.375,
                latitude: 39.47,
            },
            phone_number: "+34600111222".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_id() {
        let repo = RestaurantRepository::new(test_db().await);
        let created = repo
            .create(Restaurant::new("user-1", details("Casa Nova", "T1")))
            .await
            .unwrap();

        let id = created.id_string();
        let found = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.name, "Casa Nova");
        assert_eq!(found.slug, "casa-nova");
    }

    #[tokio::test]
    async fn test_find_duplicate_matches_name_or_tax_id() {
        let repo = RestaurantRepository::new(test_db().await);
        repo.create(Restaurant::new("user-1", details("Casa Nova", "T1")))
            .await
            .unwrap();

        let by_name = repo.find_duplicate("Casa Nova", "OTHER", None).await.unwrap();
        assert!(by_name.is_some());

        let by_tax = repo.find_duplicate("Other Name", "T1", None).await.unwrap();
        assert!(by_tax.is_some());

        let none = repo
            .find_duplicate("Other Name", "OTHER", None)
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_find_duplicate_excludes_self() {
        let repo = RestaurantRepository::new(test_db().await);
        let created = repo
            .create(Restaurant::new("user-1", details("Casa Nova", "T1")))
            .await
            .unwrap();

        let excluded = repo
            .find_duplicate("Casa Nova", "T1", created.id.as_ref())
            .await
            .unwrap();
        assert!(excluded.is_none());
    }

    #[tokio::test]
    async fn test_soft_deleted_hidden_from_default_lookup() {
        let repo = RestaurantRepository::new(test_db().await);
        let mut created = repo
            .create(Restaurant::new("user-1", details("Casa Nova", "T1")))
            .await
            .unwrap();

        created.is_deleted = true;
        repo.save(&created).await.unwrap();

        let id = created.id_string();
        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        assert!(repo.find_by_slug("casa-nova").await.unwrap().is_none());
        // Raw lookup still sees the record
        assert!(repo.find_by_id_raw(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_approved_pagination_and_count() {
        let repo = RestaurantRepository::new(test_db().await);
        for i in 0..3 {
            let mut restaurant =
                Restaurant::new("user-1", details(&format!("Place {i}"), &format!("T{i}")));
            restaurant.status = ListingStatus::Approved;
            repo.create(restaurant).await.unwrap();
        }
        repo.create(Restaurant::new("user-1", details("Pending Place", "TP")))
            .await
            .unwrap();

        assert_eq!(repo.count_approved().await.unwrap(), 3);
        assert_eq!(repo.find_approved(0, 2).await.unwrap().len(), 2);
        assert_eq!(repo.find_approved(2, 2).await.unwrap().len(), 1);
        assert_eq!(repo.find_pending().await.unwrap().len(), 1);
        assert_eq!(repo.approved_slugs().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_hard_delete() {
        let repo = RestaurantRepository::new(test_db().await);
        let created = repo
            .create(Restaurant::new("user-1", details("Casa Nova", "T1")))
            .await
            .unwrap();

        let id = created.id_string();
        repo.delete(&id).await.unwrap();
        assert!(repo.find_by_id_raw(&id).await.unwrap().is_none());
    }
}
