//! Modification Request Repository
//!
//! At most one pending request exists per restaurant; storing a new one
//! replaces any previous request for the same listing.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{ModificationRequest, RestaurantId};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "modification_request";

#[derive(Clone)]
pub struct ModificationRequestRepository {
    base: BaseRepository,
}

impl ModificationRequestRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find the pending request for a restaurant
    pub async fn find_by_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> RepoResult<Option<ModificationRequest>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM modification_request WHERE restaurant_id = $rid LIMIT 1")
            .bind(("rid", restaurant_id.to_string()))
            .await?;
        let found: Vec<ModificationRequest> = result.take(0)?;
        Ok(found.into_iter().next())
    }

    /// Find a pending request colliding on name or tax id, optionally
    /// excluding the request of the restaurant being edited
    pub async fn find_duplicate(
        &self,
        name: &str,
        tax_id: &str,
        exclude_restaurant: Option<&RestaurantId>,
    ) -> RepoResult<Option<ModificationRequest>> {
        let mut result = match exclude_restaurant {
            Some(rid) => {
                self.base
                    .db()
                    .query(
                        "SELECT * FROM modification_request \
                         WHERE (name = $name OR tax_id = $tax_id) \
                         AND restaurant_id != $exclude LIMIT 1",
                    )
                    .bind(("name", name.to_string()))
                    .bind(("tax_id", tax_id.to_string()))
                    .bind(("exclude", rid.to_string()))
                    .await?
            }
            None => {
                self.base
                    .db()
                    .query(
                        "SELECT * FROM modification_request \
                         WHERE name = $name OR tax_id = $tax_id LIMIT 1",
                    )
                    .bind(("name", name.to_string()))
                    .bind(("tax_id", tax_id.to_string()))
                    .await?
            }
        };
        let found: Vec<ModificationRequest> = result.take(0)?;
        Ok(found.into_iter().next())
    }

    /// Store the request, replacing any previous one for the restaurant
    pub async fn replace_for_restaurant(
        &self,
        request: ModificationRequest,
    ) -> RepoResult<ModificationRequest> {
        self.delete_for_restaurant(&request.restaurant_id).await?;

        let created: Option<ModificationRequest> =
            self.base.db().create(TABLE).content(request).await?;
        created
            .ok_or_else(|| RepoError::Database("Failed to create modification request".to_string()))
    }

    /// Remove the pending request for a restaurant. Idempotent.
    pub async fn delete_for_restaurant(&self, restaurant_id: &RestaurantId) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE modification_request WHERE restaurant_id = $rid")
            .bind(("rid", restaurant_id.to_string()))
            .await?;
        Ok(())
    }
}
