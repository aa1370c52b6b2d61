//! Base repository trait for database operations.

use crate::db::errors::Result;

/// CRUD surface shared by the content and account repositories.
///
/// Each implementor owns one table family. `list` and `count` take the same filter so handlers can
/// build pagination metadata from a single filter value.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list and count operations
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// One page of entities matching the filter
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Total number of entities matching the filter, ignoring its page window
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64>;

    /// Returns false when no row had this id
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
