//! Typed access to single-table DynamoDB storage.
//!
//! Domain services talk to a [`Table`] for their record type and never see
//! attribute maps or SDK request builders.

use async_trait::async_trait;

use error::Result;

mod codec;
mod dynamo;
mod error;
mod key;
mod memory;

pub use dynamo::{connect, DynamoTable};
pub use error::DatabaseError;
pub use key::{Filter, Key, KeyCondition};
pub use memory::{KeySchema, MemoryTable};

/// Primary partition key attribute of every table.
pub const PARTITION_KEY: &str = "PK";
/// Sort key attribute of composite-key tables.
pub const SORT_KEY: &str = "SK";

/// Operations available on one logical table holding records of type `T`.
#[async_trait]
pub trait Table<T>: Send + Sync {
    /// Fetch the record stored under `key`, `None` if there is none.
    async fn get(&self, key: &Key) -> Result<Option<T>>;

    /// Put `record` only if nothing is stored under its key yet; otherwise
    /// fail with [`DatabaseError::AlreadyExists`] and leave the stored record
    /// untouched.
    async fn create(&self, record: &T) -> Result<()>;

    /// Put every record in one batch request.
    async fn write(&self, records: &[T]) -> Result<()>;

    /// Remove the record under `key`. Deleting a missing record succeeds.
    async fn delete(&self, key: &Key) -> Result<()>;

    /// All records matching `condition`, in store order.
    async fn query(&self, condition: &KeyCondition) -> Result<Vec<T>>;

    /// As [`Table::query`] but evaluated against the secondary index `index`,
    /// then narrowed by `filter`.
    async fn query_with_index(
        &self,
        index: &str,
        condition: &KeyCondition,
        filter: &Filter,
    ) -> Result<Vec<T>>;
}
