//! In-process table with the same contract as [`DynamoTable`](super::DynamoTable).
//!
//! Records are marshalled through the same codec as the DynamoDB backend so
//! shape errors surface identically.

use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use super::{
    codec::{from_item, from_items, to_item, Item},
    dynamo::MAX_BATCH_WRITE,
    error::{DatabaseError, Result},
    key::{Filter, Key, KeyCondition},
    Table,
};

/// Key attribute names of a table or one of its indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub partition: String,
    pub sort: Option<String>,
}

impl KeySchema {
    pub fn partition(name: impl Into<String>) -> Self {
        Self {
            partition: name.into(),
            sort: None,
        }
    }

    pub fn with_sort(mut self, name: impl Into<String>) -> Self {
        self.sort = Some(name.into());
        self
    }

    fn check_key(&self, key: &Key) -> Result<()> {
        let sort_name = key.sort.as_ref().map(|s| s.name.as_str());
        if key.partition.name != self.partition || sort_name != self.sort.as_deref() {
            return Err(DatabaseError::InvalidRequest(
                "key does not match the table key schema".into(),
            ));
        }
        Ok(())
    }

    fn check_condition(&self, condition: &KeyCondition) -> Result<()> {
        let sort_name = condition.sort_prefix.as_ref().map(|attr| attr.name.as_str());
        let sort_ok = match sort_name {
            None => true,
            Some(name) => self.sort.as_deref() == Some(name),
        };
        if condition.partition.name != self.partition || !sort_ok {
            return Err(DatabaseError::InvalidRequest(
                "key condition does not match the key schema".into(),
            ));
        }
        Ok(())
    }

    fn primary_key(&self, item: &Item) -> Result<(String, Option<String>)> {
        let read = |name: &str| {
            item.get(name)
                .and_then(|v| v.as_s().ok())
                .cloned()
                .ok_or_else(|| {
                    DatabaseError::InvalidRequest(format!("record is missing key attribute {name}"))
                })
        };
        let partition = read(self.partition.as_str())?;
        let sort = self.sort.as_deref().map(read).transpose()?;
        Ok((partition, sort))
    }

    fn sort_value<'a>(&self, item: &'a Item) -> &'a str {
        self.sort
            .as_deref()
            .and_then(|name| item.get(name))
            .and_then(|v| v.as_s().ok())
            .map_or("", String::as_str)
    }
}

/// [`Table`] kept in memory, for local development and tests.
pub struct MemoryTable<T> {
    schema: KeySchema,
    indexes: HashMap<String, KeySchema>,
    items: Arc<RwLock<Vec<Item>>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for MemoryTable<T> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            indexes: self.indexes.clone(),
            items: Arc::clone(&self.items),
            _record: PhantomData,
        }
    }
}

impl<T> MemoryTable<T> {
    pub fn new(schema: KeySchema) -> Self {
        Self {
            schema,
            indexes: HashMap::new(),
            items: Arc::new(RwLock::new(Vec::new())),
            _record: PhantomData,
        }
    }

    pub fn with_index(mut self, name: impl Into<String>, schema: KeySchema) -> Self {
        self.indexes.insert(name.into(), schema);
        self
    }

    /// Same stored items and schemas, read and written as records of `U`.
    /// One table holds several record shapes.
    pub fn share<U>(&self) -> MemoryTable<U> {
        MemoryTable {
            schema: self.schema.clone(),
            indexes: self.indexes.clone(),
            items: Arc::clone(&self.items),
            _record: PhantomData,
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    fn sorted(schema: &KeySchema, mut items: Vec<Item>) -> Vec<Item> {
        items.sort_by(|a, b| schema.sort_value(a).cmp(schema.sort_value(b)));
        items
    }
}

#[async_trait]
impl<T> Table<T> for MemoryTable<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &Key) -> Result<Option<T>> {
        self.schema.check_key(key)?;
        let wanted = key.to_item();
        let items = self.items.read().await;
        items
            .iter()
            .find(|item| wanted.iter().all(|(name, value)| item.get(name) == Some(value)))
            .cloned()
            .map(from_item::<T>)
            .transpose()
    }

    async fn create(&self, record: &T) -> Result<()> {
        let item = to_item(record)?;
        let key = self.schema.primary_key(&item)?;

        let mut items = self.items.write().await;
        if items
            .iter()
            .any(|stored| self.schema.primary_key(stored).ok().as_ref() == Some(&key))
        {
            return Err(DatabaseError::AlreadyExists);
        }
        items.push(item);
        Ok(())
    }

    async fn write(&self, records: &[T]) -> Result<()> {
        if records.len() > MAX_BATCH_WRITE {
            return Err(DatabaseError::InvalidRequest(format!(
                "batch of {} records exceeds the limit of {MAX_BATCH_WRITE}",
                records.len()
            )));
        }

        let mut batch = Vec::with_capacity(records.len());
        for record in records {
            let item = to_item(record)?;
            let key = self.schema.primary_key(&item)?;
            if batch.iter().any(|(k, _)| *k == key) {
                return Err(DatabaseError::InvalidRequest(
                    "batch contains duplicate keys".into(),
                ));
            }
            batch.push((key, item));
        }

        let mut items = self.items.write().await;
        for (key, item) in batch {
            let existing = items
                .iter()
                .position(|stored| self.schema.primary_key(stored).ok().as_ref() == Some(&key));
            match existing {
                Some(i) => items[i] = item,
                None => items.push(item),
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.schema.check_key(key)?;
        let wanted = key.to_item();
        let mut items = self.items.write().await;
        items.retain(|item| !wanted.iter().all(|(name, value)| item.get(name) == Some(value)));
        Ok(())
    }

    async fn query(&self, condition: &KeyCondition) -> Result<Vec<T>> {
        self.schema.check_condition(condition)?;
        let matched = {
            let items = self.items.read().await;
            items
                .iter()
                .filter(|item| condition.matches(item))
                .cloned()
                .collect()
        };
        from_items(Self::sorted(&self.schema, matched))
    }

    async fn query_with_index(
        &self,
        index: &str,
        condition: &KeyCondition,
        filter: &Filter,
    ) -> Result<Vec<T>> {
        let schema = self
            .indexes
            .get(index)
            .ok_or_else(|| DatabaseError::InvalidRequest(format!("unknown index {index}")))?;
        schema.check_condition(condition)?;
        let matched = {
            let items = self.items.read().await;
            items
                .iter()
                .filter(|item| condition.matches(item) && filter.matches(item))
                .cloned()
                .collect()
        };
        from_items(Self::sorted(schema, matched))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Row {
        #[serde(rename = "PK")]
        pk: String,
        #[serde(rename = "SK")]
        sk: String,
        label: String,
    }

    fn row(pk: &str, sk: &str, label: &str) -> Row {
        Row {
            pk: pk.into(),
            sk: sk.into(),
            label: label.into(),
        }
    }

    fn table() -> MemoryTable<Row> {
        MemoryTable::new(KeySchema::partition("PK").with_sort("SK"))
            .with_index("BY_SK", KeySchema::partition("SK").with_sort("PK"))
    }

    #[tokio::test]
    async fn get_missing_record_is_none_not_error() {
        let t = table();
        let got = t
            .get(&Key::partition("PK", "TRIP#1").with_sort("SK", "TRIP#1"))
            .await
            .expect("get should not fail");
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn write_then_get_and_overwrite() {
        let t = table();
        t.write(&[row("TRIP#1", "TRIP#1", "first")]).await.unwrap();
        t.write(&[row("TRIP#1", "TRIP#1", "second")]).await.unwrap();
        assert_eq!(t.len().await, 1);

        let got = t
            .get(&Key::partition("PK", "TRIP#1").with_sort("SK", "TRIP#1"))
            .await
            .unwrap();
        assert_eq!(got.unwrap().label, "second");
    }

    #[tokio::test]
    async fn write_rejects_duplicates_and_writes_nothing() {
        let t = table();
        let err = t
            .write(&[row("A", "B", "x"), row("A", "B", "y")])
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRequest(_)));
        assert_eq!(t.len().await, 0);
    }

    #[tokio::test]
    async fn write_rejects_oversized_batches() {
        let t = table();
        let rows: Vec<Row> = (0..=MAX_BATCH_WRITE)
            .map(|i| row("USER#1", &format!("TRIP#{i}"), "x"))
            .collect();
        let err = t.write(&rows).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn create_refuses_to_overwrite() {
        let t = table();
        t.create(&row("A", "B", "first")).await.unwrap();
        let err = t.create(&row("A", "B", "second")).await.unwrap_err();
        assert_eq!(err, DatabaseError::AlreadyExists);

        let got = t
            .get(&Key::partition("PK", "A").with_sort("SK", "B"))
            .await
            .unwrap();
        assert_eq!(got.unwrap().label, "first");

        t.create(&row("A", "C", "sibling")).await.unwrap();
        assert_eq!(t.len().await, 2);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let t = table();
        t.write(&[row("A", "B", "x")]).await.unwrap();
        let key = Key::partition("PK", "A").with_sort("SK", "B");
        t.delete(&key).await.unwrap();
        t.delete(&key).await.unwrap();
        assert_eq!(t.len().await, 0);
    }

    #[tokio::test]
    async fn query_by_partition_and_prefix_in_sort_order() {
        let t = table();
        t.write(&[
            row("USER#1", "TRIP#b", "b"),
            row("USER#1", "PROFILE#1", "profile"),
            row("USER#1", "TRIP#a", "a"),
            row("USER#2", "TRIP#c", "c"),
        ])
        .await
        .unwrap();

        let found = t
            .query(&KeyCondition::partition("PK", "USER#1").sort_begins_with("SK", "TRIP"))
            .await
            .unwrap();
        let labels: Vec<_> = found.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["a", "b"]);

        let none = t
            .query(&KeyCondition::partition("PK", "USER#9"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn query_with_index_applies_filter() {
        let t = table();
        t.write(&[
            row("TRIP#1", "TRIP#1", "trip"),
            row("USER#1", "TRIP#1", "owner"),
            row("USER#2", "TRIP#1", "guest"),
            row("USER#2", "TRIP#2", "other"),
        ])
        .await
        .unwrap();

        let found = t
            .query_with_index(
                "BY_SK",
                &KeyCondition::partition("SK", "TRIP#1"),
                &Filter::begins_with("PK", "USER"),
            )
            .await
            .unwrap();
        let labels: Vec<_> = found.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["owner", "guest"]);
    }

    #[tokio::test]
    async fn shared_views_see_the_same_items() {
        #[derive(Debug, Serialize, Deserialize)]
        struct Other {
            #[serde(rename = "PK")]
            pk: String,
            #[serde(rename = "SK")]
            sk: String,
        }

        let rows = table();
        let others: MemoryTable<Other> = rows.share();
        others
            .write(&[Other {
                pk: "USER#1".into(),
                sk: "PROFILE#1".into(),
            }])
            .await
            .unwrap();
        rows.write(&[row("USER#1", "TRIP#1", "trip")]).await.unwrap();

        assert_eq!(rows.len().await, 2);
        let trips = rows
            .query(&KeyCondition::partition("PK", "USER#1").sort_begins_with("SK", "TRIP"))
            .await
            .unwrap();
        assert_eq!(trips.len(), 1);
    }

    #[tokio::test]
    async fn unknown_index_is_invalid_request() {
        let t = table();
        let err = t
            .query_with_index(
                "NOPE",
                &KeyCondition::partition("SK", "x"),
                &Filter::begins_with("PK", "y"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRequest(_)));
    }
}
