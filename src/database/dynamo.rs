use std::marker::PhantomData;

use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::{
    config::Region,
    types::{PutRequest, WriteRequest},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use super::{
    codec::{from_item, from_items, to_item, Item},
    PARTITION_KEY,
    error::{map_sdk_error, DatabaseError, Result},
    key::{Expression, Filter, Key, KeyCondition},
    Table,
};
use crate::config::DynamoConfig;

/// Upper bound DynamoDB accepts for a single `BatchWriteItem` call.
pub const MAX_BATCH_WRITE: usize = 25;

/// Build a client for the configured region, with an endpoint override and
/// static credentials when pointing at a local DynamoDB.
pub async fn connect(config: &DynamoConfig) -> anyhow::Result<Client> {
    let mut loader = defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key, secret_key, None, None, "static",
        ));
    }

    let shared = loader.load().await;
    Ok(Client::new(&shared))
}

/// [`Table`] backed by one DynamoDB table.
pub struct DynamoTable<T> {
    client: Client,
    table_name: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for DynamoTable<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            table_name: self.table_name.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> DynamoTable<T> {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            _record: PhantomData,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn query_all(
        &self,
        index: Option<&str>,
        condition: &KeyCondition,
        filter: Option<&Filter>,
    ) -> Result<Vec<Item>> {
        let mut expr = Expression::default();
        let key_condition = condition.render(&mut expr);
        let filter_expression = filter.map(|f| f.render(&mut expr));

        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .set_index_name(index.map(str::to_string))
                .key_condition_expression(&key_condition)
                .set_filter_expression(filter_expression.clone())
                .set_expression_attribute_names(Some(expr.names.clone()))
                .set_expression_attribute_values(Some(expr.values.clone()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(map_sdk_error("Query"))?;

            items.extend(output.items.unwrap_or_default());
            match output.last_evaluated_key {
                Some(last) if !last.is_empty() => start_key = Some(last),
                _ => break,
            }
        }

        debug!(
            table = %self.table_name,
            index = index.unwrap_or("-"),
            count = items.len(),
            "query completed"
        );
        Ok(items)
    }
}

#[async_trait]
impl<T> Table<T> for DynamoTable<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &Key) -> Result<Option<T>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key.to_item()))
            .send()
            .await
            .map_err(|e| {
                let err = map_sdk_error("GetItem")(e);
                error!(table = %self.table_name, error = %err, "get failed");
                err
            })?;

        output.item.map(from_item::<T>).transpose()
    }

    async fn create(&self, record: &T) -> Result<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(record)?))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", PARTITION_KEY)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(table = %self.table_name, "conditional put completed");
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                debug!(table = %self.table_name, "conditional put found an existing record");
                Err(DatabaseError::AlreadyExists)
            }
            Err(e) => {
                let err = map_sdk_error("PutItem")(e);
                error!(table = %self.table_name, error = %err, "conditional put failed");
                Err(err)
            }
        }
    }

    async fn write(&self, records: &[T]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        if records.len() > MAX_BATCH_WRITE {
            return Err(DatabaseError::InvalidRequest(format!(
                "batch of {} records exceeds the limit of {MAX_BATCH_WRITE}",
                records.len()
            )));
        }

        let mut requests = Vec::with_capacity(records.len());
        for record in records {
            let put = PutRequest::builder()
                .set_item(Some(to_item(record)?))
                .build()
                .map_err(|e| DatabaseError::Marshal(e.to_string()))?;
            requests.push(WriteRequest::builder().put_request(put).build());
        }

        let output = self
            .client
            .batch_write_item()
            .request_items(&self.table_name, requests)
            .send()
            .await
            .map_err(|e| {
                let err = map_sdk_error("BatchWriteItem")(e);
                error!(table = %self.table_name, error = %err, "batch write failed");
                err
            })?;

        let unprocessed = output
            .unprocessed_items
            .as_ref()
            .and_then(|pending| pending.get(&self.table_name))
            .map_or(0, Vec::len);
        if unprocessed > 0 {
            error!(table = %self.table_name, unprocessed, "batch write left items unprocessed");
            return Err(DatabaseError::backend(
                "BatchWriteItem",
                format!("{unprocessed} of {} records were not processed", records.len()),
            ));
        }

        debug!(table = %self.table_name, count = records.len(), "batch write completed");
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key.to_item()))
            .send()
            .await
            .map_err(map_sdk_error("DeleteItem"))?;
        Ok(())
    }

    async fn query(&self, condition: &KeyCondition) -> Result<Vec<T>> {
        from_items(self.query_all(None, condition, None).await?)
    }

    async fn query_with_index(
        &self,
        index: &str,
        condition: &KeyCondition,
        filter: &Filter,
    ) -> Result<Vec<T>> {
        from_items(self.query_all(Some(index), condition, Some(filter)).await?)
    }
}
