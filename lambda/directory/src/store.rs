use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::{types::AttributeValue, Client};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use thiserror::Error;

pub(crate) const USER_ID: &str = "userID";
pub(crate) const USER_DIR: &str = "userDir";

/// A DynamoDB item as returned by the SDK.
pub(crate) type Item = HashMap<String, AttributeValue>;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("put item failed: {0}")]
    PutItem(#[from] SdkError<PutItemError>),
    #[error("get item failed: {0}")]
    GetItem(#[from] SdkError<GetItemError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirectoryRecord {
    pub(crate) user_id: String,
    pub(crate) user_dir: String,
}

impl DirectoryRecord {
    pub(crate) fn to_item(&self) -> Item {
        let mut item = HashMap::new();
        item.insert(USER_ID.to_string(), AttributeValue::S(self.user_id.clone()));
        item.insert(USER_DIR.to_string(), AttributeValue::S(self.user_dir.clone()));
        item
    }
}

/// Single-item access to the directory table.
///
/// Implementations are shared across invocations and must be safe for
/// concurrent use.
#[async_trait]
pub(crate) trait DirectoryStore: Send + Sync {
    /// Inserts the record, overwriting any item with the same `userID`.
    async fn put_directory(&self, record: &DirectoryRecord) -> Result<(), StoreError>;

    /// Point lookup by `userID`. `None` when no item exists.
    async fn get_directory(&self, user_id: &str) -> Result<Option<Item>, StoreError>;
}

pub(crate) struct DynamoDirectoryStore {
    client: Client,
    table_name: String,
}

impl DynamoDirectoryStore {
    pub(crate) fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl DirectoryStore for DynamoDirectoryStore {
    async fn put_directory(&self, record: &DirectoryRecord) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record.to_item()))
            .send()
            .await?;

        Ok(())
    }

    async fn get_directory(&self, user_id: &str) -> Result<Option<Item>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(USER_ID, AttributeValue::S(user_id.to_string()))
            .send()
            .await?;

        Ok(output.item)
    }
}

/// Renders a lookup result in DynamoDB's wire shape: `{"Item": {..}}` when
/// found, `{}` otherwise.
///
/// This is the `GetItem` response body minus `ResponseMetadata`. Items stay
/// type-tagged and are not unwrapped into plain values.
pub(crate) fn lookup_to_json(item: Option<&Item>) -> Value {
    match item {
        Some(item) => json!({ "Item": item_to_json(item) }),
        None => json!({}),
    }
}

fn item_to_json(item: &Item) -> Value {
    let map: Map<String, Value> = item
        .iter()
        .map(|(name, value)| (name.clone(), attribute_to_json(value)))
        .collect();
    Value::Object(map)
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => json!({ "S": s }),
        AttributeValue::N(n) => json!({ "N": n }),
        AttributeValue::Bool(b) => json!({ "BOOL": b }),
        AttributeValue::Null(n) => json!({ "NULL": n }),
        AttributeValue::B(blob) => {
            json!({ "B": general_purpose::STANDARD.encode(blob.as_ref()) })
        }
        AttributeValue::Ss(values) => json!({ "SS": values }),
        AttributeValue::Ns(values) => json!({ "NS": values }),
        AttributeValue::Bs(blobs) => {
            let encoded: Vec<String> = blobs
                .iter()
                .map(|blob| general_purpose::STANDARD.encode(blob.as_ref()))
                .collect();
            json!({ "BS": encoded })
        }
        AttributeValue::L(values) => {
            let list: Vec<Value> = values.iter().map(attribute_to_json).collect();
            json!({ "L": list })
        }
        AttributeValue::M(map) => json!({ "M": item_to_json(map) }),
        other => {
            tracing::warn!(attribute = ?other, "unsupported attribute type rendered as NULL");
            json!({ "NULL": true })
        }
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-process table keyed by `userID` that counts every call it receives.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        items: Mutex<HashMap<String, Item>>,
        calls: AtomicUsize,
    }

    impl MemoryStore {
        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn len(&self) -> usize {
            self.items.lock().unwrap().len()
        }

        pub(crate) fn snapshot(&self) -> HashMap<String, Item> {
            self.items.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DirectoryStore for MemoryStore {
        async fn put_directory(&self, record: &DirectoryRecord) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.items
                .lock()
                .unwrap()
                .insert(record.user_id.clone(), record.to_item());
            Ok(())
        }

        async fn get_directory(&self, user_id: &str) -> Result<Option<Item>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.lock().unwrap().get(user_id).cloned())
        }
    }

    /// Store whose every call fails the way an unreachable table would.
    pub(crate) struct UnavailableStore;

    #[async_trait]
    impl DirectoryStore for UnavailableStore {
        async fn put_directory(&self, _record: &DirectoryRecord) -> Result<(), StoreError> {
            Err(StoreError::PutItem(SdkError::timeout_error("table unavailable")))
        }

        async fn get_directory(&self, _user_id: &str) -> Result<Option<Item>, StoreError> {
            Err(StoreError::GetItem(SdkError::timeout_error("table unavailable")))
        }
    }
}
