//! Key values and key/filter conditions for single-table access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use super::codec::Item;

/// Name/value pair of a string key attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub value: String,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Primary key of a single record: the partition attribute and, for tables
/// with a composite key, the sort attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub partition: KeyAttribute,
    pub sort: Option<KeyAttribute>,
}

impl Key {
    pub fn partition(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            partition: KeyAttribute::new(name, value),
            sort: None,
        }
    }

    pub fn with_sort(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.sort = Some(KeyAttribute::new(name, value));
        self
    }

    pub fn to_item(&self) -> Item {
        let mut item = HashMap::with_capacity(2);
        item.insert(
            self.partition.name.clone(),
            AttributeValue::S(self.partition.value.clone()),
        );
        if let Some(sort) = &self.sort {
            item.insert(sort.name.clone(), AttributeValue::S(sort.value.clone()));
        }
        item
    }
}

/// Partition equality optionally narrowed by a sort key prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCondition {
    pub partition: KeyAttribute,
    pub sort_prefix: Option<KeyAttribute>,
}

impl KeyCondition {
    pub fn partition(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            partition: KeyAttribute::new(name, value),
            sort_prefix: None,
        }
    }

    pub fn sort_begins_with(mut self, name: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.sort_prefix = Some(KeyAttribute::new(name, prefix));
        self
    }

    pub fn matches(&self, item: &Item) -> bool {
        attribute_equals(item, &self.partition)
            && self
                .sort_prefix
                .as_ref()
                .map_or(true, |attr| attribute_begins_with(item, attr))
    }

    pub(crate) fn render(&self, expr: &mut Expression) -> String {
        let (pk_name, pk_value) = expr.bind("pk", &self.partition);
        match &self.sort_prefix {
            None => format!("{pk_name} = {pk_value}"),
            Some(attr) => {
                let (sk_name, sk_value) = expr.bind("sk", attr);
                format!("{pk_name} = {pk_value} AND begins_with({sk_name}, {sk_value})")
            }
        }
    }
}

/// Prefix filter on one attribute, evaluated after the key condition
/// selected candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub prefix: KeyAttribute,
}

impl Filter {
    pub fn begins_with(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            prefix: KeyAttribute::new(name, prefix),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        attribute_begins_with(item, &self.prefix)
    }

    pub(crate) fn render(&self, expr: &mut Expression) -> String {
        let (name, value) = expr.bind("f", &self.prefix);
        format!("begins_with({name}, {value})")
    }
}

/// Placeholder names and values collected while rendering expressions.
#[derive(Debug, Default)]
pub(crate) struct Expression {
    pub names: HashMap<String, String>,
    pub values: Item,
}

impl Expression {
    fn bind(&mut self, tag: &str, attr: &KeyAttribute) -> (String, String) {
        let name = format!("#{tag}");
        let value = format!(":{tag}");
        self.names.insert(name.clone(), attr.name.clone());
        self.values
            .insert(value.clone(), AttributeValue::S(attr.value.clone()));
        (name, value)
    }
}

fn attribute_equals(item: &Item, attr: &KeyAttribute) -> bool {
    item.get(&attr.name)
        .and_then(|v| v.as_s().ok())
        .is_some_and(|v| *v == attr.value)
}

fn attribute_begins_with(item: &Item, attr: &KeyAttribute) -> bool {
    item.get(&attr.name)
        .and_then(|v| v.as_s().ok())
        .is_some_and(|v| v.starts_with(&attr.value))
}
