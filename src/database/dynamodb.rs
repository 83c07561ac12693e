//! Amazon DynamoDB record store.
//!
//! Attributes use the JSON field names of [`User`], the partition key is
//! `id` (string).

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use serde_json::{Map, Value};

use super::{Filter, Result, Store, StoreError};
use crate::config::StoreConfig;
use crate::user::{User, UserChanges};

pub const PARTITION_KEY: &str = "id";

type Item = HashMap<String, AttributeValue>;

/// Table hosted on DynamoDB.
#[derive(Clone)]
pub struct DynamoDbStore {
    client: Client,
    table: String,
}

fn backend<E>(err: E) -> StoreError
where
    aws_sdk_dynamodb::Error: From<E>,
{
    StoreError::backend(aws_sdk_dynamodb::Error::from(err))
}

impl DynamoDbStore {
    /// Build a client from the AWS default chain, then check the table exists.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let client = Client::new(&loader.load().await);

        client
            .describe_table()
            .table_name(&config.table)
            .send()
            .await
            .map_err(backend)?;

        tracing::info!(table = %config.table, endpoint = ?config.endpoint, "dynamodb connected");

        Ok(Self::new(client, &config.table))
    }

    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl Store for DynamoDbStore {
    async fn scan(&self, filter: Option<&Filter>) -> Result<Vec<User>> {
        if matches!(filter, Some(Filter::Any(filters)) if filters.is_empty()) {
            return Ok(Vec::new());
        }
        let expression = filter.map(Expression::filter);

        let mut users = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let mut request = self
                .client
                .scan()
                .table_name(&self.table)
                .set_exclusive_start_key(start_key.take());
            if let Some(expression) = &expression {
                request = request
                    .filter_expression(&expression.text)
                    .set_expression_attribute_names(Some(expression.names.clone()))
                    .set_expression_attribute_values(Some(expression.values.clone()));
            }

            let output = request.send().await.map_err(backend)?;
            for item in output.items() {
                users.push(from_item(item)?);
            }

            // Pages stop at 1 MB, keep reading until the table is exhausted.
            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(users)
    }

    async fn get(&self, id: &str) -> Result<Option<User>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(PARTITION_KEY, AttributeValue::S(id.to_owned()))
            .consistent_read(true)
            .send()
            .await
            .map_err(backend)?;

        output.item().map(from_item).transpose()
    }

    async fn put(&self, user: &User) -> Result<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_item(user)?))
            .condition_expression("attribute_not_exists(#id)")
            .expression_attribute_names("#id", PARTITION_KEY)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|err| err.is_conditional_check_failed_exception()) =>
            {
                Err(StoreError::AlreadyExists(user.id.clone()))
            },
            Err(err) => Err(backend(err)),
        }
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<bool> {
        let expression = Expression::update(changes)?;

        let result = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(PARTITION_KEY, AttributeValue::S(id.to_owned()))
            .update_expression(expression.text)
            .condition_expression("attribute_exists(#id)")
            .set_expression_attribute_names(Some(expression.names))
            .expression_attribute_names("#id", PARTITION_KEY)
            .set_expression_attribute_values(Some(expression.values))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|err| err.is_conditional_check_failed_exception()) =>
            {
                Ok(false)
            },
            Err(err) => Err(backend(err)),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table)
            .key(PARTITION_KEY, AttributeValue::S(id.to_owned()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(backend)?;

        Ok(output.attributes().is_some_and(|old| !old.is_empty()))
    }
}

/// Expression with its placeholder tables.
#[derive(Debug, Default, PartialEq)]
struct Expression {
    text: String,
    names: HashMap<String, String>,
    values: Item,
}

impl Expression {
    /// Build a scan `FilterExpression`.
    fn filter(filter: &Filter) -> Self {
        let mut expression = Self::default();
        let text = expression.condition(filter);
        Self { text, ..expression }
    }

    /// Build a `SET` update expression.
    fn update(changes: &UserChanges) -> Result<Self> {
        let mut expression = Self::default();
        let mut assignments = Vec::new();

        let fields = [
            ("full_name", changes.full_name.clone().map(Value::String)),
            ("email", changes.email.clone().map(Value::String)),
            ("nationality", changes.nationality.clone().map(Value::String)),
            ("is_active", changes.is_active.map(Value::Bool)),
            ("modified_at", Some(serde_json::to_value(changes.modified_at)?)),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                let (name, placeholder) = expression.bind(field, value);
                assignments.push(format!("{name} = {placeholder}"));
            }
        }

        Ok(Self {
            text: format!("SET {}", assignments.join(", ")),
            ..expression
        })
    }

    fn bind(&mut self, field: &str, value: Value) -> (String, String) {
        let index = self.names.len();
        let name = format!("#f{index}");
        let placeholder = format!(":v{index}");

        self.names.insert(name.clone(), field.to_owned());
        self.values.insert(placeholder.clone(), to_attribute(value));
        (name, placeholder)
    }

    fn condition(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::Eq { field, value } => {
                let (name, placeholder) = self.bind(field, value.clone());
                format!("{name} = {placeholder}")
            },
            Filter::Any(filters) => {
                let conditions = filters
                    .iter()
                    .map(|filter| self.condition(filter))
                    .collect::<Vec<_>>();
                format!("({})", conditions.join(" OR "))
            },
        }
    }
}

fn to_item(user: &User) -> Result<Item> {
    match serde_json::to_value(user)? {
        Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(name, value)| (name, to_attribute(value)))
            .collect()),
        _ => Ok(Item::new()),
    }
}

fn from_item(item: &Item) -> Result<User> {
    let fields = item
        .iter()
        .map(|(name, value)| (name.clone(), from_attribute(value)))
        .collect::<Map<String, Value>>();

    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(value) => AttributeValue::Bool(value),
        Value::Number(value) => AttributeValue::N(value.to_string()),
        Value::String(value) => AttributeValue::S(value),
        Value::Array(values) => AttributeValue::L(values.into_iter().map(to_attribute).collect()),
        Value::Object(fields) => AttributeValue::M(
            fields
                .into_iter()
                .map(|(name, value)| (name, to_attribute(value)))
                .collect(),
        ),
    }
}

fn from_attribute(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(value) => Value::String(value.clone()),
        AttributeValue::Bool(value) => Value::Bool(*value),
        AttributeValue::N(value) => value
            .parse::<serde_json::Number>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(value.clone())),
        AttributeValue::Ss(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
        AttributeValue::L(values) => Value::Array(values.iter().map(from_attribute).collect()),
        AttributeValue::M(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), from_attribute(value)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_item_conversion_keeps_types() {
        let user = User::builder()
            .username("john_doe")
            .email("john.doe@example.com")
            .full_name("John Doe")
            .nationality("Testland")
            .build(Utc::now());

        let item = to_item(&user).unwrap();
        assert_eq!(item.get("id"), Some(&AttributeValue::S(user.id.clone())));
        assert_eq!(item.get("is_active"), Some(&AttributeValue::Bool(true)));
        assert!(matches!(item.get("created_at"), Some(AttributeValue::S(_))));

        assert_eq!(from_item(&item).unwrap(), user);
    }

    #[test]
    fn test_legacy_item_without_is_active() {
        let mut item = Item::new();
        for (name, value) in [
            ("id", "42"),
            ("full_name", "John Doe"),
            ("username", "john_doe"),
            ("email", "john.doe@example.com"),
            ("nationality", "Testland"),
            ("created_at", "2024-05-01T10:00:00Z"),
            ("modified_at", "2024-05-01T10:00:00Z"),
        ] {
            item.insert(name.to_owned(), AttributeValue::S(value.to_owned()));
        }

        let user = from_item(&item).unwrap();
        assert!(user.is_active);
        assert_eq!(user.id, "42");
    }

    #[test]
    fn test_or_filter_expression() {
        let filter = Filter::Any(vec![
            Filter::eq("username", "john_doe"),
            Filter::eq("email", "john.doe@example.com"),
        ]);
        let expression = Expression::filter(&filter);

        assert_eq!(expression.text, "(#f0 = :v0 OR #f1 = :v1)");
        assert_eq!(expression.names.get("#f0").map(String::as_str), Some("username"));
        assert_eq!(expression.names.get("#f1").map(String::as_str), Some("email"));
        assert_eq!(
            expression.values.get(":v1"),
            Some(&AttributeValue::S("john.doe@example.com".into()))
        );
    }

    #[test]
    fn test_boolean_filter_expression() {
        let expression = Expression::filter(&Filter::eq("is_active", false));

        assert_eq!(expression.text, "#f0 = :v0");
        assert_eq!(expression.values.get(":v0"), Some(&AttributeValue::Bool(false)));
    }

    #[test]
    fn test_update_expression_skips_unset_fields() {
        let changes = UserChanges {
            is_active: Some(false),
            ..UserChanges::at(Utc::now())
        };
        let expression = Expression::update(&changes).unwrap();

        assert_eq!(expression.text, "SET #f0 = :v0, #f1 = :v1");
        assert_eq!(expression.names.get("#f0").map(String::as_str), Some("is_active"));
        assert_eq!(expression.names.get("#f1").map(String::as_str), Some("modified_at"));
    }
}
