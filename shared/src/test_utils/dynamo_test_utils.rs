use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, GlobalSecondaryIndex, IndexStatus,
    KeySchemaElement, KeyType, Projection, ProjectionType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client;
use log::{debug, error, info};
use std::error::Error;
use std::time::Duration;

use crate::store::dynamo::GSI_OWNER;

/// # DynamoDB test utilities
///
/// Integration tests run against DynamoDB Local when `USE_DYNAMODB=true`;
/// otherwise they use the in-memory mock store. Call
/// `test_logging::init_test_logging()` first to see the log output.
pub const DYNAMO_LOCAL_URI: &str = "http://localhost:8000";

// Helper to check if DynamoDB integration tests should be used
pub fn use_dynamodb() -> bool {
    std::env::var("USE_DYNAMODB").unwrap_or_default() == "true"
}

// Helper to set up a DynamoDB client for local testing
pub async fn create_dynamo_client() -> Client {
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .endpoint_url(DYNAMO_LOCAL_URI)
        .load()
        .await;

    Client::new(&config)
}

async fn table_exists(client: &Client, table_name: &str) -> Result<bool, Box<dyn Error>> {
    let tables = client.list_tables().send().await?;
    Ok(tables.table_names().iter().any(|name| name == table_name))
}

/// Creates the replier table (hash key `id`, sparse `owner` index),
/// dropping any previous table with the same name, and waits until it and
/// its index are ACTIVE.
pub async fn create_replier_table(client: &Client, table_name: &str) -> Result<(), Box<dyn Error>> {
    if table_exists(client, table_name).await? {
        info!("Table '{}' already exists, deleting it first...", table_name);
        client.delete_table().table_name(table_name).send().await?;
        while table_exists(client, table_name).await? {
            debug!("Table '{}' still exists, waiting...", table_name);
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    let owner_index = GlobalSecondaryIndex::builder()
        .index_name(GSI_OWNER)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("owner")
                .key_type(KeyType::Hash)
                .build()?,
        )
        .projection(
            Projection::builder()
                .projection_type(ProjectionType::All)
                .build(),
        )
        .build()?;

    info!("Creating replier table '{}'...", table_name);
    client
        .create_table()
        .table_name(table_name)
        .billing_mode(BillingMode::PayPerRequest)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("id")
                .key_type(KeyType::Hash)
                .build()?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("id")
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("owner")
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .global_secondary_indexes(owner_index)
        .send()
        .await?;

    loop {
        let resp = client.describe_table().table_name(table_name).send().await?;
        if let Some(table_desc) = resp.table() {
            let table_active = table_desc.table_status() == Some(&TableStatus::Active);
            let indexes_active = table_desc
                .global_secondary_indexes()
                .iter()
                .all(|idx| idx.index_status() == Some(&IndexStatus::Active));
            if table_active && indexes_active {
                break;
            }
            debug!("Table '{}' status: {:?}", table_name, table_desc.table_status());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    info!("Table '{}' is ready for testing!", table_name);
    Ok(())
}

// Helper to clean the DynamoDB table between tests
pub async fn clear_dynamo_table(client: &Client, table_name: &str) {
    let mut last_key = None;
    loop {
        let scan_resp = match client
            .scan()
            .table_name(table_name)
            .set_exclusive_start_key(last_key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to scan table '{}': {}", table_name, e);
                break;
            }
        };

        for item in scan_resp.items() {
            let Some(AttributeValue::S(id)) = item.get("id") else {
                continue;
            };
            if let Err(e) = client
                .delete_item()
                .table_name(table_name)
                .key("id", AttributeValue::S(id.clone()))
                .send()
                .await
            {
                error!("Failed to delete item '{}' from table '{}': {}", id, table_name, e);
            }
        }

        last_key = scan_resp.last_evaluated_key().cloned();
        if last_key.is_none() {
            break;
        }
    }
}
