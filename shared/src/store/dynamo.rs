use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValuesOnConditionCheckFailure};
use aws_sdk_dynamodb::Client;
use serde_dynamo::{from_item, from_items, to_item};
use std::collections::HashMap;
use std::env;

use crate::error::{
    map_get_dynamo_error, map_put_dynamo_error, map_query_dynamo_error, map_scan_dynamo_error,
    Result, ServiceError,
};
use crate::models::PartyReplier;

// Replier Store Constants
pub const TABLE_NAME: &str = "party-replier-table";
pub const GSI_OWNER: &str = "owner-index";

/// DynamoDB store for party replier records
pub struct DynamoReplierStore {
    client: Client,
    table_name: String,
}

impl DynamoReplierStore {
    /// Creates a new DynamoDB store
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let client = Client::new(&config);

        // Use environment variable for table name if available
        let table_name =
            env::var("DYNAMODB_REPLIER_TABLE").unwrap_or_else(|_| TABLE_NAME.to_string());

        tracing::info!("Using DynamoDB replier table '{}'", table_name);
        Self { client, table_name }
    }

    /// Creates a new DynamoDB store with the specified client and table name.
    /// This is mainly useful for testing with a local DynamoDB instance.
    pub fn with_client_and_table(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    fn key(id: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([("id".to_string(), AttributeValue::S(id.to_string()))])
    }
}

#[async_trait]
impl super::ReplierStore for DynamoReplierStore {
    async fn create_replier(&self, replier: PartyReplier) -> Result<PartyReplier> {
        check_indexable(&replier)?;
        let item = to_item(&replier)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| map_put_dynamo_error(e, replier.id()))?;

        tracing::debug!("Created replier {}", replier.id());
        Ok(replier)
    }

    async fn get_replier(&self, id: &str) -> Result<PartyReplier> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_get_dynamo_error(e, id))?;

        let item = response
            .item()
            .ok_or_else(|| ServiceError::NotFound(format!("Replier not found: {}", id)))?;

        Ok(from_item(item.clone())?)
    }

    async fn get_repliers_by_owner(&self, owner_id: &str) -> Result<Vec<PartyReplier>> {
        // "owner" is a DynamoDB reserved word
        let expr_attr_names = HashMap::from([("#owner".to_string(), "owner".to_string())]);
        let expr_attr_values = HashMap::from([(
            ":owner".to_string(),
            AttributeValue::S(owner_id.to_string()),
        )]);

        let mut repliers = Vec::new();
        let mut start_key = None;
        loop {
            let response = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(GSI_OWNER)
                .key_condition_expression("#owner = :owner")
                .set_expression_attribute_names(Some(expr_attr_names.clone()))
                .set_expression_attribute_values(Some(expr_attr_values.clone()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(map_query_dynamo_error)?;

            let page: Vec<PartyReplier> = from_items(response.items().to_vec())?;
            repliers.extend(page);

            match response.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }

        Ok(repliers)
    }

    /// Gets all records where the user has replied
    ///
    /// Reply lists are stored as arrays inside the record, so this scans the
    /// table and filters in memory.
    async fn get_repliers_by_participant(&self, user_id: &str) -> Result<Vec<PartyReplier>> {
        let mut repliers = Vec::new();
        let mut start_key = None;
        loop {
            let response = self
                .client
                .scan()
                .table_name(&self.table_name)
                .consistent_read(true)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(map_scan_dynamo_error)?;

            for item in response.items() {
                let replier: PartyReplier = from_item(item.clone())?;
                if replier.has_participant(user_id) {
                    repliers.push(replier);
                }
            }

            match response.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }

        Ok(repliers)
    }

    async fn update_replier(&self, mut replier: PartyReplier, read_at: &str) -> Result<PartyReplier> {
        check_indexable(&replier)?;
        replier.base.touch();
        let item = to_item(&replier)?;

        let expr_attr_names =
            HashMap::from([("#updatedAt".to_string(), "updatedAt".to_string())]);
        let expr_attr_values = HashMap::from([(
            ":read_at".to_string(),
            AttributeValue::S(read_at.to_string()),
        )]);

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_exists(id) AND #updatedAt = :read_at")
            .set_expression_attribute_names(Some(expr_attr_names))
            .set_expression_attribute_values(Some(expr_attr_values))
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld)
            .send()
            .await
            .map_err(|e| map_update_dynamo_error(e, replier.id()))?;

        Ok(replier)
    }

    async fn delete_replier(&self, id: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .condition_expression("attribute_exists(id)")
            .send()
            .await
            .map_err(|e| map_delete_dynamo_error(e, id))?;

        Ok(())
    }
}

// The failed condition returns the stored item when the record exists but changed
fn map_update_dynamo_error(err: SdkError<PutItemError>, id: &str) -> ServiceError {
    match &err {
        SdkError::ServiceError(service_err) => match service_err.err() {
            PutItemError::ConditionalCheckFailedException(failed) if failed.item().is_some() => {
                ServiceError::Conflict(format!("Replier {} was modified concurrently", id))
            }
            PutItemError::ConditionalCheckFailedException(_) => {
                ServiceError::NotFound(format!("Replier not found: {}", id))
            }
            _ => ServiceError::InternalError(format!("DynamoDB put_item error: {}", err)),
        },
        _ => ServiceError::InternalError(format!("DynamoDB put_item error: {}", err)),
    }
}

/// DynamoDB rejects empty strings in index key attributes, and `owner` keys
/// the owner index.
pub(crate) fn check_indexable(replier: &PartyReplier) -> Result<()> {
    if replier.owner.as_deref() == Some("") {
        return Err(ServiceError::ValidationError(
            "Replier owner must not be an empty string".into(),
        ));
    }
    Ok(())
}

fn map_delete_dynamo_error(err: SdkError<DeleteItemError>, id: &str) -> ServiceError {
    match &err {
        SdkError::ServiceError(service_err)
            if service_err.err().is_conditional_check_failed_exception() =>
        {
            ServiceError::NotFound(format!("Replier not found: {}", id))
        }
        _ => ServiceError::InternalError(format!("DynamoDB delete_item error: {}", err)),
    }
}
