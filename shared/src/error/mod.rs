use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Helper function to map GetItem errors
pub fn map_get_dynamo_error(err: SdkError<GetItemError>, id: &str) -> ServiceError {
    match &err {
        SdkError::ServiceError(service_err) => {
            if service_err.err().is_resource_not_found_exception() {
                ServiceError::NotFound(format!("Replier not found: {}", id))
            } else {
                ServiceError::InternalError(format!("DynamoDB get_item error: {}", err))
            }
        }
        _ => ServiceError::InternalError(format!("DynamoDB get_item error: {}", err)),
    }
}

// A failed `attribute_not_exists(id)` condition means the id is taken
pub fn map_put_dynamo_error(err: SdkError<PutItemError>, id: &str) -> ServiceError {
    match &err {
        SdkError::ServiceError(service_err)
            if service_err.err().is_conditional_check_failed_exception() =>
        {
            ServiceError::Conflict(format!("Replier with ID {} already exists", id))
        }
        _ => ServiceError::InternalError(format!("DynamoDB put_item error: {}", err)),
    }
}

// Helper function to map Query errors
pub fn map_query_dynamo_error(err: SdkError<QueryError>) -> ServiceError {
    ServiceError::InternalError(format!("DynamoDB query error: {}", err))
}

// Helper function to map Scan errors
pub fn map_scan_dynamo_error(err: SdkError<ScanError>) -> ServiceError {
    ServiceError::InternalError(format!("DynamoDB scan error: {}", err))
}

impl From<serde_dynamo::Error> for ServiceError {
    fn from(err: serde_dynamo::Error) -> Self {
        ServiceError::InternalError(format!("DynamoDB serialization error: {}", err))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InternalError(format!("JSON serialization error: {}", err))
    }
}
