pub mod dynamo_test_utils;
pub mod http_test_utils;
pub mod mock_replier_store;
pub mod test_logging;
