// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_data_manager;
pub mod http_response;
pub mod inference_client;
