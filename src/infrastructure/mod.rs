// Infrastructure layer - Config, fixture files, remote backend and HTTP encoding
pub mod config;
pub mod fixture_store;
pub mod http_client;
pub mod http_response;
