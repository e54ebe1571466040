// Application layer - Query contract, transformations and dashboard state
pub mod dashboard_api;
pub mod dashboard_session;
pub mod drilldown;
pub mod error;
pub mod fixture_repository;
pub mod layered_layout;
pub mod mock_data_service;
pub mod topology_service;
pub mod transformer;
