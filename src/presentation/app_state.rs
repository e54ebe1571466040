// Application state for HTTP handlers
use crate::application::dashboard_api::DashboardApi;
use crate::application::dashboard_session::DashboardSession;
use crate::application::topology_service::TopologyService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn DashboardApi>,
    pub session: DashboardSession,
    pub topology_service: TopologyService,
}
