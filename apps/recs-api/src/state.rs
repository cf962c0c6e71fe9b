use std::sync::Arc;

use recs_config::Config;
use recs_service::RecsService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RecsService>,
	pub config: Arc<Config>,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let service = RecsService::connect(&config).await?;

		Ok(Self::with_service(config, service))
	}

	/// Builds state around an already wired service, e.g. one backed by in-memory fakes.
	pub fn with_service(config: Config, service: RecsService) -> Self {
		Self { service: Arc::new(service), config: Arc::new(config) }
	}
}
