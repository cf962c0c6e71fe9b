pub mod evidence;
pub mod recommend;

mod error;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};

use recs_config::Recommend;
use recs_domain::{query::SearchBody, result::SearchHit};
use recs_storage::{db::Db, events, index::SearchIndex, models::EventRow};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Document store the recommendation queries run against.
pub trait ItemIndex
where
	Self: Send + Sync,
{
	fn get_document<'a>(
		&'a self,
		index: &'a str,
		id: &'a str,
	) -> BoxFuture<'a, Result<Map<String, Value>>>;

	fn search<'a>(
		&'a self,
		index: &'a str,
		body: &'a SearchBody,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>>;
}

/// Source of a user's recent interaction rows.
pub trait EventLog
where
	Self: Send + Sync,
{
	fn recent_user_events<'a>(
		&'a self,
		relation_name: &'a str,
		user_id: &'a str,
		event_names: &'a [String],
		max_items_per_user: u32,
	) -> BoxFuture<'a, Result<Vec<EventRow>>>;
}

impl ItemIndex for SearchIndex {
	fn get_document<'a>(
		&'a self,
		index: &'a str,
		id: &'a str,
	) -> BoxFuture<'a, Result<Map<String, Value>>> {
		Box::pin(
			async move { SearchIndex::get_document(self, index, id).await.map_err(Error::from) },
		)
	}

	fn search<'a>(
		&'a self,
		index: &'a str,
		body: &'a SearchBody,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(async move { SearchIndex::search(self, index, body).await.map_err(Error::from) })
	}
}

impl EventLog for Db {
	fn recent_user_events<'a>(
		&'a self,
		relation_name: &'a str,
		user_id: &'a str,
		event_names: &'a [String],
		max_items_per_user: u32,
	) -> BoxFuture<'a, Result<Vec<EventRow>>> {
		Box::pin(async move {
			events::recent_user_events(
				self,
				relation_name,
				user_id,
				event_names,
				max_items_per_user,
			)
			.await
			.map_err(Error::from)
		})
	}
}

pub struct RecsService {
	pub cfg: Recommend,
	pub index: Arc<dyn ItemIndex>,
	pub events: Arc<dyn EventLog>,
}
impl RecsService {
	pub fn new(cfg: Recommend, index: Arc<dyn ItemIndex>, events: Arc<dyn EventLog>) -> Self {
		Self { cfg, index, events }
	}

	/// Connects both backends named in `cfg.storage`.
	pub async fn connect(cfg: &recs_config::Config) -> Result<Self> {
		let db = Db::connect(&cfg.storage.postgres).await?;
		let index = SearchIndex::new(&cfg.storage.search)?;

		Ok(Self::new(cfg.recommend.clone(), Arc::new(index), Arc::new(db)))
	}
}
