//! Fetches the two kinds of evidence a recommendation is built from.

use serde_json::{Map, Value};

use crate::{EventLog, ItemIndex, Result};
use recs_config::{DomainTypeConfig, Recommend};
use recs_domain::{
	correlator::Correlator,
	evidence::{RecentActionAccumulator, RecentActions, similar_item_correlators},
	request::RequestQuery,
};

#[derive(Debug, Clone, Default)]
pub struct SimilarItems {
	pub correlators: Vec<Correlator>,
	/// The target item's stored document, kept for bias resolution.
	pub document: Option<Map<String, Value>>,
}

pub async fn similar_items(
	index: &dyn ItemIndex,
	domain: &DomainTypeConfig,
	request: &RequestQuery,
	cfg: &Recommend,
) -> Result<SimilarItems> {
	let Some(item_id) = request.target_item(&cfg.no_item_sentinel) else {
		return Ok(SimilarItems { correlators: vec![Correlator::placeholder()], document: None });
	};
	let document = index.get_document(&domain.index_name, item_id).await?;
	let correlators = similar_item_correlators(
		&document,
		&domain.event_names,
		request.item_bias_multiplier,
		cfg.max_query_events as usize,
	);

	Ok(SimilarItems { correlators, document: Some(document) })
}

pub async fn recent_actions(
	events: &dyn EventLog,
	domain: &DomainTypeConfig,
	request: &RequestQuery,
	cfg: &Recommend,
) -> Result<RecentActions> {
	let Some(user_id) = request.target_user() else {
		return Ok(RecentActions::default());
	};
	let rows = events
		.recent_user_events(
			&domain.relation_name,
			user_id,
			&domain.event_names,
			cfg.max_items_per_user,
		)
		.await?;
	let mut accumulator =
		RecentActionAccumulator::new(&domain.event_names, cfg.max_items_per_user as usize);

	for row in &rows {
		accumulator.push(&row.event, row.target_entity_id.as_deref());
	}

	Ok(accumulator.finish(request.user_bias_multiplier))
}
