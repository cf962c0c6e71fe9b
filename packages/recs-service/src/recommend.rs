use crate::{
	RecsService, Result,
	evidence::{self, SimilarItems},
};
use recs_config::DomainTypeConfig;
use recs_domain::{
	bias,
	query::{self, CompileInput, SearchBody},
	ranking,
	request::RequestQuery,
	result::{self, RecommendedItem},
};

impl RecsService {
	/// Answers one recommendation request for `domain`.
	///
	/// Similar-item and recent-action evidence are gathered concurrently; the first failure
	/// cancels the other fetch and is returned as is.
	pub async fn recommend(
		&self,
		domain: &DomainTypeConfig,
		request: RequestQuery,
	) -> Result<Vec<RecommendedItem>> {
		tracing::debug!(domain = %domain.path, ?request, "Recommendation request.");

		let rank_fields = ranking::rank_fields(&ranking::domain_rankings(domain));
		let body = self.compile(domain, &request, &rank_fields).await?;

		if tracing::enabled!(tracing::Level::DEBUG) {
			let body_json = serde_json::to_string(&body).unwrap_or_default();

			tracing::debug!(domain = %domain.path, body = %body_json, "Compiled search body.");
		}

		let hits = self.index.search(&domain.index_name, &body).await?;
		let reported_ranks = self.cfg.with_ranks.then_some(rank_fields.as_slice());

		Ok(result::map_hits(hits, reported_ranks)?)
	}

	/// Gathers evidence and compiles the search body without running it.
	pub async fn compile(
		&self,
		domain: &DomainTypeConfig,
		request: &RequestQuery,
		rank_fields: &[String],
	) -> Result<SearchBody> {
		let (similar, recent_actions) = tokio::try_join!(
			evidence::similar_items(self.index.as_ref(), domain, request, &self.cfg),
			evidence::recent_actions(self.events.as_ref(), domain, request, &self.cfg),
		)?;
		let SimilarItems { correlators: similar_items, document } = similar;
		let biases = bias::resolve_biases(document.as_ref(), domain);

		Ok(query::compile(&CompileInput {
			request,
			domain,
			biases: &biases,
			similar_items: &similar_items,
			recent_actions: &recent_actions,
			rank_fields,
			max_query_events: self.cfg.max_query_events as usize,
		}))
	}
}
