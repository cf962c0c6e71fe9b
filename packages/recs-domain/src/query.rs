//! Compiles gathered evidence and resolved biases into a boolean search request.
//!
//! Every signal lands in exactly one of three buckets: `should` clauses raise the score of
//! matching items, `must` clauses are required, `must_not` clauses remove items. The compiler is
//! pure and never fails; malformed caller biases are dropped on the way in.

use std::collections::HashSet;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
	bias::ResolvedBiases,
	correlator::{BiasKind, Correlator, FieldBias, FilterCorrelator, RawFieldBias},
	evidence::{RecentActions, RecentEvent},
	request::RequestQuery,
};
use recs_config::{DomainTypeConfig, RecsModel};

pub const MINIMUM_SHOULD_MATCH: u32 = 1;
pub const RANK_FIELD_UNMAPPED_TYPE: &str = "double";

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
	/// Matches documents whose `field` holds any of `values`. `boost: None` leaves the weight to
	/// the search backend.
	Terms { field: String, values: Vec<String>, boost: Option<f64> },
	/// Matches every document with a constant score.
	MatchAll { boost: f64 },
	/// Matches documents by id.
	Ids { values: Vec<String>, boost: f64 },
}
impl Clause {
	pub fn field(&self) -> Option<&str> {
		match self {
			Self::Terms { field, .. } => Some(field),
			Self::MatchAll { .. } | Self::Ids { .. } => None,
		}
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Terms { field, values, boost } => {
				let mut terms = Map::new();

				terms.insert(field.clone(), Value::from(values.clone()));

				if let Some(boost) = boost {
					terms.insert("boost".to_string(), Value::from(*boost));
				}

				serde_json::json!({ "terms": terms })
			},
			Self::MatchAll { boost } => serde_json::json!({
				"constant_score": { "filter": { "match_all": {} }, "boost": boost }
			}),
			Self::Ids { values, boost } => {
				serde_json::json!({ "ids": { "values": values, "boost": boost } })
			},
		}
	}
}
impl Serialize for Clause {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.to_value().serialize(serializer)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
	Score,
	/// Numeric rank field; documents missing it sort as the backend orders an absent double.
	RankField(String),
}
impl SortKey {
	pub fn to_value(&self) -> Value {
		match self {
			Self::Score => serde_json::json!({ "_score": { "order": "desc" } }),
			Self::RankField(field) => {
				let mut sort = Map::new();

				sort.insert(
					field.clone(),
					serde_json::json!({
						"unmapped_type": RANK_FIELD_UNMAPPED_TYPE,
						"order": "desc",
					}),
				);

				Value::Object(sort)
			},
		}
	}
}
impl Serialize for SortKey {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.to_value().serialize(serializer)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoolQuery {
	pub should: Vec<Clause>,
	pub must: Vec<Clause>,
	pub must_not: Vec<Clause>,
	pub minimum_should_match: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryBody {
	pub bool: BoolQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchBody {
	pub from: u32,
	pub size: u32,
	pub query: QueryBody,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub sort: Vec<SortKey>,
}

pub struct CompileInput<'a> {
	pub request: &'a RequestQuery,
	pub domain: &'a DomainTypeConfig,
	pub biases: &'a ResolvedBiases,
	pub similar_items: &'a [Correlator],
	pub recent_actions: &'a RecentActions,
	pub rank_fields: &'a [String],
	pub max_query_events: usize,
}

/// Metadata biases split by sign after dropping malformed entries and repeated field names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataBuckets {
	pub boosted: Vec<Correlator>,
	pub filtering: Vec<FilterCorrelator>,
	pub excluded: Vec<FieldBias>,
}

pub fn compile(input: &CompileInput<'_>) -> SearchBody {
	let metadata = classify_metadata(&input.request.field_biases, &input.biases.field_biases);
	let query = BoolQuery {
		should: build_should(input, &metadata),
		must: build_must(input, &metadata),
		must_not: build_must_not(input, &metadata),
		minimum_should_match: MINIMUM_SHOULD_MATCH,
	};

	SearchBody {
		from: input.request.offset,
		size: input.request.limit,
		query: QueryBody { bool: query },
		sort: build_sort(input.domain.recs_model, input.rank_fields),
	}
}

/// Request biases come first, so a request entry shadows a domain entry for the same field no
/// matter which bucket either would land in.
pub fn classify_metadata(requested: &[RawFieldBias], resolved: &[FieldBias]) -> MetadataBuckets {
	let mut seen = HashSet::new();
	let mut buckets = MetadataBuckets::default();
	let candidates = requested
		.iter()
		.filter_map(RawFieldBias::validated)
		.chain(resolved.iter().filter(|field| field.bias.is_finite()).cloned());

	for field in candidates {
		if !seen.insert(field.name.clone()) {
			continue;
		}

		match field.kind() {
			BiasKind::Boost => buckets.boosted.push(Correlator::new(
				field.name,
				field.values,
				Some(field.bias.abs()),
			)),
			BiasKind::Filter => buckets.filtering.push(FilterCorrelator {
				signal_name: Some(field.name),
				entity_ids: field.values,
			}),
			BiasKind::Exclude => buckets.excluded.push(field),
		}
	}

	buckets
}

pub fn build_should(input: &CompileInput<'_>, metadata: &MetadataBuckets) -> Vec<Clause> {
	let history_limit = if input.biases.user_bias >= 0.0 {
		input.max_query_events.saturating_sub(1)
	} else {
		0
	};
	let mut should: Vec<Clause> = input
		.recent_actions
		.correlators
		.iter()
		.take(history_limit)
		.chain(input.similar_items)
		.chain(&metadata.boosted)
		.filter_map(|correlator| {
			let field = correlator.signal_name.clone()?;

			Some(Clause::Terms {
				field,
				values: correlator.entity_ids.clone(),
				boost: correlator.boost,
			})
		})
		.collect();

	should.push(Clause::MatchAll { boost: 0.0 });

	should
}

/// History and similar-item filters follow the raw request multipliers, not the resolved ones.
pub fn build_must(input: &CompileInput<'_>, metadata: &MetadataBuckets) -> Vec<Clause> {
	let mut filters: Vec<FilterCorrelator> = Vec::new();

	if input.request.user_bias_multiplier < 0.0 {
		filters.extend(input.recent_actions.correlators.iter().map(Correlator::to_filter));
	}
	if input.request.item_bias_multiplier < 0.0 {
		filters.extend(input.similar_items.iter().map(Correlator::to_filter));
	}

	filters.extend(metadata.filtering.iter().cloned());

	let mut seen = HashSet::new();

	filters
		.into_iter()
		.filter_map(|filter| {
			let field = filter.signal_name?;

			seen.insert(field.clone()).then_some(Clause::Terms {
				field,
				values: filter.entity_ids,
				boost: Some(0.0),
			})
		})
		.collect()
}

pub fn build_must_not(input: &CompileInput<'_>, metadata: &MetadataBuckets) -> Vec<Clause> {
	let mut must_not: Vec<Clause> = metadata
		.excluded
		.iter()
		.map(|field| Clause::Terms {
			field: field.name.clone(),
			values: field.values.clone(),
			boost: Some(0.0),
		})
		.collect();

	must_not.push(Clause::Ids {
		values: excluded_items(
			&input.domain.blacklist_events,
			&input.recent_actions.events,
			&input.request.blacklist_item_ids,
		),
		boost: 0.0,
	});

	must_not
}

/// Targets of blacklisted history events followed by the caller's blacklist, first occurrence
/// order, no repeats.
pub fn excluded_items(
	blacklist_events: &[String],
	events: &[RecentEvent],
	blacklist_item_ids: &[String],
) -> Vec<String> {
	let mut seen = HashSet::new();
	let from_history = events
		.iter()
		.filter(|row| blacklist_events.iter().any(|event| *event == row.event))
		.filter_map(|row| row.target_entity_id.as_ref());

	from_history
		.chain(blacklist_item_ids)
		.filter(|id| seen.insert(id.as_str()))
		.cloned()
		.collect()
}

pub fn build_sort(recs_model: RecsModel, rank_fields: &[String]) -> Vec<SortKey> {
	match recs_model {
		RecsModel::All | RecsModel::Backfill => std::iter::once(SortKey::Score)
			.chain(rank_fields.iter().cloned().map(SortKey::RankField))
			.collect(),
		RecsModel::CollabFiltering => Vec::new(),
	}
}
