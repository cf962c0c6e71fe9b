use recs_config::{DomainTypeConfig, RankingParams, RankingType};

pub const POP_RANK: &str = "popRank";
pub const TREND_RANK: &str = "trendRank";
pub const HOT_RANK: &str = "hotRank";
pub const USER_RANK: &str = "userRank";
pub const UNIQUE_RANK: &str = "uniqueRank";
pub const UNKNOWN_RANK: &str = "unknownRank";

/// Lookback used by the default backfill ranking.
pub const BACKFILL_DURATION: &str = "3650 days";

pub fn rank_field_name(ranking_type: RankingType) -> &'static str {
	match ranking_type {
		RankingType::Popular => POP_RANK,
		RankingType::Trending => TREND_RANK,
		RankingType::Hot => HOT_RANK,
		RankingType::UserDefined => USER_RANK,
		RankingType::Random => UNIQUE_RANK,
		RankingType::Unknown => UNKNOWN_RANK,
	}
}

pub fn resolve_rank_field(params: &RankingParams) -> String {
	match params.name.as_deref() {
		Some(name) if !name.is_empty() => name.to_string(),
		_ => rank_field_name(params.ranking_type).to_string(),
	}
}

/// Popularity backfill over the domain's first event.
pub fn default_rankings(event_names: &[String]) -> Vec<RankingParams> {
	vec![RankingParams {
		name: Some(POP_RANK.to_string()),
		ranking_type: RankingType::Popular,
		event_names: event_names.iter().take(1).cloned().collect(),
		offset_date: None,
		end_date: None,
		duration: Some(BACKFILL_DURATION.to_string()),
	}]
}

pub fn domain_rankings(domain: &DomainTypeConfig) -> Vec<RankingParams> {
	if domain.rankings.is_empty() {
		default_rankings(&domain.event_names)
	} else {
		domain.rankings.clone()
	}
}

pub fn rank_fields(rankings: &[RankingParams]) -> Vec<String> {
	rankings.iter().map(resolve_rank_field).collect()
}
