use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Document field holding the item's display payload, stored as a JSON string.
pub const PAYLOAD_FIELD: &str = "info";
pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
	#[serde(rename = "_id")]
	pub id: String,
	#[serde(rename = "_score", default)]
	pub score: Option<f64>,
	#[serde(rename = "_source", default)]
	pub source: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
	pub id: String,
	pub score: Option<f64>,
	pub data: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ranks: Option<Vec<Value>>,
}

/// Maps hits in order. `rank_fields` is `None` when rank reporting is off.
pub fn map_hits(
	hits: Vec<SearchHit>,
	rank_fields: Option<&[String]>,
) -> Result<Vec<RecommendedItem>> {
	hits.into_iter().map(|hit| map_hit(hit, rank_fields)).collect()
}

pub fn map_hit(mut hit: SearchHit, rank_fields: Option<&[String]>) -> Result<RecommendedItem> {
	let id = match hit.source.get(ID_FIELD) {
		Some(Value::String(id)) => id.clone(),
		Some(Value::Number(id)) => id.to_string(),
		_ => hit.id.clone(),
	};
	let ranks = rank_fields.map(|fields| {
		fields.iter().filter_map(|field| hit.source.get(field).cloned()).collect::<Vec<_>>()
	});
	let data = match hit.source.remove(PAYLOAD_FIELD) {
		Some(Value::String(raw)) => serde_json::from_str(&raw)
			.map_err(|err| Error::InvalidPayload { id: id.clone(), message: err.to_string() })?,
		Some(value) => value,
		None => Value::Null,
	};

	Ok(RecommendedItem { id, score: hit.score, data, ranks })
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn hit(source: Value) -> SearchHit {
		SearchHit {
			id: "es-1".to_string(),
			score: Some(1.5),
			source: source.as_object().cloned().expect("Source must be an object."),
		}
	}

	#[test]
	fn parses_payload_and_collects_present_ranks() {
		let fields = vec!["popRank".to_string(), "trendRank".to_string(), "hotRank".to_string()];
		let source =
			json!({ "id": "v1", "info": "{\"name\":\"Vendor\"}", "popRank": 9.0, "hotRank": 2 });
		let item = map_hit(hit(source), Some(&fields)).expect("Hit must map.");

		assert_eq!(item.id, "v1");
		assert_eq!(item.data, json!({ "name": "Vendor" }));
		assert_eq!(item.ranks, Some(vec![json!(9.0), json!(2)]));
	}

	#[test]
	fn ranks_are_omitted_when_reporting_is_off() {
		let item = map_hit(hit(json!({ "popRank": 1.0 })), None).expect("Hit must map.");

		assert_eq!(item.id, "es-1");
		assert_eq!(item.data, Value::Null);
		assert!(item.ranks.is_none());
		assert!(!serde_json::to_string(&item).expect("Serializable.").contains("ranks"));
	}

	#[test]
	fn unreadable_payload_is_an_error() {
		let err = map_hit(hit(json!({ "id": "v2", "info": "{oops" })), None)
			.expect_err("Broken payload must fail.");

		assert!(err.to_string().contains("v2"));
	}
}
