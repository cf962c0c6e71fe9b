use std::time::Duration as StdDuration;

use reqwest::{Client, StatusCode, Url};
use serde_json::{Map, Value};

use crate::{Error, Result};
use recs_domain::{query::SearchBody, result::SearchHit};

/// HTTP client for the document search index.
#[derive(Clone, Debug)]
pub struct SearchIndex {
	client: Client,
	base_url: Url,
	doc_type: String,
}
impl SearchIndex {
	pub fn new(cfg: &recs_config::SearchIndex) -> Result<Self> {
		let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;
		let base_url = Url::parse(&cfg.url)
			.map_err(|err| Error::InvalidArgument(format!("Search index url: {err}.")))?;

		Ok(Self { client, base_url, doc_type: cfg.doc_type.clone() })
	}

	/// Fetches the stored source of one document.
	pub async fn get_document(&self, index: &str, id: &str) -> Result<Map<String, Value>> {
		let url = self.endpoint(&[index, &self.doc_type, id])?;
		let res = self.client.get(url).send().await?;

		if res.status() == StatusCode::NOT_FOUND {
			return Err(Error::NotFound(format!("Document {id:?} in index {index:?}.")));
		}

		let json: Value = res.error_for_status()?.json().await?;

		parse_document_response(json, index, id)
	}

	pub async fn search(&self, index: &str, body: &SearchBody) -> Result<Vec<SearchHit>> {
		let url = self.endpoint(&[index, "_search"])?;
		let res = self.client.post(url).json(body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_search_response(json)
	}

	fn endpoint(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|()| Error::InvalidArgument("Search index url cannot be a base.".to_string()))?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}
}

pub fn parse_document_response(json: Value, index: &str, id: &str) -> Result<Map<String, Value>> {
	if json.get("found").and_then(Value::as_bool) == Some(false) {
		return Err(Error::NotFound(format!("Document {id:?} in index {index:?}.")));
	}

	match json.get("_source") {
		Some(Value::Object(source)) => Ok(source.clone()),
		_ =>
			Err(Error::InvalidResponse("Document response is missing _source object.".to_string())),
	}
}

pub fn parse_search_response(mut json: Value) -> Result<Vec<SearchHit>> {
	let hits = json
		.get_mut("hits")
		.and_then(|hits| hits.get_mut("hits"))
		.map(Value::take)
		.ok_or_else(|| {
			Error::InvalidResponse("Search response is missing hits.hits.".to_string())
		})?;

	Ok(serde_json::from_value(hits)?)
}
