use std::time::Duration;

use axum::{
	Json, Router,
	extract::{MatchedPath, Query, State},
	http::{HeaderValue, StatusCode, header},
	response::{IntoResponse, Response},
	routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;

use crate::state::AppState;
use recs_config::{HEALTH_PATH, Pagination};
use recs_domain::{correlator::RawFieldBias, request::RequestQuery};
use recs_service::Error as ServiceError;

pub const PRIVATE_CACHE: &str = "private";

/// Raw query string of a recommendation request. Values stay textual; [`request_query`] decides
/// per parameter whether a bad value falls back to a default or rejects the request.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
	pub user: Option<String>,
	pub item: Option<String>,
	#[serde(rename = "userBias")]
	pub user_bias: Option<String>,
	#[serde(rename = "itemBias")]
	pub item_bias: Option<String>,
	pub fields: Option<String>,
	#[serde(rename = "blacklistItems")]
	pub blacklist_items: Option<String>,
	pub page: Option<String>,
	pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
	pub from: u32,
	pub size: u32,
}

pub fn router(state: AppState) -> Router {
	let mut router = Router::new().route(HEALTH_PATH, get(health));

	for domain in &state.config.domains {
		router = router.route(&domain.path, get(recommend));
	}

	router.fallback(not_found).layer(CompressionLayer::new()).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn recommend(
	State(state): State<AppState>,
	matched: MatchedPath,
	Query(params): Query<RecommendParams>,
) -> Result<Response, ApiError> {
	let Some(domain) = state.config.domain(matched.as_str()) else {
		return Err(path_not_found());
	};
	let request = request_query(&params, &state.config.pagination)?;
	let timeout_ms = state.config.service.request_timeout_ms;
	let items = tokio::time::timeout(
		Duration::from_millis(timeout_ms),
		state.service.recommend(domain, request),
	)
	.await
	.map_err(|_| ServiceError::Aborted {
		message: format!("No answer within {timeout_ms} ms."),
	})??;
	let mut response = Json(items).into_response();

	if let Ok(value) =
		HeaderValue::from_str(&format!("max-age={}", state.config.service.cache_max_age_secs))
	{
		response.headers_mut().insert(header::CACHE_CONTROL, value);
	}

	Ok(response)
}

async fn not_found() -> ApiError {
	path_not_found()
}

/// Turns query-string parameters into a core request.
pub fn request_query(
	params: &RecommendParams,
	pagination: &Pagination,
) -> Result<RequestQuery, ApiError> {
	let page = paginate(params.page.as_deref(), params.limit.as_deref(), pagination)?;
	let field_biases = match params.fields.as_deref().map(str::trim) {
		Some(raw) if !raw.is_empty() => serde_json::from_str::<Vec<RawFieldBias>>(raw).map_err(
			|err| invalid_request(format!("fields must be a JSON array of field biases: {err}.")),
		)?,
		_ => Vec::new(),
	};

	Ok(RequestQuery {
		user_id: params.user.clone(),
		item_id: params.item.clone(),
		user_bias_multiplier: multiplier("userBias", params.user_bias.as_deref())?,
		item_bias_multiplier: multiplier("itemBias", params.item_bias.as_deref())?,
		field_biases,
		offset: page.from,
		limit: page.size,
		blacklist_item_ids: params
			.blacklist_items
			.as_deref()
			.map(split_list)
			.unwrap_or_default(),
	})
}

/// `page` and `limit` that are missing, unparsable, or not positive take their defaults.
pub fn paginate(
	page: Option<&str>,
	limit: Option<&str>,
	pagination: &Pagination,
) -> Result<Page, ApiError> {
	let limit = positive(limit).unwrap_or(u64::from(pagination.default_limit));
	let page = positive(page).unwrap_or(u64::from(pagination.default_page));

	if limit > u64::from(pagination.max_limit) {
		return Err(invalid_request(format!("Max limit : {}", pagination.max_limit)));
	}

	let from = page.saturating_sub(1).saturating_mul(limit);

	Ok(Page {
		from: u32::try_from(from).unwrap_or(u32::MAX),
		size: u32::try_from(limit).unwrap_or(u32::MAX),
	})
}

fn positive(raw: Option<&str>) -> Option<u64> {
	raw.and_then(|value| value.trim().parse::<i64>().ok())
		.filter(|value| *value > 0)
		.and_then(|value| u64::try_from(value).ok())
}

fn multiplier(name: &str, raw: Option<&str>) -> Result<f64, ApiError> {
	let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
		return Ok(1.0);
	};

	raw.parse::<f64>()
		.ok()
		.filter(|value| value.is_finite())
		.ok_or_else(|| invalid_request(format!("{name} must be a finite number.")))
}

fn split_list(raw: &str) -> Vec<String> {
	raw.split(',').map(str::trim).filter(|id| !id.is_empty()).map(str::to_string).collect()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => invalid_request(message),
			ServiceError::NotFound { message } =>
				ApiError::new(StatusCode::NOT_FOUND, "not_found", message),
			ServiceError::Aborted { message } =>
				ApiError::new(StatusCode::GATEWAY_TIMEOUT, "aborted", message),
			ServiceError::SearchIndex { message } => {
				tracing::error!(error = %message, "Search index request failed.");

				ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "search_index_error", message)
			},
			ServiceError::EventLog { message } => {
				tracing::error!(error = %message, "Event log query failed.");

				ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "event_log_error", message)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_client_error() {
			tracing::warn!(status = %self.status, message = %self.message, "Request rejected.");
		}

		let body = ErrorBody { error_code: self.error_code, message: self.message };
		let mut response = (self.status, Json(body)).into_response();

		response
			.headers_mut()
			.insert(header::CACHE_CONTROL, HeaderValue::from_static(PRIVATE_CACHE));

		response
	}
}

fn invalid_request(message: impl Into<String>) -> ApiError {
	ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message)
}

fn path_not_found() -> ApiError {
	ApiError::new(StatusCode::NOT_FOUND, "not_found", "Path does not exist.")
}
