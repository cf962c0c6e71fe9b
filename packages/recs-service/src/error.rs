pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Request aborted: {message}")]
	Aborted { message: String },
	#[error("Search index error: {message}")]
	SearchIndex { message: String },
	#[error("Event log error: {message}")]
	EventLog { message: String },
}
impl From<recs_storage::Error> for Error {
	fn from(err: recs_storage::Error) -> Self {
		match err {
			recs_storage::Error::Sqlx(inner) => Self::EventLog { message: inner.to_string() },
			recs_storage::Error::Reqwest(inner) => Self::SearchIndex { message: inner.to_string() },
			recs_storage::Error::SerdeJson(inner) =>
				Self::SearchIndex { message: inner.to_string() },
			recs_storage::Error::InvalidResponse(message) => Self::SearchIndex { message },
			recs_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			recs_storage::Error::NotFound(message) => Self::NotFound { message },
		}
	}
}

impl From<recs_domain::Error> for Error {
	fn from(err: recs_domain::Error) -> Self {
		Self::SearchIndex { message: err.to_string() }
	}
}
