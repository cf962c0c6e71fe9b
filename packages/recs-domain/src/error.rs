pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Document {id} carries an unreadable payload: {message}")]
	InvalidPayload { id: String, message: String },
}
