use time::OffsetDateTime;

/// A row of the event relation, columns aliased to snake case.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
	pub entity_type: String,
	pub entity_id: String,
	pub event: String,
	pub target_entity_id: Option<String>,
	pub event_time: OffsetDateTime,
}
