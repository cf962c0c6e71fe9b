use crate::{Error, Result, db::Db, models::EventRow};

pub const USER_ENTITY_TYPE: &str = "user";

/// Fetches the latest row per `(entityType, entityId, event)` for one user across `event_names`.
///
/// Each event contributes one sub-query capped at `max_items_per_user` rows; the sub-queries are
/// combined with `UNION`.
pub async fn recent_user_events(
	db: &Db,
	relation_name: &str,
	user_id: &str,
	event_names: &[String],
	max_items_per_user: u32,
) -> Result<Vec<EventRow>> {
	if event_names.is_empty() {
		return Ok(Vec::new());
	}

	let sql = recent_user_events_sql(relation_name, event_names.len())?;
	let mut query = sqlx::query_as::<_, EventRow>(sql.as_str())
		.bind(USER_ENTITY_TYPE)
		.bind(user_id)
		.bind(i64::from(max_items_per_user));

	for event in event_names {
		query = query.bind(event.as_str());
	}

	let rows = query.fetch_all(&db.pool).await?;

	tracing::debug!(
		relation = relation_name,
		user_id,
		rows = rows.len(),
		"Fetched recent user events."
	);

	Ok(rows)
}

/// Binds: `$1` entity type, `$2` user id, `$3` row cap, `$4..` one event name per sub-query.
pub fn recent_user_events_sql(relation_name: &str, event_count: usize) -> Result<String> {
	if !is_valid_relation_name(relation_name) {
		return Err(Error::InvalidArgument(format!(
			"Relation name {relation_name:?} is not a plain identifier."
		)));
	}

	let parts: Vec<String> = (0..event_count)
		.map(|slot| {
			let event_param = slot + 4;

			format!(
				"\
(SELECT
	p.entityType AS entity_type,
	p.entityId AS entity_id,
	p.event AS event,
	p.targetEntityId AS target_entity_id,
	p.eventTime AS event_time
FROM {relation_name} p
WHERE p.entityType = $1
	AND p.entityId = $2
	AND p.event = ${event_param}
	AND p.eventTime = (
		SELECT max(q.eventTime)
		FROM {relation_name} q
		WHERE q.entityType = p.entityType
			AND q.entityId = p.entityId
			AND q.event = p.event
	)
LIMIT $3)"
			)
		})
		.collect();

	Ok(parts.join("\nUNION\n"))
}

pub fn is_valid_relation_name(name: &str) -> bool {
	let mut parts = name.split('.');
	let valid_part = |part: &str| {
		let mut chars = part.chars();

		matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
			&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
	};

	match (parts.next(), parts.next(), parts.next()) {
		(Some(table), None, None) => valid_part(table),
		(Some(schema), Some(table), None) => valid_part(schema) && valid_part(table),
		_ => false,
	}
}
