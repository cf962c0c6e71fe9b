use time::{Duration, OffsetDateTime};

use recs_config::Postgres;
use recs_storage::{db::Db, events};
use recs_testkit::{EVENT_RELATION, SeedEvent, TestDatabase};

fn seed<'a>(
	entity_id: &'a str,
	event: &'a str,
	target: &'a str,
	event_time: OffsetDateTime,
) -> SeedEvent<'a> {
	SeedEvent {
		entity_type: "user",
		entity_id,
		event,
		target_entity_id: Some(target),
		event_time,
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set RECS_PG_DSN to run."]
async fn recent_user_events_keep_latest_row_per_event() {
	let Some(base_dsn) = recs_testkit::env_dsn() else {
		eprintln!("Skipping recent_user_events_keep_latest_row_per_event; set RECS_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let pool = test_db.pool().await.expect("Failed to open seed pool.");
	let now = OffsetDateTime::now_utc();

	test_db.create_event_relation(&pool).await.expect("Failed to create event relation.");
	test_db
		.insert_events(&pool, &[
			seed("u1", "view", "a", now - Duration::hours(2)),
			seed("u1", "view", "b", now - Duration::hours(1)),
			seed("u1", "leads", "c", now - Duration::hours(3)),
			seed("u2", "view", "z", now),
		])
		.await
		.expect("Failed to seed events.");

	let db = Db::connect(&Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 })
		.await
		.expect("Failed to connect to Postgres.");
	let event_names = vec!["view".to_string(), "leads".to_string()];
	let mut rows = events::recent_user_events(&db, EVENT_RELATION, "u1", &event_names, 2_000)
		.await
		.expect("Failed to fetch recent events.");

	rows.sort_by(|left, right| left.event.cmp(&right.event));

	let pairs: Vec<(&str, Option<&str>)> =
		rows.iter().map(|row| (row.event.as_str(), row.target_entity_id.as_deref())).collect();

	assert_eq!(pairs, vec![("leads", Some("c")), ("view", Some("b"))]);
	assert!(rows.iter().all(|row| row.entity_id == "u1" && row.entity_type == "user"));

	let none = events::recent_user_events(&db, EVENT_RELATION, "nobody", &event_names, 2_000)
		.await
		.expect("Failed to fetch recent events.");

	assert!(none.is_empty());

	pool.close().await;
	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
