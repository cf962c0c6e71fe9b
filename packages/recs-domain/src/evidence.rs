use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::correlator::{Correlator, boost_for_multiplier, field_values};

/// One row of a user's recent history, as far as query compilation cares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentEvent {
	pub event: String,
	pub target_entity_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecentActions {
	pub correlators: Vec<Correlator>,
	pub events: Vec<RecentEvent>,
}

/// Reads the co-occurrence id list stored on the target item for each event.
///
/// An event whose attribute is missing (or null) reuses the list read for the previous event.
/// Lists longer than `max_query_events` keep their first `max_query_events - 1` ids.
pub fn similar_item_correlators(
	item: &Map<String, Value>,
	event_names: &[String],
	item_multiplier: f64,
	max_query_events: usize,
) -> Vec<Correlator> {
	let boost = boost_for_multiplier(item_multiplier);
	let mut ids: Vec<String> = Vec::new();
	let mut out = Vec::with_capacity(event_names.len());

	for event in event_names {
		// A missing list carries the previous event's ids forward on purpose. Whether it should
		// reset to empty instead is still unconfirmed against live traffic.
		if let Some(list) = item.get(event).and_then(field_values) {
			ids = list;
		}

		out.push(Correlator::new(event.clone(), cap_ids(&ids, max_query_events), boost));
	}

	out
}

pub fn cap_ids(ids: &[String], max_query_events: usize) -> Vec<String> {
	if ids.len() <= max_query_events {
		ids.to_vec()
	} else {
		ids[..max_query_events.saturating_sub(1)].to_vec()
	}
}

/// Collects distinct target ids per declared event while rows stream in.
#[derive(Debug)]
pub struct RecentActionAccumulator {
	event_names: Vec<String>,
	max_items_per_user: usize,
	ids: Vec<Vec<String>>,
	seen: Vec<HashSet<String>>,
	events: Vec<RecentEvent>,
}
impl RecentActionAccumulator {
	pub fn new(event_names: &[String], max_items_per_user: usize) -> Self {
		Self {
			event_names: event_names.to_vec(),
			max_items_per_user,
			ids: vec![Vec::new(); event_names.len()],
			seen: vec![HashSet::new(); event_names.len()],
			events: Vec::new(),
		}
	}

	pub fn push(&mut self, event: &str, target_entity_id: Option<&str>) {
		self.events.push(RecentEvent {
			event: event.to_string(),
			target_entity_id: target_entity_id.map(str::to_string),
		});

		let Some(target) = target_entity_id else {
			return;
		};
		let Some(slot) = self.event_names.iter().position(|name| name == event) else {
			return;
		};

		if self.ids[slot].len() < self.max_items_per_user
			&& self.seen[slot].insert(target.to_string())
		{
			self.ids[slot].push(target.to_string());
		}
	}

	pub fn finish(self, user_multiplier: f64) -> RecentActions {
		let boost = boost_for_multiplier(user_multiplier);
		let correlators = self
			.event_names
			.into_iter()
			.zip(self.ids)
			.map(|(event, ids)| Correlator::new(event, ids, boost))
			.collect();

		RecentActions { correlators, events: self.events }
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn events(names: &[&str]) -> Vec<String> {
		names.iter().map(|name| name.to_string()).collect()
	}

	#[test]
	fn missing_event_list_carries_previous_forward() {
		let item = json!({ "leads": ["a", "b"], "saved": ["z"] });
		let item = item.as_object().expect("Object.");
		let correlators =
			similar_item_correlators(item, &events(&["leads", "view", "saved"]), 1.0, 100);

		assert_eq!(correlators[0].entity_ids, vec!["a".to_string(), "b".to_string()]);
		assert_eq!(correlators[1].entity_ids, correlators[0].entity_ids);
		assert_eq!(correlators[1].signal_name.as_deref(), Some("view"));
		assert_eq!(correlators[2].entity_ids, vec!["z".to_string()]);
		assert!(correlators.iter().all(|c| c.boost.is_none()));
	}

	#[test]
	fn caps_keep_prefix() {
		let ids: Vec<String> = (0..150).map(|n| n.to_string()).collect();

		assert_eq!(cap_ids(&ids[..100], 100).len(), 100);
		assert_eq!(cap_ids(&ids[..101], 100).len(), 99);

		let capped = cap_ids(&ids, 100);

		assert_eq!(capped.len(), 99);
		assert_eq!(capped.first().map(String::as_str), Some("0"));
		assert_eq!(capped.last().map(String::as_str), Some("98"));
	}

	#[test]
	fn accumulator_dedupes_and_caps_per_event() {
		let mut acc = RecentActionAccumulator::new(&events(&["view", "leads"]), 2);

		acc.push("view", Some("a"));
		acc.push("view", Some("a"));
		acc.push("leads", Some("a"));
		acc.push("view", Some("b"));
		acc.push("view", Some("c"));
		acc.push("rate", Some("d"));
		acc.push("view", None);

		let actions = acc.finish(2.5);

		assert_eq!(actions.correlators[0].entity_ids, vec!["a".to_string(), "b".to_string()]);
		assert_eq!(actions.correlators[1].entity_ids, vec!["a".to_string()]);
		assert_eq!(actions.correlators[0].boost, Some(2.5));
		assert_eq!(actions.events.len(), 7);
	}
}
