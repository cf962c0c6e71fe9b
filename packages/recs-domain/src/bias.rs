use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::correlator::{FieldBias, field_values};
use recs_config::{DomainTypeConfig, ITEM_BIAS_KEY, USER_BIAS_KEY};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBiases {
	pub field_biases: Vec<FieldBias>,
	pub item_bias: f64,
	pub user_bias: f64,
}

/// Builds the domain-level field biases for a target item.
///
/// The override set wins wholesale when it holds any key; otherwise the domain defaults apply. A
/// declared field contributes only when its bias key is present in the active source and the item
/// document carries a value for it.
pub fn resolve_biases(
	item: Option<&Map<String, Value>>,
	domain: &DomainTypeConfig,
) -> ResolvedBiases {
	let active = active_bias_source(domain);
	let mut field_biases = Vec::new();

	for field in &domain.fields {
		let Some(bias) = active.get(&field.config_bias_name) else {
			continue;
		};
		let Some(values) = item.and_then(|doc| doc.get(&field.field_name)).and_then(field_values)
		else {
			continue;
		};

		field_biases.push(FieldBias { name: field.field_name.clone(), values, bias: *bias });
	}

	let resolved = ResolvedBiases {
		field_biases,
		item_bias: active.get(ITEM_BIAS_KEY).copied().unwrap_or(1.0),
		user_bias: active.get(USER_BIAS_KEY).copied().unwrap_or(1.0),
	};

	tracing::debug!(domain = %domain.path, resolved = ?resolved, "Resolved field biases.");

	resolved
}

fn active_bias_source(domain: &DomainTypeConfig) -> &HashMap<String, f64> {
	if domain.bias.is_empty() { &domain.default_bias } else { &domain.bias }
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use recs_config::{BiasField, RecsModel};

	fn domain(default_bias: &[(&str, f64)], bias: &[(&str, f64)]) -> DomainTypeConfig {
		DomainTypeConfig {
			path: "/vendor".to_string(),
			relation_name: "pio_event_1".to_string(),
			index_name: "vendor".to_string(),
			event_names: vec!["view".to_string()],
			default_bias: default_bias.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
			bias: bias.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
			fields: vec![
				BiasField {
					config_bias_name: "status_filter".to_string(),
					field_name: "status".to_string(),
				},
				BiasField {
					config_bias_name: "city_bias".to_string(),
					field_name: "city_slug".to_string(),
				},
			],
			recs_model: RecsModel::All,
			rankings: Vec::new(),
			blacklist_events: Vec::new(),
		}
	}

	fn doc(value: Value) -> Map<String, Value> {
		value.as_object().cloned().expect("Document must be an object.")
	}

	#[test]
	fn overrides_replace_defaults_wholesale() {
		let domain = domain(&[("item_bias", 2.0), ("status_filter", -1.0)], &[("city_bias", 5.0)]);
		let item = doc(json!({ "status": "active", "city_slug": "pune" }));
		let resolved = resolve_biases(Some(&item), &domain);

		assert_eq!(resolved.field_biases, vec![FieldBias {
			name: "city_slug".to_string(),
			values: vec!["pune".to_string()],
			bias: 5.0,
		}]);
		assert_eq!(resolved.item_bias, 1.0);
	}

	#[test]
	fn fields_missing_from_document_are_absent() {
		let domain = domain(&[("status_filter", -1.0), ("city_bias", 10.0)], &[]);
		let item = doc(json!({ "status": "active", "city_slug": null }));
		let resolved = resolve_biases(Some(&item), &domain);

		assert_eq!(resolved.field_biases.len(), 1);
		assert_eq!(resolved.field_biases[0].name, "status");
	}

	#[test]
	fn multipliers_default_to_neutral_without_item() {
		let domain = domain(&[("user_bias", -3.0), ("status_filter", -1.0)], &[]);
		let resolved = resolve_biases(None, &domain);

		assert!(resolved.field_biases.is_empty());
		assert_eq!(resolved.item_bias, 1.0);
		assert_eq!(resolved.user_bias, -3.0);
	}
}
