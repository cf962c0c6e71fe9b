//! Signals that become search clauses.
//!
//! A [`Correlator`] names a document field (an event name or a metadata field) together with the
//! ids or values that field should match. A correlator without a name is a placeholder and never
//! reaches a compiled query.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlator {
	pub signal_name: Option<String>,
	pub entity_ids: Vec<String>,
	pub boost: Option<f64>,
}
impl Correlator {
	pub fn new(
		signal_name: impl Into<String>,
		entity_ids: Vec<String>,
		boost: Option<f64>,
	) -> Self {
		Self { signal_name: Some(signal_name.into()), entity_ids, boost }
	}

	pub fn placeholder() -> Self {
		Self { signal_name: None, entity_ids: Vec::new(), boost: None }
	}

	pub fn to_filter(&self) -> FilterCorrelator {
		FilterCorrelator {
			signal_name: self.signal_name.clone(),
			entity_ids: self.entity_ids.clone(),
		}
	}
}

/// Filter-only projection; the clause built from it always carries a zero boost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCorrelator {
	pub signal_name: Option<String>,
	pub entity_ids: Vec<String>,
}

/// A well-formed metadata bias: `bias > 0` filters, `bias < 0` boosts, `bias == 0` excludes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBias {
	pub name: String,
	pub values: Vec<String>,
	pub bias: f64,
}
impl FieldBias {
	pub fn kind(&self) -> BiasKind {
		if self.bias > 0.0 {
			BiasKind::Filter
		} else if self.bias < 0.0 {
			BiasKind::Boost
		} else {
			BiasKind::Exclude
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasKind {
	Filter,
	Boost,
	Exclude,
}

/// Caller-supplied field bias as it arrived on the wire.
///
/// Any JSON shape deserializes; entries missing a name, values, or a finite bias are dropped by
/// [`RawFieldBias::validated`] rather than failing the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawFieldBias {
	pub name: Option<String>,
	pub values: Option<Vec<String>>,
	pub bias: Option<f64>,
}
impl RawFieldBias {
	pub fn validated(&self) -> Option<FieldBias> {
		let name = self.name.as_ref().filter(|name| !name.is_empty())?;
		let values = self.values.as_ref()?;
		let bias = self.bias.filter(|bias| bias.is_finite())?;

		Some(FieldBias { name: name.clone(), values: values.clone(), bias })
	}
}
impl From<Value> for RawFieldBias {
	fn from(value: Value) -> Self {
		let Value::Object(map) = value else {
			return Self::default();
		};
		let bias = match map.get("bias") {
			Some(Value::Number(number)) => number.as_f64(),
			Some(Value::String(raw)) => raw.trim().parse().ok(),
			_ => None,
		};

		Self {
			name: map.get("name").and_then(Value::as_str).map(str::to_string),
			values: map.get("values").and_then(field_values),
			bias,
		}
	}
}
impl From<FieldBias> for RawFieldBias {
	fn from(field: FieldBias) -> Self {
		Self { name: Some(field.name), values: Some(field.values), bias: Some(field.bias) }
	}
}

/// Boost applied to an evidence correlator for a bias multiplier, `None` for the neutral `1.0` and
/// for non-positive multipliers.
pub fn boost_for_multiplier(multiplier: f64) -> Option<f64> {
	(multiplier > 0.0 && multiplier != 1.0).then_some(multiplier)
}

/// Reads a document or request value as a list of match values.
///
/// Scalars become a one-element list, arrays keep their scalar members, `null` and objects are
/// treated as absent.
pub fn field_values(value: &Value) -> Option<Vec<String>> {
	match value {
		Value::Null | Value::Object(_) => None,
		Value::Array(items) => Some(items.iter().filter_map(scalar_to_string).collect()),
		scalar => scalar_to_string(scalar).map(|value| vec![value]),
	}
}

fn scalar_to_string(value: &Value) -> Option<String> {
	match value {
		Value::String(raw) => Some(raw.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn boost_skips_neutral_and_non_positive_multipliers() {
		assert_eq!(boost_for_multiplier(1.0), None);
		assert_eq!(boost_for_multiplier(0.0), None);
		assert_eq!(boost_for_multiplier(-2.0), None);
		assert_eq!(boost_for_multiplier(0.5), Some(0.5));
		assert_eq!(boost_for_multiplier(3.0), Some(3.0));
	}

	#[test]
	fn raw_field_bias_tolerates_any_shape() {
		let parsed: Vec<RawFieldBias> = serde_json::from_value(json!([
			{ "name": "city_slug", "values": ["pune"], "bias": -1 },
			{ "name": "status", "values": "active", "bias": "2" },
			{ "values": ["x"], "bias": 1 },
			{ "name": "budget", "bias": 1 },
			"garbage",
		]))
		.expect("Any JSON must deserialize.");
		let valid: Vec<_> = parsed.iter().filter_map(RawFieldBias::validated).collect();

		assert_eq!(valid.len(), 2);
		assert_eq!(valid[0].values, vec!["pune".to_string()]);
		assert_eq!(valid[1], FieldBias {
			name: "status".to_string(),
			values: vec!["active".to_string()],
			bias: 2.0,
		});
	}

	#[test]
	fn field_values_flatten_scalars() {
		assert_eq!(field_values(&json!([1, "a", null, true])), Some(vec![
			"1".to_string(),
			"a".to_string(),
			"true".to_string(),
		]));
		assert_eq!(field_values(&json!(null)), None);
		assert_eq!(field_values(&json!({ "k": 1 })), None);
	}

	#[test]
	fn bias_sign_selects_kind() {
		let field = |bias| FieldBias { name: "f".to_string(), values: Vec::new(), bias };

		assert_eq!(field(5.0).kind(), BiasKind::Filter);
		assert_eq!(field(-5.0).kind(), BiasKind::Boost);
		assert_eq!(field(0.0).kind(), BiasKind::Exclude);
	}
}
