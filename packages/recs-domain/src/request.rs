use serde::{Deserialize, Serialize};

use crate::correlator::RawFieldBias;

/// One recommendation request after pagination has been resolved upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuery {
	#[serde(default)]
	pub user_id: Option<String>,
	#[serde(default)]
	pub item_id: Option<String>,
	#[serde(default = "neutral_multiplier")]
	pub user_bias_multiplier: f64,
	#[serde(default = "neutral_multiplier")]
	pub item_bias_multiplier: f64,
	#[serde(default)]
	pub field_biases: Vec<RawFieldBias>,
	#[serde(default)]
	pub offset: u32,
	#[serde(default = "default_limit")]
	pub limit: u32,
	#[serde(default)]
	pub blacklist_item_ids: Vec<String>,
}
impl RequestQuery {
	/// The target item id, unless absent, empty, or equal to the "no item" sentinel.
	pub fn target_item<'a>(&'a self, no_item_sentinel: &str) -> Option<&'a str> {
		self.item_id
			.as_deref()
			.map(str::trim)
			.filter(|item| !item.is_empty() && *item != no_item_sentinel)
	}

	pub fn target_user(&self) -> Option<&str> {
		self.user_id.as_deref().map(str::trim).filter(|user| !user.is_empty())
	}
}
impl Default for RequestQuery {
	fn default() -> Self {
		Self {
			user_id: None,
			item_id: None,
			user_bias_multiplier: neutral_multiplier(),
			item_bias_multiplier: neutral_multiplier(),
			field_biases: Vec::new(),
			offset: 0,
			limit: default_limit(),
			blacklist_item_ids: Vec::new(),
		}
	}
}

fn neutral_multiplier() -> f64 {
	1.0
}

fn default_limit() -> u32 {
	10
}
