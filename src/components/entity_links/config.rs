use serde::{Deserialize, Serialize};

use super::error::LinksError;
use super::grouper::DEFAULT_GROUP_THRESHOLD;
use super::pipeline::HIDE_LINKS_THRESHOLD;

/// Tunables for the links view. Every field falls back to its default when
/// absent from the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksViewConfig {
	/// Types with more left entities than this are grouped.
	pub group_threshold: usize,
	pub hide_links_threshold: usize,
	/// Page size for the left side while a type filter is active.
	pub page_size: usize,
	/// Horizontal reach of the bezier control points, as a fraction of the lane.
	pub control_reach: f64,
	pub min_stroke_width: f64,
	/// Entry arc radius as a fraction of the column width.
	pub entry_arc_ratio: f64,
	pub inactive_opacity: f64,
	/// Base URL of the related-entities API; `None` serves the sample graph.
	pub api_base_url: Option<String>,
}

impl Default for LinksViewConfig {
	fn default() -> Self {
		Self {
			group_threshold: DEFAULT_GROUP_THRESHOLD,
			hide_links_threshold: HIDE_LINKS_THRESHOLD,
			page_size: 50,
			control_reach: 0.6,
			min_stroke_width: 2.0,
			entry_arc_ratio: 1.0 / 3.0,
			inactive_opacity: 0.25,
			api_base_url: None,
		}
	}
}

impl LinksViewConfig {
	pub fn from_json(input: &str) -> Result<Self, LinksError> {
		let config: Self = serde_json::from_str(input)?;
		Ok(config.sanitized())
	}

	/// Clamp values that would break layout math.
	fn sanitized(mut self) -> Self {
		self.page_size = self.page_size.max(1);
		self.control_reach = self.control_reach.clamp(0.0, 1.0);
		self.min_stroke_width = self.min_stroke_width.max(0.0);
		self.entry_arc_ratio = self.entry_arc_ratio.clamp(0.0, 1.0);
		self.inactive_opacity = self.inactive_opacity.clamp(0.0, 1.0);
		self
	}
}
