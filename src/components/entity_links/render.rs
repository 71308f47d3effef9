//! Screen-space geometry for the link lane and the entry arcs.

use super::config::LinksViewConfig;
use super::layout::LinkLayout;
use super::state::{ActiveSet, SelectionState};
use super::types::{DisplayEntity, LinkEdge};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
	Active,
	/// Another entity is selected and this one is not related to it.
	Dimmed,
	/// Edge of a hidden-links source.
	Faded,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkSegment {
	pub from: String,
	pub to: String,
	pub path: String,
	pub stroke_width: f64,
	pub emphasis: Emphasis,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EntryArc {
	pub id: String,
	pub path: String,
	pub active: bool,
}

/// Cubic bezier from `(0, y1)` to `(width, y2)` with both control points
/// pulled horizontally toward the opposite side.
pub fn link_path(y1: f64, y2: f64, width: f64, reach: f64) -> String {
	let pull = width * reach;
	format!(
		"M 0 {y1} C {c1} {y1}, {c2} {y2}, {width} {y2}",
		c1 = pull,
		c2 = width - pull
	)
}

/// Sub-linear stroke width; a missing weight counts as 1.
pub fn stroke_width(weight: Option<f64>, min: f64) -> f64 {
	let weight = weight.unwrap_or(1.0).max(0.0);
	(weight + 1.0).ln().max(min)
}

/// Entry indicator running down the left edge of the column and curving into
/// the card centre at `y`.
pub fn entry_arc_path(y: f64, column_width: f64, ratio: f64) -> String {
	let r = (column_width * ratio).min(y.max(0.0));
	format!(
		"M 0 0 L 0 {down} C 0 {y}, 0 {y}, {r} {y} L {column_width} {y}",
		down = y - r
	)
}

/// Card caption for an entity's link total. `hidden` is the number of those
/// links held back for a hidden-links source.
pub fn links_label(link_count: usize, hidden: Option<usize>) -> String {
	let total = if link_count == 1 {
		"1 link".to_string()
	} else {
		format!("{link_count} links")
	};
	match hidden {
		Some(hidden) => format!("{total}, {hidden} hidden"),
		None => total,
	}
}

pub fn link_segments(
	links: &[LinkEdge],
	layout: &LinkLayout,
	active: &ActiveSet,
	selected: &[LinkEdge],
	config: &LinksViewConfig,
) -> Vec<LinkSegment> {
	let has_selection = !matches!(active, ActiveSet::All);
	let mut segments: Vec<LinkSegment> = links
		.iter()
		.filter_map(|link| {
			let y1 = *layout.left_heights.get(&link.from)?;
			let y2 = *layout.right_heights.get(&link.to)?;
			let emphasis = if has_selection && !selected.contains(link) {
				Emphasis::Dimmed
			} else if link.is_faded() && !selected.contains(link) {
				Emphasis::Faded
			} else {
				Emphasis::Active
			};
			Some(LinkSegment {
				from: link.from.clone(),
				to: link.to.clone(),
				path: link_path(y1, y2, layout.width, config.control_reach),
				stroke_width: stroke_width(link.weight, config.min_stroke_width),
				emphasis,
			})
		})
		.collect();
	// Active edges go last so they are painted on top.
	segments.sort_by_key(|s| s.emphasis == Emphasis::Active);
	segments
}

/// One arc per measured left card, spanning the measured entry lane. The
/// current left selection is drawn last and the previously selected one just
/// before it.
pub fn entry_arcs(
	left: &[DisplayEntity],
	layout: &LinkLayout,
	selection: &SelectionState,
	config: &LinksViewConfig,
) -> Vec<EntryArc> {
	let rank = |id: &str| {
		if selection.left_selection.as_deref() == Some(id) {
			2
		} else if selection.last_left_selection.as_deref() == Some(id) {
			1
		} else {
			0
		}
	};
	let mut arcs: Vec<(u8, EntryArc)> = left
		.iter()
		.filter_map(|entity| {
			let y = *layout.left_heights.get(&entity.id)?;
			Some((
				rank(&entity.id),
				EntryArc {
					id: entity.id.clone(),
					path: entry_arc_path(y, layout.entry_width, config.entry_arc_ratio),
					active: selection.left_selection.is_none()
						|| selection.left_selection.as_deref() == Some(entity.id.as_str()),
				},
			))
		})
		.collect();
	arcs.sort_by_key(|(rank, _)| *rank);
	arcs.into_iter().map(|(_, arc)| arc).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn layout() -> LinkLayout {
		let mut layout = LinkLayout {
			width: 200.0,
			entry_width: 60.0,
			..Default::default()
		};
		layout.left_heights.insert("a".into(), 20.0);
		layout.left_heights.insert("b".into(), 60.0);
		layout.right_heights.insert("r".into(), 40.0);
		layout
	}

	fn display(id: &str) -> DisplayEntity {
		DisplayEntity {
			id: id.into(),
			name: id.into(),
			entity_type: "T".into(),
			group_count: None,
			link_count: 0,
		}
	}

	#[test]
	fn link_path_pulls_control_points_sixty_percent() {
		assert_eq!(
			link_path(10.0, 50.0, 100.0, 0.6),
			"M 0 10 C 60 10, 40 50, 100 50"
		);
	}

	#[test]
	fn stroke_width_has_a_floor() {
		assert_eq!(stroke_width(None, 2.0), 2.0);
		assert_eq!(stroke_width(Some(0.0), 2.0), 2.0);
		let heavy = stroke_width(Some(100.0), 2.0);
		assert!((heavy - 101_f64.ln()).abs() < 1e-9);
	}

	#[test]
	fn entry_arc_radius_is_clamped_to_height() {
		assert_eq!(
			entry_arc_path(90.0, 60.0, 1.0 / 3.0),
			"M 0 0 L 0 70 C 0 90, 0 90, 20 90 L 60 90"
		);
		assert_eq!(
			entry_arc_path(5.0, 60.0, 1.0 / 3.0),
			"M 0 0 L 0 0 C 0 5, 0 5, 5 5 L 60 5"
		);
	}

	#[test]
	fn links_label_counts_hidden_links() {
		assert_eq!(links_label(1, None), "1 link");
		assert_eq!(links_label(12, None), "12 links");
		assert_eq!(links_label(45, Some(43)), "45 links, 43 hidden");
		assert_eq!(links_label(41, Some(41)), "41 links, 41 hidden");
	}

	#[test]
	fn unmeasured_links_are_skipped() {
		let links = vec![LinkEdge::new("a", "r"), LinkEdge::new("c", "r")];
		let segments = link_segments(
			&links,
			&layout(),
			&ActiveSet::All,
			&[],
			&LinksViewConfig::default(),
		);
		assert_eq!(segments.len(), 1);
		assert_eq!(segments[0].emphasis, Emphasis::Active);
	}

	#[test]
	fn selection_dims_unrelated_links_and_draws_selected_last() {
		let links = vec![LinkEdge::new("a", "r"), LinkEdge::new("b", "r")];
		let mut selection = SelectionState::default();
		selection.click_left("a");
		let active = selection.active_set(&links);
		let selected = vec![links[0].clone()];
		let segments = link_segments(&links, &layout(), &active, &selected, &LinksViewConfig::default());
		assert_eq!(segments[0].from, "b");
		assert_eq!(segments[0].emphasis, Emphasis::Dimmed);
		assert_eq!(segments[1].from, "a");
		assert_eq!(segments[1].emphasis, Emphasis::Active);
	}

	#[test]
	fn faded_links_stay_faded_without_selection() {
		let mut link = LinkEdge::new("a", "r");
		link.weight = Some(0.0);
		let segments = link_segments(&[link], &layout(), &ActiveSet::All, &[], &LinksViewConfig::default());
		assert_eq!(segments[0].emphasis, Emphasis::Faded);
	}

	#[test]
	fn entry_arcs_put_selection_on_top() {
		let left = vec![display("a"), display("b")];
		let mut selection = SelectionState::default();
		selection.click_left("a");
		selection.click_left("b");
		let arcs = entry_arcs(&left, &layout(), &selection, &LinksViewConfig::default());
		let order: Vec<&str> = arcs.iter().map(|a| a.id.as_str()).collect();
		assert_eq!(order, vec!["a", "b"]);
		assert!(arcs[1].active);
		assert!(!arcs[0].active);
	}

	#[test]
	fn entry_arcs_follow_measured_lane_width() {
		let left = vec![display("b")];
		let mut layout = layout();
		layout.entry_width = 90.0;
		let arcs = entry_arcs(&left, &layout, &SelectionState::default(), &LinksViewConfig::default());
		assert_eq!(arcs[0].path, "M 0 0 L 0 30 C 0 60, 0 60, 30 60 L 90 60");
	}
}
