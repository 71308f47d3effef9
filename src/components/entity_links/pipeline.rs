//! Ordered filter stages that turn a raw related-entities response into the
//! sets the links view renders.
//!
//! Every stage is a plain function over owned or borrowed snapshots; `process`
//! runs them in order. The order matters: suppression must see deduplicated,
//! membership-filtered edges, and right-side pruning must see the edges that
//! survived suppression.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use log::debug;

use super::config::LinksViewConfig;
use super::grouper::group;
use super::types::{DisplayEntity, Entity, EntityRecord, LinkEdge};

/// Sources with more outgoing edges than this get their edges faded.
pub const HIDE_LINKS_THRESHOLD: usize = 40;

/// A hidden-links edge is dropped only when its target keeps at least this
/// many edges from non-hidden sources.
pub const MIN_VISIBLE_INCOMING: usize = 2;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineOptions {
	pub left_type_filter: Option<String>,
	pub left_selection: Option<String>,
	pub right_selection: Option<String>,
	pub explicitly_visible_left: HashSet<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessedLinks {
	pub left: Vec<DisplayEntity>,
	pub right: Vec<DisplayEntity>,
	pub links: Vec<LinkEdge>,
	pub selected_links: Vec<LinkEdge>,
	pub hidden_entities: Vec<String>,
}

impl ProcessedLinks {
	pub fn is_hidden(&self, id: &str) -> bool {
		self.hidden_entities.iter().any(|h| h == id)
	}

	/// Drawn edges leaving `id` that are not faded out.
	pub fn visible_link_count(&self, id: &str) -> usize {
		self.links.iter().filter(|l| l.from == id && !l.is_faded()).count()
	}
}

/// An edge plus the number of raw edges folded into it by grouping.
#[derive(Clone, Debug, PartialEq)]
pub struct CountedEdge {
	pub edge: LinkEdge,
	pub multiplicity: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Suppressed {
	pub edges: Vec<CountedEdge>,
	pub hidden: Vec<String>,
}

pub fn process(
	left: &[Entity],
	right: &[Entity],
	edges: &[LinkEdge],
	options: &PipelineOptions,
	config: &LinksViewConfig,
) -> ProcessedLinks {
	let deduped = dedup(edges);
	let filter = options
		.left_type_filter
		.as_deref()
		.filter(|t| !t.is_empty());
	let (left_records, counted) = select_left(left, deduped, filter, config.group_threshold);
	let counted = filter_membership(counted, &left_records, right);
	let Suppressed {
		edges: counted,
		hidden,
	} = suppress_fan_out(
		counted,
		&left_records,
		&options.explicitly_visible_left,
		config.hide_links_threshold,
	);
	let right_kept = prune_right(right, &counted);
	let links = reweight_groups(counted, &left_records);
	let left_records = order_left(left_records, &links);

	let display_left = project_left(&left_records, left, edges);
	let display_right = project_right(&right_kept, edges);
	let selected = selected_links(
		&links,
		options.left_selection.as_deref(),
		options.right_selection.as_deref(),
	);

	debug!(
		"links pipeline: {} raw edges -> {} drawn, left {} -> {}, right {} -> {}, {} hidden",
		edges.len(),
		links.len(),
		left.len(),
		display_left.len(),
		right.len(),
		display_right.len(),
		hidden.len()
	);

	ProcessedLinks {
		left: display_left,
		right: display_right,
		links,
		selected_links: selected,
		hidden_entities: hidden,
	}
}

/// Keep the first edge for every `(from, to)` pair.
pub fn dedup(edges: &[LinkEdge]) -> Vec<LinkEdge> {
	let mut seen: HashSet<(&str, &str)> = HashSet::new();
	let mut out = Vec::with_capacity(edges.len());
	for edge in edges {
		if seen.insert(edge.key()) {
			out.push(edge.clone());
		}
	}
	out
}

/// Either narrow the left side to one type or group it.
///
/// Grouping can map several raw edges onto the same `(group, to)` pair; those
/// are folded here and their number kept as the edge multiplicity.
pub fn select_left(
	left: &[Entity],
	edges: Vec<LinkEdge>,
	type_filter: Option<&str>,
	group_threshold: usize,
) -> (Vec<EntityRecord>, Vec<CountedEdge>) {
	let (records, edges) = match type_filter {
		Some(ty) => {
			let records = left
				.iter()
				.filter(|e| e.entity_type == ty)
				.cloned()
				.map(EntityRecord::Real)
				.collect();
			(records, edges)
		}
		None => {
			let grouped = group(left.to_vec(), edges, group_threshold);
			(grouped.entities, grouped.edges)
		}
	};

	let mut index: HashMap<(String, String), usize> = HashMap::new();
	let mut counted: Vec<CountedEdge> = Vec::with_capacity(edges.len());
	for mut edge in edges {
		// Weights are assigned by suppression and group reweighting only.
		edge.weight = None;
		let key = (edge.from.clone(), edge.to.clone());
		match index.get(&key) {
			Some(&i) => counted[i].multiplicity += 1,
			None => {
				index.insert(key, counted.len());
				counted.push(CountedEdge {
					edge,
					multiplicity: 1,
				});
			}
		}
	}
	(records, counted)
}

/// Drop edges with an endpoint that is not on screen.
pub fn filter_membership(
	edges: Vec<CountedEdge>,
	left: &[EntityRecord],
	right: &[Entity],
) -> Vec<CountedEdge> {
	let left_ids: HashSet<&str> = left.iter().map(|e| e.id()).collect();
	let right_ids: HashSet<&str> = right.iter().map(|e| e.id.as_str()).collect();
	edges
		.into_iter()
		.filter(|e| left_ids.contains(e.edge.from.as_str()) && right_ids.contains(e.edge.to.as_str()))
		.collect()
}

/// Fade out the edges of left entities with too many links.
///
/// An edge from a hidden-links source disappears only when its target is
/// still reached by enough edges from non-hidden sources; otherwise it stays
/// with a zero weight so the target never loses its last connection.
pub fn suppress_fan_out(
	edges: Vec<CountedEdge>,
	left: &[EntityRecord],
	explicitly_visible: &HashSet<String>,
	threshold: usize,
) -> Suppressed {
	let mut out_degree: HashMap<&str, usize> = HashMap::new();
	for e in &edges {
		*out_degree.entry(e.edge.from.as_str()).or_default() += 1;
	}

	let hidden: Vec<String> = left
		.iter()
		.map(|l| l.id())
		.filter(|id| !explicitly_visible.contains(*id))
		.filter(|id| out_degree.get(id).copied().unwrap_or(0) > threshold)
		.map(str::to_string)
		.collect();
	if hidden.is_empty() {
		return Suppressed {
			edges,
			hidden,
		};
	}

	let hidden_set: HashSet<&str> = hidden.iter().map(String::as_str).collect();
	let mut visible_incoming: HashMap<String, usize> = HashMap::new();
	for e in &edges {
		if !hidden_set.contains(e.edge.from.as_str()) {
			*visible_incoming.entry(e.edge.to.clone()).or_default() += 1;
		}
	}

	let edges = edges
		.into_iter()
		.filter_map(|mut e| {
			if !hidden_set.contains(e.edge.from.as_str()) {
				return Some(e);
			}
			let others = visible_incoming.get(&e.edge.to).copied().unwrap_or(0);
			if others >= MIN_VISIBLE_INCOMING {
				return None;
			}
			e.edge.weight = Some(0.0);
			Some(e)
		})
		.collect();

	Suppressed {
		edges,
		hidden,
	}
}

/// Right entities nothing points at any more are not shown.
pub fn prune_right(right: &[Entity], edges: &[CountedEdge]) -> Vec<Entity> {
	let targets: HashSet<&str> = edges.iter().map(|e| e.edge.to.as_str()).collect();
	right
		.iter()
		.filter(|r| targets.contains(r.id.as_str()))
		.cloned()
		.collect()
}

/// Group edges carry the fraction of group members linked to the target.
pub fn reweight_groups(edges: Vec<CountedEdge>, left: &[EntityRecord]) -> Vec<LinkEdge> {
	let group_sizes: HashMap<&str, usize> = left
		.iter()
		.filter_map(|l| l.group_count().map(|n| (l.id(), n)))
		.collect();
	edges
		.into_iter()
		.map(|CountedEdge { mut edge, multiplicity }| {
			if let Some(&size) = group_sizes.get(edge.from.as_str()) {
				if !edge.is_faded() && size > 0 {
					edge.weight = Some(multiplicity as f64 / size as f64);
				}
			}
			edge
		})
		.collect()
}

/// Busiest left entities first; ties keep their incoming order.
pub fn order_left(mut left: Vec<EntityRecord>, links: &[LinkEdge]) -> Vec<EntityRecord> {
	let mut out_degree: HashMap<&str, usize> = HashMap::new();
	for l in links {
		*out_degree.entry(l.from.as_str()).or_default() += 1;
	}
	left.sort_by_key(|e| Reverse(out_degree.get(e.id()).copied().unwrap_or(0)));
	left
}

/// Project left records, counting links against the untouched raw edge list.
pub fn project_left(
	left: &[EntityRecord],
	raw_left: &[Entity],
	raw_edges: &[LinkEdge],
) -> Vec<DisplayEntity> {
	let type_of: HashMap<&str, &str> = raw_left
		.iter()
		.map(|e| (e.id.as_str(), e.entity_type.as_str()))
		.collect();
	let mut by_id: HashMap<&str, usize> = HashMap::new();
	let mut by_type: HashMap<&str, usize> = HashMap::new();
	for edge in raw_edges {
		*by_id.entry(edge.from.as_str()).or_default() += 1;
		if let Some(&ty) = type_of.get(edge.from.as_str()) {
			*by_type.entry(ty).or_default() += 1;
		}
	}

	left.iter()
		.map(|record| {
			let link_count = match record {
				EntityRecord::Real(e) => by_id.get(e.id.as_str()),
				EntityRecord::Group(g) => by_type.get(g.entity_type.as_str()),
			}
			.copied()
			.unwrap_or(0);
			DisplayEntity {
				id: record.id().to_string(),
				name: record.name().to_string(),
				entity_type: record.entity_type().to_string(),
				group_count: record.group_count(),
				link_count,
			}
		})
		.collect()
}

pub fn project_right(right: &[Entity], raw_edges: &[LinkEdge]) -> Vec<DisplayEntity> {
	let mut incoming: HashMap<&str, usize> = HashMap::new();
	for edge in raw_edges {
		*incoming.entry(edge.to.as_str()).or_default() += 1;
	}
	right
		.iter()
		.map(|e| DisplayEntity {
			id: e.id.clone(),
			name: e.name.clone(),
			entity_type: e.entity_type.clone(),
			group_count: None,
			link_count: incoming.get(e.id.as_str()).copied().unwrap_or(0),
		})
		.collect()
}

pub fn selected_links(
	links: &[LinkEdge],
	left_selection: Option<&str>,
	right_selection: Option<&str>,
) -> Vec<LinkEdge> {
	links
		.iter()
		.filter(|l| left_selection == Some(l.from.as_str()) || right_selection == Some(l.to.as_str()))
		.cloned()
		.collect()
}
