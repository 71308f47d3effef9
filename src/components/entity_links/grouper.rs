use std::collections::{BTreeMap, HashMap};

use super::types::{Entity, EntityRecord, GroupDescriptor, GroupEntity, LinkEdge};

pub const DEFAULT_GROUP_THRESHOLD: usize = 3;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grouped {
	pub entities: Vec<EntityRecord>,
	pub edges: Vec<LinkEdge>,
	pub groups: Vec<GroupDescriptor>,
}

/// Collapse every type with more than `threshold` members into one group record.
///
/// Ungrouped entities come first, then the groups, each run sorted by type.
/// Edges leaving a grouped entity are re-pointed at the group id; the rest
/// pass through untouched.
pub fn group(entities: Vec<Entity>, edges: Vec<LinkEdge>, threshold: usize) -> Grouped {
	let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
	for entity in &entities {
		*counts.entry(entity.entity_type.as_str()).or_default() += 1;
	}

	let groups: Vec<GroupDescriptor> = counts
		.iter()
		.filter(|&(_, &count)| count > threshold)
		.map(|(&entity_type, &count)| GroupDescriptor {
			entity_type: entity_type.to_string(),
			count,
		})
		.collect();

	let member_of: HashMap<&str, &str> = entities
		.iter()
		.filter(|e| counts[e.entity_type.as_str()] > threshold)
		.map(|e| (e.id.as_str(), e.entity_type.as_str()))
		.collect();

	let edges = edges
		.into_iter()
		.map(|edge| match member_of.get(edge.from.as_str()) {
			Some(&group_id) => LinkEdge {
				from: group_id.to_string(),
				..edge
			},
			None => edge,
		})
		.collect();

	let mut ungrouped: Vec<EntityRecord> = entities
		.iter()
		.filter(|e| counts[e.entity_type.as_str()] <= threshold)
		.cloned()
		.map(EntityRecord::Real)
		.collect();
	ungrouped.sort_by(|a, b| a.entity_type().cmp(b.entity_type()));

	// BTreeMap iteration already yields the groups sorted by type.
	ungrouped.extend(groups.iter().map(|g| {
		EntityRecord::Group(GroupEntity {
			entity_type: g.entity_type.clone(),
			count: g.count,
			name: format!("{} {}", g.count, pluralize(&g.entity_type)),
		})
	}));

	Grouped {
		entities: ungrouped,
		edges,
		groups,
	}
}

/// Naive English plural, good enough for group labels.
pub fn pluralize(word: &str) -> String {
	let lower = word.to_ascii_lowercase();
	if let Some(stem) = word.strip_suffix('y') {
		let before = stem.chars().last();
		if before.is_some_and(|c| !"aeiouAEIOU".contains(c)) {
			return format!("{stem}ies");
		}
	}
	if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
		return format!("{word}es");
	}
	format!("{word}s")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entity(id: &str, ty: &str) -> Entity {
		Entity::new(id, ty, id)
	}

	#[test]
	fn small_types_pass_through_sorted() {
		let entities = vec![entity("e1", "email"), entity("c1", "card"), entity("e2", "email")];
		let edges = vec![LinkEdge::new("e1", "r1")];
		let out = group(entities, edges.clone(), DEFAULT_GROUP_THRESHOLD);

		let ids: Vec<&str> = out.entities.iter().map(|e| e.id()).collect();
		assert_eq!(ids, vec!["c1", "e1", "e2"]);
		assert!(out.groups.is_empty());
		assert_eq!(out.edges, edges);
	}

	#[test]
	fn large_type_collapses_into_one_group() {
		let entities = vec![
			entity("a", "T"),
			entity("b", "T"),
			entity("c", "T"),
			entity("d", "T"),
			entity("x", "S"),
		];
		let edges = vec![LinkEdge::new("a", "r1"), LinkEdge::new("x", "r1")];
		let out = group(entities, edges, DEFAULT_GROUP_THRESHOLD);

		let ids: Vec<&str> = out.entities.iter().map(|e| e.id()).collect();
		assert_eq!(ids, vec!["x", "T"]);
		assert_eq!(out.entities[1].group_count(), Some(4));
		assert_eq!(out.entities[1].name(), "4 Ts");
		assert_eq!(out.edges[0].from, "T");
		assert_eq!(out.edges[1].from, "x");
		assert_eq!(
			out.groups,
			vec![GroupDescriptor {
				entity_type: "T".into(),
				count: 4
			}]
		);
	}

	#[test]
	fn groups_are_sorted_by_type() {
		let mut entities = Vec::new();
		for i in 0..4 {
			entities.push(entity(&format!("z{i}"), "zip"));
			entities.push(entity(&format!("a{i}"), "account"));
		}
		let out = group(entities, Vec::new(), DEFAULT_GROUP_THRESHOLD);
		let ids: Vec<&str> = out.entities.iter().map(|e| e.id()).collect();
		assert_eq!(ids, vec!["account", "zip"]);
	}

	#[test]
	fn pluralize_handles_common_endings() {
		assert_eq!(pluralize("device"), "devices");
		assert_eq!(pluralize("ip address"), "ip addresses");
		assert_eq!(pluralize("company"), "companies");
		assert_eq!(pluralize("key"), "keys");
		assert_eq!(pluralize("batch"), "batches");
	}
}
