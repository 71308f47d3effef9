use serde::{Deserialize, Serialize};

/// Type label a group record reports when it is flattened for display.
pub const GROUP_TYPE: &str = "###GROUP###";

/// An entity as returned by the related-entities query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
	pub id: String,
	#[serde(rename = "type", default)]
	pub entity_type: String,
	#[serde(default)]
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub count: Option<u64>,
}

impl Entity {
	pub fn new(id: impl Into<String>, entity_type: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			entity_type: entity_type.into(),
			name: name.into(),
			count: None,
		}
	}
}

/// Synthetic stand-in for every entity of one type on the left side.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupEntity {
	pub entity_type: String,
	pub count: usize,
	pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityRecord {
	Real(Entity),
	Group(GroupEntity),
}

impl EntityRecord {
	/// Group ids share the entity id space: a group is keyed by its type.
	pub fn id(&self) -> &str {
		match self {
			Self::Real(e) => &e.id,
			Self::Group(g) => &g.entity_type,
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Real(e) => &e.name,
			Self::Group(g) => &g.name,
		}
	}

	pub fn entity_type(&self) -> &str {
		match self {
			Self::Real(e) => &e.entity_type,
			Self::Group(_) => GROUP_TYPE,
		}
	}

	pub fn group_count(&self) -> Option<usize> {
		match self {
			Self::Real(_) => None,
			Self::Group(g) => Some(g.count),
		}
	}

	pub fn is_group(&self) -> bool {
		matches!(self, Self::Group(_))
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkEdge {
	pub from: String,
	pub to: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub weight: Option<f64>,
}

impl LinkEdge {
	pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
		Self {
			from: from.into(),
			to: to.into(),
			weight: None,
		}
	}

	pub fn key(&self) -> (&str, &str) {
		(&self.from, &self.to)
	}

	/// Faded edges belong to a hidden-links source and carry a zero weight.
	pub fn is_faded(&self) -> bool {
		self.weight == Some(0.0)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupDescriptor {
	pub entity_type: String,
	pub count: usize,
}

/// Render-ready projection of a left or right entity.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayEntity {
	pub id: String,
	pub name: String,
	pub entity_type: String,
	pub group_count: Option<usize>,
	/// Raw link total, counted before any dedup or suppression.
	pub link_count: usize,
}

impl DisplayEntity {
	pub fn is_group(&self) -> bool {
		self.group_count.is_some()
	}
}

/// Payload of the related-entities query. Missing arrays decode as empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntities {
	#[serde(default)]
	pub left: Vec<Entity>,
	#[serde(default)]
	pub right: Vec<Entity>,
	#[serde(default)]
	pub links: Vec<LinkEdge>,
}

impl RelatedEntities {
	pub fn is_empty(&self) -> bool {
		self.left.is_empty() && self.right.is_empty() && self.links.is_empty()
	}

	/// Distinct left-side types in first-seen order.
	pub fn left_types(&self) -> Vec<String> {
		let mut types: Vec<String> = Vec::new();
		for entity in &self.left {
			if !types.contains(&entity.entity_type) {
				types.push(entity.entity_type.clone());
			}
		}
		types
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn group_record_is_keyed_by_type() {
		let record = EntityRecord::Group(GroupEntity {
			entity_type: "device".into(),
			count: 5,
			name: "5 devices".into(),
		});
		assert_eq!(record.id(), "device");
		assert_eq!(record.entity_type(), GROUP_TYPE);
		assert_eq!(record.group_count(), Some(5));
		assert!(record.is_group());
	}

	#[test]
	fn related_entities_tolerates_missing_fields() {
		let data: RelatedEntities =
			serde_json::from_str(r#"{"left":[{"id":"a","type":"ip"}],"links":[{"from":"a","to":"b"}]}"#)
				.unwrap();
		assert_eq!(data.left[0].name, "");
		assert!(data.right.is_empty());
		assert_eq!(data.links[0].weight, None);
	}

	#[test]
	fn left_types_keep_first_seen_order() {
		let data = RelatedEntities {
			left: vec![
				Entity::new("1", "email", "a@x"),
				Entity::new("2", "card", "4242"),
				Entity::new("3", "email", "b@x"),
			],
			..Default::default()
		};
		assert_eq!(data.left_types(), vec!["email".to_string(), "card".to_string()]);
	}
}
