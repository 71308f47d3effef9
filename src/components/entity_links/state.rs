use std::collections::HashSet;

use super::types::LinkEdge;

/// Which single entity, if any, is highlighted.
///
/// At most one side holds a selection. `last_left_selection` only remembers
/// the left id that was most recently cleared so the entry arcs can fade it
/// out underneath the new one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
	pub left_selection: Option<String>,
	pub right_selection: Option<String>,
	pub last_left_selection: Option<String>,
}

/// Entities drawn at full opacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActiveSet {
	All,
	Only(HashSet<String>),
}

impl ActiveSet {
	pub fn contains(&self, id: &str) -> bool {
		match self {
			Self::All => true,
			Self::Only(ids) => ids.contains(id),
		}
	}
}

impl SelectionState {
	pub fn has_selection(&self) -> bool {
		self.left_selection.is_some() || self.right_selection.is_some()
	}

	pub fn click_left(&mut self, id: &str) {
		let previous = self.left_selection.take();
		if previous.as_deref() != Some(id) {
			self.left_selection = Some(id.to_string());
		}
		if previous.is_some() {
			self.last_left_selection = previous;
		}
		self.right_selection = None;
	}

	pub fn click_right(&mut self, id: &str) {
		if let Some(previous) = self.left_selection.take() {
			self.last_left_selection = Some(previous);
		}
		if self.right_selection.as_deref() == Some(id) {
			self.right_selection = None;
		} else {
			self.right_selection = Some(id.to_string());
		}
	}

	/// Type-filter changes drop any selection.
	pub fn reset(&mut self) {
		self.left_selection = None;
		self.right_selection = None;
	}

	pub fn active_set(&self, links: &[LinkEdge]) -> ActiveSet {
		if let Some(left) = &self.left_selection {
			let mut ids: HashSet<String> = links
				.iter()
				.filter(|l| &l.from == left)
				.map(|l| l.to.clone())
				.collect();
			ids.insert(left.clone());
			ActiveSet::Only(ids)
		} else if let Some(right) = &self.right_selection {
			let mut ids: HashSet<String> = links
				.iter()
				.filter(|l| &l.to == right)
				.map(|l| l.from.clone())
				.collect();
			ids.insert(right.clone());
			ActiveSet::Only(ids)
		} else {
			ActiveSet::All
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn links() -> Vec<LinkEdge> {
		vec![
			LinkEdge::new("a", "r1"),
			LinkEdge::new("a", "r2"),
			LinkEdge::new("b", "r2"),
		]
	}

	#[test]
	fn left_click_toggles() {
		let mut state = SelectionState::default();
		state.click_left("a");
		assert_eq!(state.left_selection.as_deref(), Some("a"));
		state.click_left("a");
		assert_eq!(state.left_selection, None);
		assert_eq!(state.last_left_selection.as_deref(), Some("a"));
	}

	#[test]
	fn switching_left_remembers_previous() {
		let mut state = SelectionState::default();
		state.click_left("a");
		state.click_left("b");
		assert_eq!(state.left_selection.as_deref(), Some("b"));
		assert_eq!(state.last_left_selection.as_deref(), Some("a"));
	}

	#[test]
	fn sides_are_mutually_exclusive() {
		let mut state = SelectionState::default();
		state.click_left("a");
		state.click_right("r1");
		assert_eq!(state.left_selection, None);
		assert_eq!(state.right_selection.as_deref(), Some("r1"));

		state.click_left("b");
		assert_eq!(state.right_selection, None);
		assert_eq!(state.left_selection.as_deref(), Some("b"));
	}

	#[test]
	fn right_click_toggles() {
		let mut state = SelectionState::default();
		state.click_right("r1");
		state.click_right("r1");
		assert!(!state.has_selection());
	}

	#[test]
	fn reset_clears_both_sides() {
		let mut state = SelectionState::default();
		state.click_right("r1");
		state.reset();
		assert!(!state.has_selection());
	}

	#[test]
	fn active_set_follows_selection() {
		let mut state = SelectionState::default();
		assert_eq!(state.active_set(&links()), ActiveSet::All);

		state.click_left("a");
		let active = state.active_set(&links());
		assert!(active.contains("a") && active.contains("r1") && active.contains("r2"));
		assert!(!active.contains("b"));

		state.click_right("r2");
		let active = state.active_set(&links());
		assert!(active.contains("a") && active.contains("b") && active.contains("r2"));
		assert!(!active.contains("r1"));
	}
}
