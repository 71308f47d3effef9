use std::collections::HashMap;

use web_sys::HtmlElement;

/// Something rendered whose vertical centre can be read back after layout.
pub trait CardHandle {
	fn vertical_center(&self) -> f64;
}

impl CardHandle for HtmlElement {
	fn vertical_center(&self) -> f64 {
		self.offset_top() as f64 + self.offset_height() as f64 / 2.0
	}
}

/// Live card handles keyed by entity id.
///
/// Cards register themselves on mount and unregister on cleanup. The
/// generation returned by `register` guards against a late cleanup from an
/// old card removing the handle of a newer card with the same id.
#[derive(Debug)]
pub struct ElementRegistry<H> {
	entries: HashMap<String, (u64, H)>,
	next_generation: u64,
}

impl<H> Default for ElementRegistry<H> {
	fn default() -> Self {
		Self {
			entries: HashMap::new(),
			next_generation: 0,
		}
	}
}

impl<H> ElementRegistry<H> {
	pub fn register(&mut self, id: impl Into<String>, handle: H) -> u64 {
		self.next_generation += 1;
		let generation = self.next_generation;
		self.entries.insert(id.into(), (generation, handle));
		generation
	}

	pub fn unregister(&mut self, id: &str, generation: u64) -> bool {
		let current = self.entries.get(id).map(|(g, _)| *g);
		if current != Some(generation) {
			return false;
		}
		self.entries.remove(id);
		true
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, id: &str) -> Option<&H> {
		self.entries.get(id).map(|(_, h)| h)
	}
}

impl<H: CardHandle> ElementRegistry<H> {
	pub fn centers(&self) -> HashMap<String, f64> {
		self.entries
			.iter()
			.map(|(id, (_, handle))| (id.clone(), handle.vertical_center()))
			.collect()
	}
}

/// Measured card centres for both columns, the width of the link lane and
/// the width of the entry lane in front of the left column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkLayout {
	pub left_heights: HashMap<String, f64>,
	pub right_heights: HashMap<String, f64>,
	pub width: f64,
	pub entry_width: f64,
}

pub fn measure<H: CardHandle>(
	left: &ElementRegistry<H>,
	right: &ElementRegistry<H>,
	width: f64,
	entry_width: f64,
) -> LinkLayout {
	LinkLayout {
		left_heights: left.centers(),
		right_heights: right.centers(),
		width: width.max(0.0),
		entry_width: entry_width.max(0.0),
	}
}
