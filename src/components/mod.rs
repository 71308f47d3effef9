//! View components.

pub mod entity_links;
