//! Entity relationship graph view: left sources, right targets and the links
//! between them.

mod component;
pub mod config;
pub mod error;
pub mod grouper;
pub mod layout;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod state;
pub mod types;

pub use component::EntityLinksView;
pub use config::LinksViewConfig;
pub use error::LinksError;
pub use query::{ApiClient, QuerySource, RelatedEntitiesQuery, RequestTracker, SampleGraph};
pub use types::{DisplayEntity, Entity, EntityRecord, LinkEdge, RelatedEntities};
