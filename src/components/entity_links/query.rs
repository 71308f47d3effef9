//! Access to the related-entities query, either over HTTP or from a built-in
//! sample graph.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::info;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::error::LinksError;
use super::types::{Entity, LinkEdge, RelatedEntities};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelatedEntitiesQuery {
	pub entity_id: String,
	pub left_side_type: Option<String>,
	pub limit: Option<usize>,
	pub skip: Option<usize>,
}

impl RelatedEntitiesQuery {
	pub fn new(entity_id: impl Into<String>) -> Self {
		Self {
			entity_id: entity_id.into(),
			..Default::default()
		}
	}

	/// Narrow to one left type, paging through it `page_size` at a time.
	pub fn filtered(mut self, left_side_type: impl Into<String>, page: usize, page_size: usize) -> Self {
		self.left_side_type = Some(left_side_type.into());
		self.limit = Some(page_size);
		self.skip = Some(page * page_size);
		self
	}

	/// Pagination only applies while a left type is selected.
	fn page(&self) -> Option<(usize, usize)> {
		self.left_side_type.as_ref()?;
		Some((self.skip.unwrap_or(0), self.limit.unwrap_or(usize::MAX)))
	}

	pub fn path(&self) -> String {
		let mut path = format!("/api/entities/{}/related", urlencoding::encode(&self.entity_id));
		if let Some(ty) = &self.left_side_type {
			path.push_str(&format!("?leftSideType={}", urlencoding::encode(ty)));
			if let Some((skip, limit)) = self.page() {
				if limit != usize::MAX {
					path.push_str(&format!("&limit={limit}"));
				}
				path.push_str(&format!("&skip={skip}"));
			}
		}
		path
	}
}

#[derive(Clone, Debug)]
pub struct ApiClient {
	base_url: String,
}

impl ApiClient {
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	pub async fn related_entities(&self, query: &RelatedEntitiesQuery) -> Result<RelatedEntities, LinksError> {
		let url = format!("{}{}", self.base_url, query.path());
		info!("fetching related entities from {url}");

		let opts = RequestInit::new();
		opts.set_method("GET");
		opts.set_mode(RequestMode::Cors);
		let request = Request::new_with_str_and_init(&url, &opts)
			.map_err(|e| LinksError::Request(format!("{e:?}")))?;

		let window = web_sys::window().ok_or(LinksError::NoWindow)?;
		let resp_value = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(|e| LinksError::Network(format!("{e:?}")))?;
		let resp: Response = resp_value
			.dyn_into()
			.map_err(|_| LinksError::Network("response is not a Response".into()))?;
		if !resp.ok() {
			return Err(LinksError::Status {
				status: resp.status(),
				url,
			});
		}

		let text = JsFuture::from(resp.text().map_err(|e| LinksError::Network(format!("{e:?}")))?)
			.await
			.map_err(|e| LinksError::Network(format!("{e:?}")))?;
		decode(&text.as_string().unwrap_or_default())
	}
}

/// Decode a response body; `null` or an empty body is an empty result.
pub fn decode(body: &str) -> Result<RelatedEntities, LinksError> {
	let body = body.trim();
	if body.is_empty() {
		return Ok(RelatedEntities::default());
	}
	let data: Option<RelatedEntities> = serde_json::from_str(body)?;
	Ok(data.unwrap_or_default())
}

/// Deterministic demo graph answering queries the way the server does.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleGraph {
	data: RelatedEntities,
}

impl SampleGraph {
	pub fn new(data: RelatedEntities) -> Self {
		Self { data }
	}

	/// A transaction-review neighbourhood: a handful of small left types, a
	/// large one that gets grouped, and one noisy IP address that trips
	/// the fan-out suppression.
	pub fn generate(users: usize) -> Self {
		let users = users.max(1);
		let right: Vec<Entity> = (0..users)
			.map(|i| Entity::new(format!("user_{i}"), "user", format!("User {i}")))
			.collect();

		let mut left = Vec::new();
		let mut links = Vec::new();
		let fixed = [("card", 3), ("email", 2), ("device", 12)];
		for (ty, n) in fixed {
			for i in 0..n {
				let id = format!("{ty}_{i}");
				left.push(Entity::new(&id, ty, format!("{ty} #{i}")));
				let fan = 1 + (rand_simple(i + ty.len()) * 4.0) as usize;
				for k in 0..fan {
					let target = (rand_simple(i * 31 + k + ty.len()) * users as f64) as usize;
					links.push(LinkEdge::new(&id, format!("user_{}", target.min(users - 1))));
				}
			}
		}

		left.push(Entity::new("ip_shared", "ip address", "10.0.0.1"));
		for i in 0..users {
			links.push(LinkEdge::new("ip_shared", format!("user_{i}")));
		}

		Self::new(RelatedEntities { left, right, links })
	}

	pub fn related_entities(&self, query: &RelatedEntitiesQuery) -> RelatedEntities {
		let Some(ty) = query.left_side_type.as_deref() else {
			return self.data.clone();
		};
		let (skip, limit) = query.page().unwrap_or((0, usize::MAX));
		let left: Vec<Entity> = self
			.data
			.left
			.iter()
			.filter(|e| e.entity_type == ty)
			.skip(skip)
			.take(limit)
			.cloned()
			.collect();
		let links = self
			.data
			.links
			.iter()
			.filter(|l| left.iter().any(|e| e.id == l.from))
			.cloned()
			.collect();
		RelatedEntities {
			left,
			right: self.data.right.clone(),
			links,
		}
	}
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

#[derive(Clone, Debug)]
pub enum QuerySource {
	Sample(SampleGraph),
	Remote(ApiClient),
}

impl QuerySource {
	pub async fn related_entities(&self, query: &RelatedEntitiesQuery) -> Result<RelatedEntities, LinksError> {
		match self {
			Self::Sample(graph) => Ok(graph.related_entities(query)),
			Self::Remote(client) => client.related_entities(query).await,
		}
	}
}

/// Hands out tickets for outgoing queries so that only the response to the
/// latest one is applied.
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
	latest: Arc<AtomicU64>,
}

impl RequestTracker {
	pub fn begin(&self) -> u64 {
		self.latest.fetch_add(1, Ordering::Relaxed) + 1
	}

	pub fn is_current(&self, ticket: u64) -> bool {
		self.latest.load(Ordering::Relaxed) == ticket
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unfiltered_path_has_no_paging() {
		let query = RelatedEntitiesQuery {
			limit: Some(10),
			skip: Some(20),
			..RelatedEntitiesQuery::new("txn 1")
		};
		assert_eq!(query.path(), "/api/entities/txn%201/related");
	}

	#[test]
	fn filtered_path_carries_paging() {
		let query = RelatedEntitiesQuery::new("t1").filtered("ip address", 2, 50);
		assert_eq!(
			query.path(),
			"/api/entities/t1/related?leftSideType=ip%20address&limit=50&skip=100"
		);
	}

	#[test]
	fn path_escapes_reserved_characters() {
		let query = RelatedEntitiesQuery::new("a/b?c").filtered("e-mail&co", 0, 10);
		assert_eq!(
			query.path(),
			"/api/entities/a%2Fb%3Fc/related?leftSideType=e-mail%26co&limit=10&skip=0"
		);
	}

	#[test]
	fn only_latest_request_is_current() {
		let tracker = RequestTracker::default();
		let filtered = tracker.begin();
		let unfiltered = tracker.clone().begin();
		assert!(!tracker.is_current(filtered));
		assert!(tracker.is_current(unfiltered));
	}

	#[test]
	fn decode_defaults_null_and_empty() {
		assert_eq!(decode("").unwrap(), RelatedEntities::default());
		assert_eq!(decode("null").unwrap(), RelatedEntities::default());
		assert!(decode("[1,2").is_err());
	}

	#[test]
	fn sample_graph_filters_and_pages_left_side() {
		let graph = SampleGraph::generate(20);
		let all = graph.related_entities(&RelatedEntitiesQuery::new("focal"));
		assert_eq!(all.left_types(), vec!["card", "email", "device", "ip address"]);

		let page = graph.related_entities(&RelatedEntitiesQuery::new("focal").filtered("device", 1, 5));
		assert_eq!(page.left.len(), 5);
		assert_eq!(page.left[0].id, "device_5");
		assert!(page.links.iter().all(|l| l.from.starts_with("device_")));
	}
}
