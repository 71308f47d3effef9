use leptos::prelude::*;
use leptos_router::hooks::use_params_map;

use crate::components::entity_links::{ApiClient, EntityLinksView, QuerySource, SampleGraph};
use crate::load_config;

/// Focal entity shown on the bare `/` route.
const DEFAULT_FOCAL: &str = "txn_1042";

/// Right-side population of the built-in sample graph.
const SAMPLE_USERS: usize = 60;

/// Links view for the entity named in the route, backed by the configured
/// API or, without one, by the sample graph.
#[component]
pub fn Home() -> impl IntoView {
	let config = load_config();
	let source = match config.api_base_url.as_deref() {
		Some(base) => QuerySource::Remote(ApiClient::new(base)),
		None => QuerySource::Sample(SampleGraph::generate(SAMPLE_USERS)),
	};

	let params = use_params_map();
	let focal = Signal::derive(move || {
		params
			.read()
			.get("id")
			.unwrap_or_else(|| DEFAULT_FOCAL.to_string())
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="links-page">
				<EntityLinksView focal=focal source=source config=config />
			</div>
		</ErrorBoundary>
	}
}
