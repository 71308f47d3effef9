//! Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info, warn};

// Modules
pub mod components;
mod pages;

use crate::components::entity_links::LinksViewConfig;
// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Attribute on `<body>` that may carry a JSON `LinksViewConfig`.
const CONFIG_ATTRIBUTE: &str = "data-links-config";

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Read the view configuration from the page, falling back to defaults.
pub fn load_config() -> LinksViewConfig {
	let raw = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.body())
		.and_then(|b| b.get_attribute(CONFIG_ATTRIBUTE));
	let Some(raw) = raw else {
		return LinksViewConfig::default();
	};
	match LinksViewConfig::from_json(&raw) {
		Ok(config) => config,
		Err(err) => {
			warn!("ignoring {CONFIG_ATTRIBUTE}: {err}");
			LinksViewConfig::default()
		}
	}
}

/// An app router which renders the links view and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Entity links" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
				<Route path=path!("/entity/:id") view=Home />
			</Routes>
		</Router>
	}
}
