use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use leptos::html::Div;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, MouseEvent};

use super::config::LinksViewConfig;
use super::layout::{ElementRegistry, LinkLayout, measure};
use super::pipeline::{PipelineOptions, process, selected_links};
use super::query::{QuerySource, RelatedEntitiesQuery, RequestTracker};
use super::render::{Emphasis, entry_arcs, link_segments, links_label};
use super::state::SelectionState;
use super::types::{DisplayEntity, RelatedEntities};

/// Styled width of the lane holding the entry arcs; the arcs themselves use
/// the measured width.
const ENTRY_LANE_WIDTH: f64 = 48.0;

type CardRegistry = StoredValue<ElementRegistry<HtmlElement>, LocalStorage>;

#[component]
pub fn EntityLinksView(
	#[prop(into)] focal: Signal<String>,
	source: QuerySource,
	#[prop(optional)] config: LinksViewConfig,
) -> impl IntoView {
	let page_size = config.page_size;
	let inactive_opacity = config.inactive_opacity;
	let config = StoredValue::new(config);

	let data = RwSignal::new(RelatedEntities::default());
	let left_types = RwSignal::new(Vec::<String>::new());
	let type_filter = RwSignal::new(None::<String>);
	let page = RwSignal::new(0_usize);
	let selection = RwSignal::new(SelectionState::default());
	let explicitly_visible = RwSignal::new(HashSet::<String>::new());
	let layout = RwSignal::new(LinkLayout::default());
	let resize_tick = RwSignal::new(0_u32);

	let left_cards: CardRegistry = StoredValue::new_local(ElementRegistry::default());
	let right_cards: CardRegistry = StoredValue::new_local(ElementRegistry::default());
	let lane_ref = NodeRef::<Div>::new();
	let entry_ref = NodeRef::<Div>::new();

	// A new focal entity starts from a clean view.
	Effect::new(move |_| {
		focal.track();
		selection.set(SelectionState::default());
		explicitly_visible.update(|v| v.clear());
		if type_filter.get_untracked().is_some() {
			type_filter.set(None);
		}
		if page.get_untracked() != 0 {
			page.set(0);
		}
	});

	// Only the response to the newest query is applied.
	let requests = RequestTracker::default();
	Effect::new(move |_| {
		let query = match type_filter.get() {
			Some(ty) => RelatedEntitiesQuery::new(focal.get()).filtered(ty, page.get(), page_size),
			None => RelatedEntitiesQuery::new(focal.get()),
		};
		data.set(RelatedEntities::default());
		let source = source.clone();
		let requests = requests.clone();
		let ticket = requests.begin();
		spawn_local(async move {
			let response = source.related_entities(&query).await;
			if !requests.is_current(ticket) {
				debug!("dropping superseded response for {}", query.path());
				return;
			}
			match response {
				Ok(result) => {
					if query.left_side_type.is_none() {
						left_types.set(result.left_types());
					}
					data.set(result);
				}
				Err(err) => warn!("related entities query for {} failed: {err}", query.entity_id),
			}
		});
	});

	let processed = Memo::new(move |_| {
		let options = PipelineOptions {
			left_type_filter: type_filter.get(),
			explicitly_visible_left: explicitly_visible.get(),
			..Default::default()
		};
		data.with(|d| config.with_value(|c| process(&d.left, &d.right, &d.links, &options, c)))
	});
	let selected = Memo::new(move |_| {
		let s = selection.get();
		processed.with(|p| {
			selected_links(
				&p.links,
				s.left_selection.as_deref(),
				s.right_selection.as_deref(),
			)
		})
	});
	let active = Memo::new(move |_| selection.with(|s| processed.with(|p| s.active_set(&p.links))));

	// Measure after the browser has laid the cards out.
	let remeasure = move || {
		let frame = Closure::once_into_js(move || {
			let width_of = |node: NodeRef<Div>| {
				node.get_untracked()
					.map(|el| el.client_width() as f64)
					.unwrap_or(0.0)
			};
			let (width, entry_width) = (width_of(lane_ref), width_of(entry_ref));
			let measured =
				left_cards.with_value(|l| right_cards.with_value(|r| measure(l, r, width, entry_width)));
			debug!(
				"measured {} left / {} right cards, lane width {}, entry width {}",
				measured.left_heights.len(),
				measured.right_heights.len(),
				measured.width,
				measured.entry_width
			);
			layout.set(measured);
		});
		if let Some(window) = web_sys::window() {
			let _ = window.request_animation_frame(frame.unchecked_ref());
		}
	};

	Effect::new(move |_| {
		selection.track();
		type_filter.track();
		resize_tick.track();
		processed.track();
		remeasure();
	});

	let on_resize: Closure<dyn FnMut()> = Closure::new(move || {
		resize_tick.update(|t| *t = t.wrapping_add(1));
	});
	if let Some(window) = web_sys::window() {
		let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
	}
	let on_resize = StoredValue::new_local(on_resize);
	on_cleanup(move || {
		if let Some(window) = web_sys::window() {
			on_resize.try_with_value(|cb| {
				let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			});
		}
	});

	let set_filter = move |ty: Option<String>| {
		selection.update(SelectionState::reset);
		page.set(0);
		type_filter.set(ty);
	};
	let select_left = Callback::new(move |id: String| selection.update(|s| s.click_left(&id)));
	let select_right = Callback::new(move |id: String| selection.update(|s| s.click_right(&id)));
	let reveal = Callback::new(move |id: String| {
		explicitly_visible.update(|v| {
			v.insert(id);
		});
	});

	let left_column = move || {
		let current = processed.get();
		current
			.left
			.iter()
			.cloned()
			.map(|entity| {
				let hidden = current
					.is_hidden(&entity.id)
					.then(|| entity.link_count.saturating_sub(current.visible_link_count(&entity.id)));
				let (id_active, id_selected) = (entity.id.clone(), entity.id.clone());
				view! {
					<EntityCard
						entity=entity
						registry=left_cards
						active=Signal::derive(move || active.with(|a| a.contains(&id_active)))
						selected=Signal::derive(move || {
							selection.with(|s| s.left_selection.as_deref() == Some(id_selected.as_str()))
						})
						hidden_links=hidden
						inactive_opacity=inactive_opacity
						on_select=select_left
						on_reveal=reveal
					/>
				}
			})
			.collect_view()
	};

	let right_column = move || {
		processed
			.get()
			.right
			.into_iter()
			.map(|entity| {
				let (id_active, id_selected) = (entity.id.clone(), entity.id.clone());
				view! {
					<EntityCard
						entity=entity
						registry=right_cards
						active=Signal::derive(move || active.with(|a| a.contains(&id_active)))
						selected=Signal::derive(move || {
							selection.with(|s| s.right_selection.as_deref() == Some(id_selected.as_str()))
						})
						hidden_links=None
						inactive_opacity=inactive_opacity
						on_select=select_right
					/>
				}
			})
			.collect_view()
	};

	let link_paths = move || {
		let segments = layout.with(|l| {
			processed.with(|p| {
				selected.with(|sel| {
					active.with(|a| config.with_value(|c| link_segments(&p.links, l, a, sel, c)))
				})
			})
		});
		segments
			.into_iter()
			.map(|segment| {
				let (class, opacity) = match segment.emphasis {
					Emphasis::Active => ("link link-active", 1.0),
					Emphasis::Dimmed => ("link link-dimmed", inactive_opacity),
					Emphasis::Faded => ("link link-faded", inactive_opacity / 2.0),
				};
				view! {
					<path
						d=segment.path
						class=class
						fill="none"
						stroke="currentColor"
						stroke-width=segment.stroke_width.to_string()
						opacity=opacity.to_string()
					/>
				}
			})
			.collect_view()
	};

	let arc_paths = move || {
		let arcs = layout.with(|l| {
			processed.with(|p| {
				selection.with(|s| config.with_value(|c| entry_arcs(&p.left, l, s, c)))
			})
		});
		arcs.into_iter()
			.map(|arc| {
				let opacity = if arc.active { 1.0 } else { inactive_opacity };
				view! {
					<path
						d=arc.path
						class="entry-arc"
						fill="none"
						stroke="currentColor"
						stroke-width="2"
						opacity=opacity.to_string()
					/>
				}
			})
			.collect_view()
	};

	let type_buttons = move || {
		left_types
			.get()
			.into_iter()
			.map(|ty| {
				let (ty_active, ty_click) = (ty.clone(), ty.clone());
				view! {
					<button
						class="filter"
						class:filter-active=move || {
							type_filter.with(|f| f.as_deref() == Some(ty_active.as_str()))
						}
						on:click=move |_| set_filter(Some(ty_click.clone()))
					>
						{ty}
					</button>
				}
			})
			.collect_view()
	};

	let paging = move || {
		type_filter.with(Option::is_some).then(|| {
			view! {
				<div class="entity-links__paging">
					<button
						disabled=move || page.get() == 0
						on:click=move |_| page.update(|p| *p = p.saturating_sub(1))
					>
						"Previous"
					</button>
					<span>{move || format!("page {}", page.get() + 1)}</span>
					<button
						disabled=move || data.with(|d| d.left.len() < page_size)
						on:click=move |_| page.update(|p| *p += 1)
					>
						"Next"
					</button>
				</div>
			}
		})
	};

	view! {
		<section class="entity-links">
			<header class="entity-links__header">
				<h2 class="entity-links__focal">{move || focal.get()}</h2>
				<div class="entity-links__filters">
					<button
						class="filter"
						class:filter-active=move || type_filter.with(Option::is_none)
						on:click=move |_| set_filter(None)
					>
						"All"
					</button>
					{type_buttons}
				</div>
				{paging}
			</header>
			<div class="entity-links__body" style="position: relative; display: flex;">
				<div class="entity-links__entry" node_ref=entry_ref style=format!("position: relative; width: {ENTRY_LANE_WIDTH}px;")>
					<svg style="position: absolute; inset: 0; width: 100%; height: 100%; overflow: visible;">
						{arc_paths}
					</svg>
				</div>
				<div class="entity-links__column entity-links__column--left">{left_column}</div>
				<div class="entity-links__lane" node_ref=lane_ref style="position: relative; flex: 1;">
					<svg style="position: absolute; inset: 0; width: 100%; height: 100%; overflow: visible;">
						{link_paths}
					</svg>
				</div>
				<div class="entity-links__column entity-links__column--right">{right_column}</div>
			</div>
		</section>
	}
}

/// One entity card. Registers its element for measurement while mounted.
#[component]
fn EntityCard(
	entity: DisplayEntity,
	registry: CardRegistry,
	#[prop(into)] active: Signal<bool>,
	#[prop(into)] selected: Signal<bool>,
	/// Links held back from view, set only for a hidden-links source.
	hidden_links: Option<usize>,
	inactive_opacity: f64,
	on_select: Callback<String>,
	#[prop(optional)] on_reveal: Option<Callback<String>>,
) -> impl IntoView {
	let card_ref = NodeRef::<Div>::new();
	// Zero means not registered; registry generations start at one.
	let generation = Arc::new(AtomicU64::new(0));

	let (id_register, generation_register) = (entity.id.clone(), generation.clone());
	Effect::new(move |_| {
		if let Some(el) = card_ref.get() {
			let el: HtmlElement = el.into();
			registry.update_value(|r| {
				let g = r.register(id_register.clone(), el);
				generation_register.store(g, Ordering::Relaxed);
			});
		}
	});
	let id_cleanup = entity.id.clone();
	on_cleanup(move || {
		let g = generation.load(Ordering::Relaxed);
		if g != 0 {
			registry.try_update_value(|r| r.unregister(&id_cleanup, g));
		}
	});

	let DisplayEntity {
		id,
		name,
		entity_type,
		group_count,
		link_count,
	} = entity;
	let is_group = group_count.is_some();
	let kind = if is_group { "group".to_string() } else { entity_type };
	let caption = links_label(link_count, hidden_links);

	let id_click = id.clone();
	let reveal_button = on_reveal.filter(|_| hidden_links.is_some()).map(|reveal| {
		view! {
			<button
				class="entity-card__reveal"
				on:click=move |ev: MouseEvent| {
					ev.stop_propagation();
					reveal.run(id.clone());
				}
			>
				"show links"
			</button>
		}
	});

	view! {
		<div
			node_ref=card_ref
			class="entity-card"
			class:entity-card-group=is_group
			class:entity-card-selected=move || selected.get()
			class:entity-card-hidden=hidden_links.is_some()
			style=move || format!("opacity: {};", if active.get() { 1.0 } else { inactive_opacity })
			on:click=move |_| on_select.run(id_click.clone())
		>
			<div class="entity-card__type">{kind}</div>
			<div class="entity-card__name">{name}</div>
			<div class="entity-card__links">{caption}</div>
			{reveal_button}
		</div>
	}
}
