use leptos::prelude::*;
use leptos_router::hooks::{use_navigate, use_query_map};

use crate::components::family_tree::FamilyTreeCanvas;
use crate::components::member_list::MemberList;
use crate::config::DEMO_GROUP_JSON;
use crate::family::{FamilyGroup, UserId};

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let loaded = FamilyGroup::from_json(DEMO_GROUP_JSON);

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
		}>{loaded.map(|group| view! { <FamilyView group /> })}</ErrorBoundary>
	}
}

/// Tree and member list for one group. The focal user lives in the
/// `focus` query parameter so that it survives reloads and can be linked to.
#[component]
fn FamilyView(group: FamilyGroup) -> impl IntoView {
	let fallback = group
		.viewer
		.clone()
		.filter(|id| group.is_member(id))
		.or_else(|| group.members.first().cloned());
	let Some(fallback) = fallback else {
		return view! {
			<div class="empty-group">
				<h1>{group.name}</h1>
				<p>"This group has no members yet."</p>
			</div>
		}
		.into_any();
	};

	let name = group.name.clone();
	let group = RwSignal::new(group);
	let query = use_query_map();
	let focal = Memo::new(move |_| {
		let requested = query.with(|q| q.get("focus")).map(UserId::new);
		group.with(|g| requested.filter(|id| g.is_member(id)))
			.unwrap_or_else(|| fallback.clone())
	});

	let focus_request = RwSignal::new(None::<UserId>);
	let navigate = use_navigate();
	Effect::new(move |_| {
		if let Some(id) = focus_request.get() {
			let encoded = String::from(js_sys::encode_uri_component(id.as_str()));
			navigate(&format!("/?focus={encoded}"), Default::default());
			focus_request.set(None);
		}
	});
	let on_select = Callback::new(move |id: UserId| focus_request.set(Some(id)));

	let focal_name = move || {
		let id = focal.get();
		group.with(|g| g.person(&id).map(|p| p.display_name()))
	};

	view! {
		<div class="fullscreen-graph">
			<FamilyTreeCanvas group=group focal=focal focus_request=focus_request fullscreen=true />
			<div class="graph-overlay">
				<h1>{name}</h1>
				<p class="subtitle">{focal_name}</p>
				<p class="hint">
					"Use the handles to show relatives. Click someone to centre the tree on them."
				</p>
			</div>
			<MemberList group=group focal=focal on_select=on_select />
		</div>
	}
	.into_any()
}
