use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found">
			<h1>"Nobody here"</h1>
			<p>"This page is not part of the family tree."</p>
			<a href="/">"Back to the tree"</a>
		</div>
	}
}
