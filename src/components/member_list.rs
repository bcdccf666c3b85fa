use leptos::ev;
use leptos::prelude::*;

use crate::family::{AdjacencyList, FamilyGroup, UserId, rank_by_closeness};

#[derive(Clone, Debug, PartialEq)]
struct MemberRow {
	id: UserId,
	name: String,
	initials: String,
	relation: Option<String>,
	is_focal: bool,
}

fn member_rows(group: &FamilyGroup, focal: &UserId, query: &str) -> Vec<MemberRow> {
	let adjacency = AdjacencyList::from_group(group);
	let query = query.trim().to_lowercase();
	rank_by_closeness(&adjacency, focal, &group.persons)
		.into_iter()
		.filter(|(person, _)| {
			query.is_empty() || person.display_name().to_lowercase().contains(&query)
		})
		.map(|(person, rel)| MemberRow {
			id: person.id.clone(),
			name: person.display_name(),
			initials: person.initials(),
			relation: rel.filter(|r| r.hops > 0).map(|r| r.label),
			is_focal: &person.id == focal,
		})
		.collect()
}

/// Group members ordered by how close they are to the focal user, with a
/// name filter. Picking a member reports it through `on_select`.
#[component]
pub fn MemberList(
	#[prop(into)] group: Signal<FamilyGroup>,
	#[prop(into)] focal: Signal<UserId>,
	on_select: Callback<UserId>,
) -> impl IntoView {
	let query = RwSignal::new(String::new());
	let rows = Memo::new(move |_| group.with(|g| member_rows(g, &focal.get(), &query.get())));

	let handle_input = move |evt: ev::Event| query.set(event_target_value(&evt));

	view! {
		<aside class="member-list">
			<input
				type="search"
				placeholder="Search members"
				prop:value=move || query.get()
				on:input=handle_input
			/>
			<ul>
				<For
					each=move || rows.get()
					key=|row| (row.id.clone(), row.relation.clone(), row.is_focal)
					let:row
				>
					{
						let id = row.id.clone();
						view! {
							<li>
								<button
									class:focal=row.is_focal
									on:click=move |_| on_select.run(id.clone())
								>
									<span class="initials">{row.initials}</span>
									<span class="name">{row.name}</span>
									<span class="relation">
										{row.relation.unwrap_or_default()}
									</span>
								</button>
							</li>
						}
					}
				</For>
			</ul>
		</aside>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::family::{Gender, Person, Relation};

	fn group() -> FamilyGroup {
		let mut g = FamilyGroup::new("g", "Test");
		g.add_member(Person::new("me", "Sam", "Doe", Gender::Other));
		g.add_member(Person::new("gran", "Edith", "Doe", Gender::Female));
		g.add_member(Person::new("mum", "Ann", "Doe", Gender::Female));
		g.add_member(Person::new("x", "Zed", "Stranger", Gender::Male));
		g.record_relationship(&"gran".into(), &"mum".into(), Relation::Parent)
			.unwrap();
		g.record_relationship(&"mum".into(), &"me".into(), Relation::Parent)
			.unwrap();
		g
	}

	#[test]
	fn rows_are_ordered_by_closeness() {
		let rows = member_rows(&group(), &"me".into(), "");
		let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
		assert_eq!(names, ["Sam Doe", "Ann Doe", "Edith Doe", "Zed Stranger"]);
		assert!(rows[0].is_focal);
		assert_eq!(rows[0].relation, None);
		assert_eq!(rows[2].relation.as_deref(), Some("Grandmother"));
		assert_eq!(rows[3].relation, None);
	}

	#[test]
	fn search_ignores_case_and_padding() {
		let rows = member_rows(&group(), &"me".into(), "  EDI ");
		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].id, UserId::from("gran"));
	}
}
