//! Shortest relationship paths and kinship labels.
//!
//! A path is the sequence of [`EdgeKind`]s walked from the focal user to the
//! target, each step naming what the next person is to the previous one. The
//! label names the target as seen from the focal user.

use std::collections::{HashMap, VecDeque};

use super::adjacency::AdjacencyList;
use super::types::{EdgeKind, Gender, Person, UserId};

/// How a target relates to the focal user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
	/// Kinship word, e.g. "Aunt" or "2nd cousin once removed".
	pub label: String,
	/// Edges on the shortest path.
	pub hops: usize,
	/// Steps from the focal user to the target.
	pub path: Vec<EdgeKind>,
	/// People on the path, excluding both endpoints.
	pub via: Vec<UserId>,
}

/// Finds the shortest relationship path from `focal` to `target`, or `None`
/// when they are not connected. Among equally short paths the first one
/// reached in adjacency order wins.
pub fn resolve(
	adjacency: &AdjacencyList,
	focal: &UserId,
	target: &UserId,
	target_gender: Gender,
) -> Option<Relationship> {
	let (path, via) = shortest_path(adjacency, focal, target)?;
	Some(Relationship {
		label: label_for(&path, target_gender),
		hops: path.len(),
		path,
		via,
	})
}

fn shortest_path(
	adjacency: &AdjacencyList,
	focal: &UserId,
	target: &UserId,
) -> Option<(Vec<EdgeKind>, Vec<UserId>)> {
	if !adjacency.contains(focal) || !adjacency.contains(target) {
		return None;
	}
	if focal == target {
		return Some((Vec::new(), Vec::new()));
	}

	// child -> (parent in the BFS tree, kind of the step into child)
	let mut came_from: HashMap<&UserId, (&UserId, EdgeKind)> = HashMap::new();
	let mut queue = VecDeque::from([focal]);

	while let Some(current) = queue.pop_front() {
		for edge in adjacency.edges(current) {
			if &edge.to == focal || came_from.contains_key(&edge.to) {
				continue;
			}
			came_from.insert(&edge.to, (current, edge.kind));
			if &edge.to == target {
				return Some(unwind(&came_from, focal, target));
			}
			queue.push_back(&edge.to);
		}
	}
	None
}

fn unwind(
	came_from: &HashMap<&UserId, (&UserId, EdgeKind)>,
	focal: &UserId,
	target: &UserId,
) -> (Vec<EdgeKind>, Vec<UserId>) {
	let mut path = Vec::new();
	let mut via = Vec::new();
	let mut node = target;
	while node != focal {
		let (prev, kind) = came_from[node];
		path.push(kind);
		if prev != focal {
			via.push(prev.clone());
		}
		node = prev;
	}
	path.reverse();
	via.reverse();
	(path, via)
}

/// Blood-line shape: generations walked up, then down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Lineage {
	up: usize,
	down: usize,
}

/// Reads a path made only of parent, sibling and child steps as "up then
/// down". A sibling step before the first step down is one generation up and
/// one down. After that it stays on the same generation.
fn lineage(path: &[EdgeKind]) -> Option<Lineage> {
	let mut up = 0;
	let mut down = 0;
	for kind in path {
		match kind {
			EdgeKind::Parent if down == 0 => up += 1,
			EdgeKind::Sibling if down == 0 => {
				up += 1;
				down += 1;
			}
			EdgeKind::Sibling => {}
			EdgeKind::Child => down += 1,
			_ => return None,
		}
	}
	Some(Lineage { up, down })
}

/// Renders a path into a label for a target of the given gender.
pub fn label_for(path: &[EdgeKind], gender: Gender) -> String {
	if path.is_empty() {
		return "Self".into();
	}
	if let Some(lineage) = lineage(path) {
		return blood_label(lineage, gender);
	}

	let last = path.len() - 1;
	match path {
		[EdgeKind::Spouse] => gender.pick("Husband", "Wife", "Spouse").into(),
		[EdgeKind::Partner] => "Partner".into(),
		[first, rest @ ..] if first.is_union() => match lineage(rest) {
			Some(Lineage { up: 1, down: 0 }) => in_law(gender.pick("Father", "Mother", "Parent")),
			Some(Lineage { up: 1, down: 1 }) => in_law(gender.pick("Brother", "Sister", "Sibling")),
			Some(Lineage { up: 0, down: d }) => {
				format!("Step{}", grand(d, gender.pick("son", "daughter", "child")))
			}
			_ => "Relative".into(),
		},
		[.., tail] if tail.is_union() => match lineage(&path[..last]) {
			Some(Lineage { up: 0, down: 1 }) => in_law(gender.pick("Son", "Daughter", "Child")),
			Some(Lineage { up: 1, down: 1 }) => in_law(gender.pick("Brother", "Sister", "Sibling")),
			Some(Lineage { up: 1, down: 0 }) => {
				format!("Step{}", gender.pick("father", "mother", "parent"))
			}
			Some(l @ Lineage { up, down: 1 }) if up >= 2 => blood_label(l, gender),
			Some(Lineage { up, down }) if up >= 2 && down >= 2 => "Cousin-in-law".into(),
			_ => "Relative".into(),
		},
		_ => "Relative".into(),
	}
}

fn in_law(base: &str) -> String {
	format!("{base}-in-law")
}

fn blood_label(Lineage { up, down }: Lineage, gender: Gender) -> String {
	match (up, down) {
		(0, 0) => "Self".into(),
		(u, 0) => capitalize(&grand(u, gender.pick("father", "mother", "parent"))),
		(0, d) => capitalize(&grand(d, gender.pick("son", "daughter", "child"))),
		(1, 1) => gender.pick("Brother", "Sister", "Sibling").into(),
		(1, d) => capitalize(&format!(
			"{}{}",
			greats(d.saturating_sub(3)),
			grand_prefix(d - 1, gender.pick("nephew", "niece", "nibling"))
		)),
		(u, 1) => capitalize(&format!(
			"{}{}",
			greats(u - 2),
			gender.pick("uncle", "aunt", "pibling")
		)),
		(u, d) => cousin(u.min(d) - 1, u.abs_diff(d)),
	}
}

/// "father", "grandfather", "great-grandfather", ...
fn grand(generations: usize, base: &str) -> String {
	match generations {
		1 => base.to_owned(),
		n => format!("{}grand{}", greats(n - 2), base),
	}
}

/// Nieces and nephews gain "grand" one generation later than children do.
fn grand_prefix(generations: usize, base: &str) -> String {
	if generations >= 2 {
		format!("grand{base}")
	} else {
		base.to_owned()
	}
}

fn greats(n: usize) -> String {
	"great-".repeat(n)
}

fn cousin(degree: usize, removed: usize) -> String {
	let base = format!("{} cousin", ordinal(degree));
	match removed {
		0 => base,
		1 => format!("{base} once removed"),
		2 => format!("{base} twice removed"),
		n => format!("{base} {n} times removed"),
	}
}

fn ordinal(n: usize) -> String {
	let suffix = match (n % 10, n % 100) {
		(_, 11..=13) => "th",
		(1, _) => "st",
		(2, _) => "nd",
		(3, _) => "rd",
		_ => "th",
	};
	format!("{n}{suffix}")
}

fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Every person paired with their relationship to `focal`, closest first.
/// Unrelated people go last; ties are broken by display name.
pub fn rank_by_closeness<'a>(
	adjacency: &AdjacencyList,
	focal: &UserId,
	persons: &'a [Person],
) -> Vec<(&'a Person, Option<Relationship>)> {
	let mut ranked: Vec<_> = persons
		.iter()
		.filter(|p| adjacency.contains(&p.id))
		.map(|p| (p, resolve(adjacency, focal, &p.id, p.gender)))
		.collect();
	ranked.sort_by_cached_key(|(p, rel)| {
		(
			rel.as_ref().map_or(usize::MAX, |r| r.hops),
			p.display_name(),
		)
	});
	ranked
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::family::types::{Relation, RelationshipEdge};

	use crate::family::types::EdgeKind::{Child as C, Parent as P, Partner, Sibling as S, Spouse};

	fn adjacency(ids: &[&str], rows: &[(&str, &str, Relation)]) -> AdjacencyList {
		let persons: Vec<Person> = ids
			.iter()
			.map(|id| Person::new(*id, id, "", Gender::Unknown))
			.collect();
		let members: Vec<UserId> = persons.iter().map(|p| p.id.clone()).collect();
		let rows: Vec<RelationshipEdge> = rows
			.iter()
			.map(|(a, b, r)| RelationshipEdge::canonical((*a).into(), (*b).into(), *r, "g"))
			.collect();
		AdjacencyList::build(&rows, &members, &persons)
	}

	#[test]
	fn grandparent_chain() {
		let adj = adjacency(
			&["a", "b", "c"],
			&[("a", "b", Relation::Parent), ("b", "c", Relation::Parent)],
		);
		let down = resolve(&adj, &"a".into(), &"c".into(), Gender::Unknown).unwrap();
		assert_eq!(down.hops, 2);
		assert_eq!(down.path, [C, C]);
		assert_eq!(down.label, "Grandchild");
		assert_eq!(down.via, [UserId::from("b")]);

		let up = resolve(&adj, &"c".into(), &"a".into(), Gender::Male).unwrap();
		assert_eq!(up.path, [P, P]);
		assert_eq!(up.label, "Grandfather");
	}

	#[test]
	fn chained_sibling_rows() {
		// only sibling rows between the kids, no shared parent recorded
		let adj = adjacency(
			&["a", "b", "c", "k", "j"],
			&[
				("a", "b", Relation::Sibling),
				("b", "c", Relation::Sibling),
				("a", "k", Relation::Parent),
				("k", "j", Relation::Sibling),
			],
		);
		let sib = resolve(&adj, &"a".into(), &"c".into(), Gender::Female).unwrap();
		assert_eq!(sib.path, [S, S]);
		assert_eq!(sib.label, "Sister");

		let kid = resolve(&adj, &"a".into(), &"j".into(), Gender::Male).unwrap();
		assert_eq!(kid.path, [C, S]);
		assert_eq!(kid.label, "Son");
	}

	#[test]
	fn partners_are_one_hop() {
		let adj = adjacency(&["a", "b"], &[("a", "b", Relation::Partner)]);
		let rel = resolve(&adj, &"a".into(), &"b".into(), Gender::Female).unwrap();
		assert_eq!(rel.hops, 1);
		assert_eq!(rel.label, "Partner");
	}

	#[test]
	fn disconnected_and_self() {
		let adj = adjacency(&["a", "b", "c"], &[("a", "b", Relation::Spouse)]);
		assert_eq!(resolve(&adj, &"a".into(), &"c".into(), Gender::Unknown), None);
		assert_eq!(resolve(&adj, &"a".into(), &"nobody".into(), Gender::Unknown), None);
		let me = resolve(&adj, &"a".into(), &"a".into(), Gender::Unknown).unwrap();
		assert_eq!((me.hops, me.label.as_str()), (0, "Self"));
	}

	#[test]
	fn blood_labels() {
		let cases: &[(&[EdgeKind], Gender, &str)] = &[
			(&[P], Gender::Female, "Mother"),
			(&[P, P, P], Gender::Unknown, "Great-grandparent"),
			(&[P, P, P, P], Gender::Male, "Great-great-grandfather"),
			(&[C], Gender::Male, "Son"),
			(&[S], Gender::Female, "Sister"),
			(&[P, C], Gender::Male, "Brother"),
			(&[S, C], Gender::Female, "Niece"),
			(&[P, C, C, C], Gender::Male, "Grandnephew"),
			(&[P, C, C, C, C], Gender::Female, "Great-grandniece"),
			(&[S, S], Gender::Female, "Sister"),
			(&[C, S], Gender::Male, "Son"),
			(&[C, S, C], Gender::Unknown, "Grandchild"),
			(&[P, C, S], Gender::Male, "Brother"),
			(&[S, C, S], Gender::Female, "Niece"),
			(&[P, S], Gender::Female, "Aunt"),
			(&[P, P, C], Gender::Male, "Uncle"),
			(&[P, P, P, C], Gender::Female, "Great-aunt"),
			(&[P, P, C, C], Gender::Unknown, "1st cousin"),
			(&[P, S, C], Gender::Unknown, "1st cousin"),
			(&[P, P, P, C, C, C], Gender::Unknown, "2nd cousin"),
			(&[P, P, P, C, C], Gender::Unknown, "1st cousin once removed"),
			(&[P, P, P, P, P, C, C], Gender::Unknown, "1st cousin 3 times removed"),
			(&[P, P, P, P, C, C, C, C, C, C], Gender::Unknown, "3rd cousin twice removed"),
		];
		for (path, gender, expected) in cases {
			assert_eq!(label_for(path, *gender), *expected, "path {path:?}");
		}
	}

	#[test]
	fn marriage_labels() {
		let cases: &[(&[EdgeKind], Gender, &str)] = &[
			(&[Spouse], Gender::Female, "Wife"),
			(&[Spouse], Gender::Other, "Spouse"),
			(&[Spouse, P], Gender::Male, "Father-in-law"),
			(&[Partner, S], Gender::Female, "Sister-in-law"),
			(&[Spouse, C], Gender::Male, "Stepson"),
			(&[Spouse, C, C], Gender::Unknown, "Stepgrandchild"),
			(&[C, Spouse], Gender::Female, "Daughter-in-law"),
			(&[S, Spouse], Gender::Male, "Brother-in-law"),
			(&[P, Spouse], Gender::Female, "Stepmother"),
			(&[P, S, Spouse], Gender::Female, "Aunt"),
			(&[P, P, C, C, Spouse], Gender::Male, "Cousin-in-law"),
			(&[Spouse, P, Spouse], Gender::Male, "Relative"),
			(&[EdgeKind::Relative], Gender::Male, "Relative"),
		];
		for (path, gender, expected) in cases {
			assert_eq!(label_for(path, *gender), *expected, "path {path:?}");
		}
	}

	#[test]
	fn ranks_closest_first() {
		let adj = adjacency(
			&["me", "mum", "gran", "stranger"],
			&[("mum", "me", Relation::Parent), ("gran", "mum", Relation::Parent)],
		);
		let persons: Vec<Person> = ["stranger", "gran", "me", "mum"]
			.iter()
			.map(|id| Person::new(*id, id, "", Gender::Female))
			.collect();
		let ranked = rank_by_closeness(&adj, &"me".into(), &persons);
		let order: Vec<&str> = ranked.iter().map(|(p, _)| p.id.as_str()).collect();
		assert_eq!(order, ["me", "mum", "gran", "stranger"]);
		assert_eq!(ranked[2].1.as_ref().unwrap().label, "Grandmother");
		assert!(ranked[3].1.is_none());
	}

	/// Hop distances by repeated relaxation, independent of the BFS.
	fn distances(adj: &AdjacencyList, from: &UserId) -> HashMap<UserId, usize> {
		let mut dist = HashMap::from([(from.clone(), 0usize)]);
		loop {
			let mut changed = false;
			for user in adj.users() {
				let Some(&d) = dist.get(user) else { continue };
				for edge in adj.edges(user) {
					if dist.get(&edge.to).is_none_or(|&cur| cur > d + 1) {
						dist.insert(edge.to.clone(), d + 1);
						changed = true;
					}
				}
			}
			if !changed {
				return dist;
			}
		}
	}

	fn relation() -> impl Strategy<Value = Relation> {
		prop_oneof![
			Just(Relation::Parent),
			Just(Relation::Child),
			Just(Relation::Spouse),
			Just(Relation::Sibling),
		]
	}

	proptest! {
		#[test]
		fn resolver_finds_shortest_paths(
			rows in prop::collection::vec((0..10u8, 0..10u8, relation()), 0..25),
			focal in 0..10u8,
		) {
			let ids: Vec<String> = (0..10).map(|i| format!("u{i}")).collect();
			let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
			let rows: Vec<(&str, &str, Relation)> = rows
				.iter()
				.map(|(a, b, r)| (refs[*a as usize], refs[*b as usize], *r))
				.collect();
			let adj = adjacency(&refs, &rows);
			let focal = UserId::from(refs[focal as usize]);
			let expected = distances(&adj, &focal);

			for target in adj.users() {
				let found = resolve(&adj, &focal, target, Gender::Unknown);
				match expected.get(target) {
					Some(&hops) => {
						let rel = found.expect("connected users resolve");
						prop_assert_eq!(rel.hops, hops);
						prop_assert_eq!(rel.path.len(), hops);
						prop_assert_eq!(rel.via.len(), hops.saturating_sub(1));
					}
					None => prop_assert!(found.is_none()),
				}
			}
		}
	}
}
