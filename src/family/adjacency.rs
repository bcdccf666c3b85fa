use std::collections::{BTreeMap, HashSet};

use log::{debug, warn};

use super::group::FamilyGroup;
use super::types::{EdgeKind, Person, Relation, RelationshipEdge, UserId};

/// One typed connection from the owning user to a relative.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
	/// The relative.
	pub to: UserId,
	/// What `to` is to the owning user.
	pub kind: EdgeKind,
}

/// Per-user typed adjacency, derived from the stored rows. Symmetric: every
/// edge has its inverse on the other endpoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdjacencyList {
	edges: BTreeMap<UserId, Vec<Edge>>,
}

impl AdjacencyList {
	/// Builds the adjacency for a group. Rows pointing at users that are not
	/// both members and known persons are skipped, as are self rows and any
	/// later row for a pair that already produced an edge.
	pub fn build(rows: &[RelationshipEdge], members: &[UserId], persons: &[Person]) -> Self {
		let known: HashSet<&UserId> = persons.iter().map(|p| &p.id).collect();
		let mut edges: BTreeMap<UserId, Vec<Edge>> = members
			.iter()
			.filter(|m| known.contains(m))
			.map(|m| (m.clone(), Vec::new()))
			.collect();
		let mut seen_pairs: HashSet<(UserId, UserId)> = HashSet::new();

		for row in rows {
			let (a, b) = (&row.user1_id, &row.user2_id);
			if !edges.contains_key(a) || !edges.contains_key(b) {
				debug!("skipping relationship {a} -> {b}: unknown user");
				continue;
			}
			if a == b {
				debug!("skipping self relationship on {a}");
				continue;
			}
			let pair = if a < b {
				(a.clone(), b.clone())
			} else {
				(b.clone(), a.clone())
			};
			if !seen_pairs.insert(pair) {
				warn!("skipping duplicate relationship {a} -> {b} ({:?})", row.relation);
				continue;
			}

			// "a is the <relation> of b", so b's entry names a with that kind
			let seen_from_b = edge_kind(row.relation);
			push(&mut edges, b, a, seen_from_b);
			push(&mut edges, a, b, seen_from_b.inverse());
		}

		Self { edges }
	}

	/// [`AdjacencyList::build`] over a group snapshot.
	pub fn from_group(group: &FamilyGroup) -> Self {
		Self::build(&group.relationships, &group.members, &group.persons)
	}

	/// Edges of `id` in row order, empty for unknown users.
	pub fn edges(&self, id: &UserId) -> &[Edge] {
		self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Whether `id` survived the member and person filter.
	pub fn contains(&self, id: &UserId) -> bool {
		self.edges.contains_key(id)
	}

	/// Known users in id order.
	pub fn users(&self) -> impl Iterator<Item = &UserId> {
		self.edges.keys()
	}

	/// Number of known users.
	pub fn len(&self) -> usize {
		self.edges.len()
	}

	/// Whether no user is known.
	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}

	/// Relatives of one kind, in row order.
	pub fn related(&self, id: &UserId, kind: EdgeKind) -> impl Iterator<Item = &UserId> {
		self.edges(id)
			.iter()
			.filter(move |e| e.kind == kind)
			.map(|e| &e.to)
	}

	/// Recorded parents.
	pub fn parents(&self, id: &UserId) -> Vec<&UserId> {
		self.related(id, EdgeKind::Parent).collect()
	}

	/// Recorded children.
	pub fn children(&self, id: &UserId) -> Vec<&UserId> {
		self.related(id, EdgeKind::Child).collect()
	}

	/// Partners and spouses.
	pub fn unions(&self, id: &UserId) -> Vec<&UserId> {
		self.edges(id)
			.iter()
			.filter(|e| e.kind.is_union())
			.map(|e| &e.to)
			.collect()
	}

	/// Recorded siblings plus anyone sharing a parent, without repeats.
	pub fn siblings(&self, id: &UserId) -> Vec<&UserId> {
		let mut out: Vec<&UserId> = Vec::new();
		let shared = self
			.parents(id)
			.into_iter()
			.flat_map(|p| self.related(p, EdgeKind::Child));
		for sib in self.related(id, EdgeKind::Sibling).chain(shared) {
			if sib != id && !out.contains(&sib) {
				out.push(sib);
			}
		}
		out
	}

	/// What `to` is to `from`, if they share an edge.
	pub fn kind_between(&self, from: &UserId, to: &UserId) -> Option<EdgeKind> {
		self.edges(from).iter().find(|e| &e.to == to).map(|e| e.kind)
	}
}

fn edge_kind(relation: Relation) -> EdgeKind {
	match relation {
		Relation::Parent => EdgeKind::Parent,
		Relation::Child => EdgeKind::Child,
		Relation::Partner => EdgeKind::Partner,
		Relation::Spouse => EdgeKind::Spouse,
		Relation::Sibling => EdgeKind::Sibling,
		Relation::Relative => EdgeKind::Relative,
	}
}

fn push(edges: &mut BTreeMap<UserId, Vec<Edge>>, owner: &UserId, to: &UserId, kind: EdgeKind) {
	if let Some(list) = edges.get_mut(owner) {
		list.push(Edge {
			to: to.clone(),
			kind,
		});
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::family::types::Gender;

	fn persons(ids: &[&str]) -> (Vec<UserId>, Vec<Person>) {
		let persons: Vec<Person> = ids
			.iter()
			.map(|id| Person::new(*id, id, "", Gender::Unknown))
			.collect();
		(persons.iter().map(|p| p.id.clone()).collect(), persons)
	}

	fn row(a: &str, b: &str, relation: Relation) -> RelationshipEdge {
		RelationshipEdge::canonical(a.into(), b.into(), relation, "g")
	}

	#[test]
	fn parent_rows_are_inverted_per_node() {
		let (members, persons) = persons(&["a", "b"]);
		let adj = AdjacencyList::build(&[row("a", "b", Relation::Parent)], &members, &persons);
		assert_eq!(adj.kind_between(&"a".into(), &"b".into()), Some(EdgeKind::Child));
		assert_eq!(adj.kind_between(&"b".into(), &"a".into()), Some(EdgeKind::Parent));

		// stored the other way round: b is the child of a
		let adj = AdjacencyList::build(&[row("b", "a", Relation::Child)], &members, &persons);
		assert_eq!(adj.kind_between(&"a".into(), &"b".into()), Some(EdgeKind::Child));
	}

	#[test]
	fn stale_rows_are_skipped() {
		let (mut members, persons) = persons(&["a", "b", "c"]);
		// ghost is a member with no profile, c has a profile but left
		members.retain(|m| m.as_str() != "c");
		members.push("ghost".into());
		let rows = [
			row("a", "b", Relation::Spouse),
			row("a", "c", Relation::Parent),
			row("ghost", "b", Relation::Sibling),
			row("a", "b", Relation::Spouse),
		];
		let adj = AdjacencyList::build(&rows, &members, &persons);
		assert_eq!(adj.len(), 2);
		assert_eq!(adj.edges(&"a".into()).len(), 1);
		assert_eq!(adj.edges(&"b".into()).len(), 1);
		assert!(adj.edges(&"c".into()).is_empty());
	}

	#[test]
	fn siblings_include_shared_parents() {
		let (members, persons) = persons(&["p", "a", "b", "c"]);
		let rows = [
			row("p", "a", Relation::Parent),
			row("p", "b", Relation::Parent),
			row("a", "c", Relation::Sibling),
		];
		let adj = AdjacencyList::build(&rows, &members, &persons);
		let sibs: Vec<&str> = adj.siblings(&"a".into()).iter().map(|s| s.as_str()).collect();
		assert_eq!(sibs, ["c", "b"]);
	}

	fn relation() -> impl Strategy<Value = Relation> {
		prop_oneof![
			Just(Relation::Parent),
			Just(Relation::Child),
			Just(Relation::Partner),
			Just(Relation::Spouse),
			Just(Relation::Sibling),
			Just(Relation::Relative),
		]
	}

	proptest! {
		#[test]
		fn adjacency_is_symmetric(rows in prop::collection::vec((0..8u8, 0..8u8, relation()), 0..30)) {
			let ids: Vec<String> = (0..8).map(|i| format!("u{i}")).collect();
			let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
			let (members, persons) = persons(&refs);
			let rows: Vec<RelationshipEdge> = rows
				.into_iter()
				.map(|(a, b, r)| row(&ids[a as usize], &ids[b as usize], r))
				.collect();
			let adj = AdjacencyList::build(&rows, &members, &persons);

			for owner in adj.users() {
				for edge in adj.edges(owner) {
					let back = adj.edges(&edge.to).iter().filter(|e| &e.to == owner).count();
					prop_assert_eq!(back, 1);
					prop_assert_eq!(adj.kind_between(&edge.to, owner), Some(edge.kind.inverse()));
				}
			}
		}
	}
}
