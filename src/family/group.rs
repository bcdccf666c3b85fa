use log::debug;
use serde::{Deserialize, Serialize};

use super::error::GroupError;
use super::types::{Person, Relation, RelationshipEdge, UserId};

/// Snapshot of one group as handed over by the persistence layer: who is in
/// it, their profiles and the recorded relationships between them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyGroup {
	/// Stamped on every recorded row.
	pub id: String,
	/// Display name.
	pub name: String,
	/// The signed-in user, used as the default focal user.
	#[serde(default)]
	pub viewer: Option<UserId>,
	/// Ids of the current members. Rows naming anyone else are stale.
	pub members: Vec<UserId>,
	/// Profiles, which may outlive membership.
	pub persons: Vec<Person>,
	/// Canonical pairwise rows, at most one per pair.
	#[serde(default)]
	pub relationships: Vec<RelationshipEdge>,
}

impl FamilyGroup {
	/// An empty group.
	pub fn new(id: &str, name: &str) -> Self {
		Self {
			id: id.to_owned(),
			name: name.to_owned(),
			..Self::default()
		}
	}

	/// Parses a snapshot. Rows are taken as-is; stale references are dealt
	/// with when the adjacency list is built.
	pub fn from_json(json: &str) -> Result<Self, GroupError> {
		let group: FamilyGroup = serde_json::from_str(json)?;
		debug!(
			"loaded group {} with {} members and {} relationships",
			group.id,
			group.members.len(),
			group.relationships.len()
		);
		Ok(group)
	}

	/// Adds a person and makes them a member.
	pub fn add_member(&mut self, person: Person) {
		if !self.members.contains(&person.id) {
			self.members.push(person.id.clone());
		}
		match self.persons.iter_mut().find(|p| p.id == person.id) {
			Some(existing) => *existing = person,
			None => self.persons.push(person),
		}
	}

	/// Whether `id` is a current member.
	pub fn is_member(&self, id: &UserId) -> bool {
		self.members.contains(id)
	}

	/// Profile for `id`, member or not.
	pub fn person(&self, id: &UserId) -> Option<&Person> {
		self.persons.iter().find(|p| &p.id == id)
	}

	/// Records "`a` is the `relation` of `b`" in canonical form. A pair holds a
	/// single relation, so any existing row for the pair is a conflict.
	pub fn record_relationship(
		&mut self,
		a: &UserId,
		b: &UserId,
		relation: Relation,
	) -> Result<&RelationshipEdge, GroupError> {
		if a == b {
			return Err(GroupError::SelfRelationship(a.clone()));
		}
		for id in [a, b] {
			if !self.is_member(id) {
				return Err(GroupError::UnknownMember(id.clone()));
			}
		}

		let row = RelationshipEdge::canonical(a.clone(), b.clone(), relation, &self.id);
		if let Some(existing) = self.relationships.iter().find(|r| r.same_pair(&row)) {
			return Err(GroupError::DuplicateRelationship {
				user1: row.user1_id,
				user2: row.user2_id,
				existing: existing.relation,
			});
		}

		let idx = self.relationships.len();
		self.relationships.push(row);
		Ok(&self.relationships[idx])
	}

	/// Drops a member together with every row that mentions them.
	pub fn remove_member(&mut self, id: &UserId) {
		self.members.retain(|m| m != id);
		self.relationships.retain(|r| !r.involves(id));
	}
}
