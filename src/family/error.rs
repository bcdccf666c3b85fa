use thiserror::Error;

use super::types::{Relation, UserId};

/// Errors raised while loading a group snapshot or recording relationships.
#[derive(Error, Debug)]
pub enum GroupError {
	/// The snapshot JSON did not match the expected shape.
	#[error("malformed group data: {0}")]
	Parse(#[from] serde_json::Error),

	/// Both ends of a relationship are the same user.
	#[error("{0} cannot be related to themself")]
	SelfRelationship(UserId),

	/// An endpoint is not in the member list.
	#[error("{0} is not a member of this group")]
	UnknownMember(UserId),

	/// The pair already has a row; one relation per pair.
	#[error("{user1} and {user2} are already related ({existing:?})")]
	DuplicateRelationship {
		/// Canonical first user of the pair.
		user1: UserId,
		/// Canonical second user of the pair.
		user2: UserId,
		/// Relation already stored for the pair.
		existing: Relation,
	},
}
