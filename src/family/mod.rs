//! Relationship graph, kinship labels and tree layout. Nothing in here knows
//! about the browser.

mod adjacency;
mod error;
mod group;
mod layout;
mod relationship;
mod types;
mod viewport;

pub use adjacency::{AdjacencyList, Edge};
pub use error::GroupError;
pub use group::FamilyGroup;
pub use layout::{
	Affordances, Direction, LayoutChange, Point, TreeAction, TreeEdge, TreeEdgeKind, TreeLayout,
	TreeNode,
};
pub use relationship::{Relationship, label_for, rank_by_closeness, resolve};
pub use types::{
	DatePrecision, EdgeKind, Gender, PartialDate, Person, Relation, RelationshipEdge, UserId,
};
pub use viewport::{CameraTarget, CenteringRequest, Size, ViewportCentering};
