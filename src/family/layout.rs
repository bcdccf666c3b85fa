//! Incremental tree layout around a focal user.
//!
//! [`TreeLayout`] is the visible node and edge set. Expanding a node reveals
//! its off-canvas relatives in one direction, collapsing takes back what
//! those expansions revealed. Affordance flags on every node are recomputed
//! after each structural change.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use log::debug;

use super::adjacency::AdjacencyList;
use super::types::{EdgeKind, UserId};
use crate::config::TreeConfig;

const EPSILON: f64 = 1e-6;

/// Handle position around a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
	/// Parents.
	Up,
	/// Children.
	Down,
	/// Siblings, placed to the left.
	Left,
	/// Siblings, placed to the right.
	Right,
}

impl Direction {
	/// Left or Right.
	pub fn is_horizontal(self) -> bool {
		matches!(self, Direction::Left | Direction::Right)
	}

	fn generation_step(self) -> i32 {
		match self {
			Direction::Up => -1,
			Direction::Down => 1,
			Direction::Left | Direction::Right => 0,
		}
	}
}

/// World-space position. y grows downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

/// Which expand/collapse handles a node offers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Affordances {
	/// Some parent is off-canvas.
	pub can_expand_up: bool,
	/// Some child is off-canvas.
	pub can_expand_down: bool,
	/// Some sibling is off-canvas.
	pub can_expand_horizontal: bool,
	/// Something revealed from the Up handle is still shown.
	pub can_collapse_up: bool,
	/// Something revealed from the Down handle is still shown.
	pub can_collapse_down: bool,
	/// Something revealed from a side handle is still shown.
	pub can_collapse_horizontal: bool,
}

impl Affordances {
	/// Expand flag for the handle in `direction`.
	pub fn can_expand(&self, direction: Direction) -> bool {
		match direction {
			Direction::Up => self.can_expand_up,
			Direction::Down => self.can_expand_down,
			Direction::Left | Direction::Right => self.can_expand_horizontal,
		}
	}

	/// Collapse flag for the handle in `direction`.
	pub fn can_collapse(&self, direction: Direction) -> bool {
		match direction {
			Direction::Up => self.can_collapse_up,
			Direction::Down => self.can_collapse_down,
			Direction::Left | Direction::Right => self.can_collapse_horizontal,
		}
	}

	/// Whether a handle should be drawn for the direction at all.
	pub fn has_handle(&self, direction: Direction) -> bool {
		self.can_expand(direction) || self.can_collapse(direction)
	}
}

/// A visible person.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
	/// The person shown.
	pub id: UserId,
	/// Centre of the avatar.
	pub position: Point,
	/// 0 for the focal user, negative above, positive below.
	pub generation: i32,
	/// Handles to offer, refreshed after every change.
	pub affordances: Affordances,
}

/// How a visible edge is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEdgeKind {
	/// `source` is a parent of `target`.
	Parent,
	/// Partners or spouses.
	Union,
	/// Recorded or shared-parent siblings.
	Sibling,
}

/// A visible connection between two nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEdge {
	/// The parent for [`TreeEdgeKind::Parent`] edges.
	pub source: UserId,
	/// The child for [`TreeEdgeKind::Parent`] edges.
	pub target: UserId,
	/// Drawing style.
	pub kind: TreeEdgeKind,
}

/// Nodes added and removed by one operation.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutChange {
	/// The node whose handle was used, or the new focal user.
	pub source: UserId,
	/// `None` when the whole layout was rebuilt.
	pub direction: Option<Direction>,
	/// Newly visible nodes, in placement order.
	pub added: Vec<UserId>,
	/// Nodes taken off the canvas.
	pub removed: Vec<UserId>,
}

impl LayoutChange {
	fn new(source: &UserId, direction: Option<Direction>) -> Self {
		Self {
			source: source.clone(),
			direction,
			added: Vec::new(),
			removed: Vec::new(),
		}
	}

	/// Nothing was added or removed.
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty()
	}
}

/// Outcome of a handle press.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeAction {
	/// Relatives were revealed.
	Expanded(LayoutChange),
	/// Nodes were taken back.
	Collapsed(LayoutChange),
	/// The caller should rebuild the tree around this user.
	Refocus(UserId),
	/// The handle had nothing to do.
	Unchanged,
}

/// Where a batch of new nodes wants to go before collision avoidance.
#[derive(Clone, Copy, Debug)]
enum Slot {
	Centered(f64),
	LeftOf(f64),
	RightOf(f64),
}

/// The handle an expansion came from. Left and Right share one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Fold {
	Up,
	Down,
	Side,
}

impl From<Direction> for Fold {
	fn from(direction: Direction) -> Self {
		match direction {
			Direction::Up => Fold::Up,
			Direction::Down => Fold::Down,
			Direction::Left | Direction::Right => Fold::Side,
		}
	}
}

/// Source node and handle of the expansion that put something on the canvas.
type Origin = (UserId, Fold);

/// Visible node and edge set around one focal user.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeLayout {
	focal: UserId,
	nodes: BTreeMap<UserId, TreeNode>,
	edges: BTreeMap<(UserId, UserId), TreeEdge>,
	/// Expansion that revealed each node. The focal user and their partners
	/// have none.
	revealed_by: BTreeMap<UserId, Origin>,
	/// Expansion that drew each edge, when there was one.
	drawn_by: BTreeMap<(UserId, UserId), Origin>,
	spacing: f64,
	level_height: f64,
}

impl TreeLayout {
	/// The focal user at the origin with their partners to the right.
	pub fn new(focal: UserId, adjacency: &AdjacencyList, config: &TreeConfig) -> Self {
		Self::build(focal, adjacency, config.node_spacing, config.level_height)
	}

	fn build(focal: UserId, adjacency: &AdjacencyList, spacing: f64, level_height: f64) -> Self {
		let mut layout = Self {
			focal: focal.clone(),
			nodes: BTreeMap::new(),
			edges: BTreeMap::new(),
			revealed_by: BTreeMap::new(),
			drawn_by: BTreeMap::new(),
			spacing,
			level_height,
		};
		layout.insert_node(&focal, 0.0, 0, None);

		let partners: Vec<UserId> = adjacency.unions(&focal).into_iter().cloned().collect();
		let xs = layout.place(0, Slot::RightOf(0.0), partners.len());
		for (partner, x) in partners.iter().zip(xs) {
			layout.insert_node(partner, x, 0, None);
			layout.connect(&focal, partner, TreeEdgeKind::Union, None);
		}
		layout.refresh_affordances(adjacency);
		layout
	}

	/// Rebuilds the layout around another user.
	pub fn refocus(&mut self, adjacency: &AdjacencyList, focal: UserId) -> LayoutChange {
		debug!("refocusing tree on {focal}");
		let previous: Vec<UserId> = self.nodes.keys().cloned().collect();
		*self = Self::build(focal, adjacency, self.spacing, self.level_height);

		let mut change = LayoutChange::new(&self.focal, None);
		change.added = self.nodes.keys().cloned().collect();
		change.removed = previous;
		change
	}

	/// The user the tree is built around.
	pub fn focal(&self) -> &UserId {
		&self.focal
	}

	/// Visible node for `id`.
	pub fn node(&self, id: &UserId) -> Option<&TreeNode> {
		self.nodes.get(id)
	}

	/// Whether `id` is on the canvas.
	pub fn contains(&self, id: &UserId) -> bool {
		self.nodes.contains_key(id)
	}

	/// Visible nodes in id order.
	pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
		self.nodes.values()
	}

	/// Visible edges.
	pub fn edges(&self) -> impl Iterator<Item = &TreeEdge> {
		self.edges.values()
	}

	/// Number of visible nodes.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Never true for a built layout, the focal user is always shown.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Whether `a` and `b` are joined, in either order.
	pub fn has_edge(&self, a: &UserId, b: &UserId) -> bool {
		self.edges.contains_key(&edge_key(a, b))
	}

	/// Reveals the off-canvas relatives of `id` in `direction`. Relatives that
	/// are already visible only get their connecting edge.
	pub fn expand(&mut self, adjacency: &AdjacencyList, id: &UserId, direction: Direction) -> LayoutChange {
		let mut change = LayoutChange::new(id, Some(direction));
		let Some(source) = self.nodes.get(id) else {
			return change;
		};
		let (source_x, generation) = (source.position.x, source.generation + direction.generation_step());

		let relatives: Vec<UserId> = relatives(adjacency, id, direction)
			.into_iter()
			.cloned()
			.collect();
		let hidden: Vec<UserId> = relatives
			.iter()
			.filter(|r| !self.nodes.contains_key(*r))
			.cloned()
			.collect();

		let slot = match direction {
			Direction::Up | Direction::Down => Slot::Centered(source_x),
			Direction::Left => Slot::LeftOf(source_x),
			Direction::Right => Slot::RightOf(source_x),
		};
		let origin: Origin = (id.clone(), direction.into());
		let xs = self.place(generation, slot, hidden.len());
		for (relative, x) in hidden.iter().zip(xs) {
			self.insert_node(relative, x, generation, Some(&origin));
		}
		for relative in &relatives {
			self.link(id, relative, direction, &origin);
		}
		for relative in &hidden {
			self.link_to_visible(adjacency, relative, &origin);
		}

		if !hidden.is_empty() {
			debug!("expanded {id} {direction:?}: {} new nodes", hidden.len());
		}
		change.added = hidden;
		self.refresh_affordances(adjacency);
		change
	}

	/// Undoes the expansions of `id` in `direction`: the nodes and edges they
	/// put on the canvas go, then anything left disconnected from the focal
	/// user. Nodes that were visible before the expansion stay, so an expand
	/// followed by a collapse restores the earlier layout. Neither `id` nor the
	/// focal user is removed.
	pub fn collapse(&mut self, adjacency: &AdjacencyList, id: &UserId, direction: Direction) -> LayoutChange {
		let mut change = LayoutChange::new(id, Some(direction));
		if !self.nodes.contains_key(id) {
			return change;
		}
		let origin: Origin = (id.clone(), direction.into());
		let drawn: Vec<(UserId, UserId)> = self
			.drawn_by
			.iter()
			.filter(|(_, by)| **by == origin)
			.map(|(key, _)| key.clone())
			.collect();
		for key in drawn {
			self.edges.remove(&key);
		}
		let doomed: Vec<UserId> = self
			.revealed_by
			.iter()
			.filter(|(node, by)| **by == origin && *node != id)
			.map(|(node, _)| node.clone())
			.collect();
		change.removed = self.remove_nodes(doomed);
		if !change.removed.is_empty() {
			debug!("collapsed {id} {direction:?}: {} nodes removed", change.removed.len());
		}
		self.refresh_affordances(adjacency);
		change
	}

	/// Removes `id` itself together with everything reachable from it along
	/// `follow`.
	fn collapse_branch(&mut self, adjacency: &AdjacencyList, id: &UserId, follow: Direction) -> LayoutChange {
		let mut doomed = vec![id.clone()];
		doomed.extend(self.reach(adjacency, id, follow));

		let mut change = LayoutChange::new(id, Some(follow));
		change.removed = self.remove_nodes(doomed);
		debug!("collapsed branch at {id}: {} nodes removed", change.removed.len());
		self.refresh_affordances(adjacency);
		change
	}

	/// Handle press on `id`. The handle pointing back towards the focal user
	/// (up on a descendant, down on an ancestor) folds that branch away. Down
	/// on anyone else moves the focus to them. Otherwise the handle expands
	/// while relatives remain off-canvas, then collapses what it revealed.
	pub fn toggle(&mut self, adjacency: &AdjacencyList, id: &UserId, direction: Direction) -> TreeAction {
		let Some(affordances) = self.nodes.get(id).map(|n| n.affordances) else {
			return TreeAction::Unchanged;
		};
		match direction {
			Direction::Up if self.is_descendant(adjacency, id) => {
				return TreeAction::Collapsed(self.collapse_branch(adjacency, id, Direction::Down));
			}
			Direction::Down if self.is_ancestor(adjacency, id) => {
				return TreeAction::Collapsed(self.collapse_branch(adjacency, id, Direction::Up));
			}
			Direction::Down if id != &self.focal => return TreeAction::Refocus(id.clone()),
			_ => {}
		}

		if affordances.can_expand(direction) {
			TreeAction::Expanded(self.expand(adjacency, id, direction))
		} else if affordances.can_collapse(direction) {
			TreeAction::Collapsed(self.collapse(adjacency, id, direction))
		} else {
			TreeAction::Unchanged
		}
	}

	/// Whether `id` is below the focal user by parent links.
	pub fn is_descendant(&self, adjacency: &AdjacencyList, id: &UserId) -> bool {
		id != &self.focal && self.reach(adjacency, &self.focal, Direction::Down).contains(id)
	}

	/// Whether `id` is above the focal user by parent links.
	pub fn is_ancestor(&self, adjacency: &AdjacencyList, id: &UserId) -> bool {
		id != &self.focal && self.reach(adjacency, &self.focal, Direction::Up).contains(id)
	}

	/// Bounding box of all node centres as (min, max).
	pub fn bounds(&self) -> Option<(Point, Point)> {
		let mut positions = self.nodes.values().map(|n| n.position);
		let first = positions.next()?;
		Some(positions.fold((first, first), |(min, max), p| {
			(
				Point {
					x: min.x.min(p.x),
					y: min.y.min(p.y),
				},
				Point {
					x: max.x.max(p.x),
					y: max.y.max(p.y),
				},
			)
		}))
	}

	/// Visible nodes reachable from `start` following relatives in
	/// `direction` only, excluding `start` and the focal user.
	fn reach(&self, adjacency: &AdjacencyList, start: &UserId, direction: Direction) -> Vec<UserId> {
		let mut seen: BTreeSet<&UserId> = BTreeSet::from([start]);
		let mut queue = VecDeque::from([start]);
		let mut found = Vec::new();

		while let Some(current) = queue.pop_front() {
			for next in relatives(adjacency, current, direction) {
				if next == &self.focal || !self.nodes.contains_key(next) || !seen.insert(next) {
					continue;
				}
				found.push(next.clone());
				queue.push_back(next);
			}
		}
		found
	}

	/// Candidate x positions for `count` new nodes on `generation`. The batch
	/// keeps its shape and is shifted in whole spacing steps until none of
	/// its nodes overlaps a node already on that level.
	fn place(&self, generation: i32, slot: Slot, count: usize) -> Vec<f64> {
		if count == 0 {
			return Vec::new();
		}
		let spacing = self.spacing;
		let base: Vec<f64> = match slot {
			Slot::Centered(center) => {
				let middle = (count - 1) as f64 / 2.0;
				(0..count)
					.map(|i| center + (i as f64 - middle) * spacing)
					.collect()
			}
			Slot::LeftOf(x) => (1..=count).map(|i| x - i as f64 * spacing).collect(),
			Slot::RightOf(x) => (1..=count).map(|i| x + i as f64 * spacing).collect(),
		};
		let occupied: Vec<f64> = self
			.nodes
			.values()
			.filter(|n| n.generation == generation)
			.map(|n| n.position.x)
			.collect();
		let fits = |offset: f64| {
			base.iter()
				.all(|x| occupied.iter().all(|o| (x + offset - o).abs() >= spacing - EPSILON))
		};

		let mut step = 0usize;
		loop {
			let offset = match slot {
				Slot::Centered(_) => {
					let k = step.div_ceil(2) as f64 * spacing;
					if step % 2 == 1 { k } else { -k }
				}
				Slot::LeftOf(_) => -(step as f64) * spacing,
				Slot::RightOf(_) => step as f64 * spacing,
			};
			if fits(offset) {
				return base.iter().map(|x| x + offset).collect();
			}
			step += 1;
		}
	}

	fn insert_node(&mut self, id: &UserId, x: f64, generation: i32, origin: Option<&Origin>) {
		self.nodes.insert(
			id.clone(),
			TreeNode {
				id: id.clone(),
				position: Point {
					x,
					y: generation as f64 * self.level_height,
				},
				generation,
				affordances: Affordances::default(),
			},
		);
		if let Some(origin) = origin {
			self.revealed_by.insert(id.clone(), origin.clone());
		}
	}

	/// Adds an edge unless the pair is already connected. An existing edge
	/// keeps its kind and origin.
	fn connect(&mut self, source: &UserId, target: &UserId, kind: TreeEdgeKind, origin: Option<&Origin>) {
		let key = edge_key(source, target);
		if self.edges.contains_key(&key) {
			return;
		}
		if let Some(origin) = origin {
			self.drawn_by.insert(key.clone(), origin.clone());
		}
		self.edges.insert(
			key,
			TreeEdge {
				source: source.clone(),
				target: target.clone(),
				kind,
			},
		);
	}

	fn link(&mut self, id: &UserId, relative: &UserId, direction: Direction, origin: &Origin) {
		let origin = Some(origin);
		match direction {
			Direction::Up => self.connect(relative, id, TreeEdgeKind::Parent, origin),
			Direction::Down => self.connect(id, relative, TreeEdgeKind::Parent, origin),
			Direction::Left | Direction::Right => {
				self.connect(id, relative, TreeEdgeKind::Sibling, origin)
			}
		}
	}

	/// Draws the family edges between a newly revealed node and whoever of
	/// its parents, children and partners is already on the canvas.
	fn link_to_visible(&mut self, adjacency: &AdjacencyList, id: &UserId, origin: &Origin) {
		let origin = Some(origin);
		for edge in adjacency.edges(id) {
			if !self.nodes.contains_key(&edge.to) {
				continue;
			}
			match edge.kind {
				EdgeKind::Parent => self.connect(&edge.to, id, TreeEdgeKind::Parent, origin),
				EdgeKind::Child => self.connect(id, &edge.to, TreeEdgeKind::Parent, origin),
				EdgeKind::Partner | EdgeKind::Spouse => {
					self.connect(id, &edge.to, TreeEdgeKind::Union, origin)
				}
				EdgeKind::Sibling | EdgeKind::Relative => {}
			}
		}
	}

	/// Removes the given nodes and everything cut off from the focal user,
	/// returning what was actually removed.
	fn remove_nodes(&mut self, ids: Vec<UserId>) -> Vec<UserId> {
		let mut removed = Vec::new();
		for id in ids {
			if id == self.focal || self.nodes.remove(&id).is_none() {
				continue;
			}
			self.edges
				.retain(|_, e| e.source != id && e.target != id);
			removed.push(id);
		}
		for id in self.orphans() {
			self.nodes.remove(&id);
			self.edges
				.retain(|_, e| e.source != id && e.target != id);
			removed.push(id);
		}

		// origins pointing at a node that is gone can never be collapsed again
		let nodes = &self.nodes;
		self.revealed_by
			.retain(|id, (source, _)| nodes.contains_key(id) && nodes.contains_key(source));
		let edges = &self.edges;
		self.drawn_by
			.retain(|key, (source, _)| edges.contains_key(key) && nodes.contains_key(source));
		removed
	}

	/// Nodes no longer connected to the focal user through visible edges.
	fn orphans(&self) -> Vec<UserId> {
		let mut links: HashMap<&UserId, Vec<&UserId>> = HashMap::new();
		for edge in self.edges.values() {
			links.entry(&edge.source).or_default().push(&edge.target);
			links.entry(&edge.target).or_default().push(&edge.source);
		}

		let mut reached: BTreeSet<&UserId> = BTreeSet::from([&self.focal]);
		let mut queue = VecDeque::from([&self.focal]);
		while let Some(current) = queue.pop_front() {
			for &next in links.get(current).into_iter().flatten() {
				if reached.insert(next) {
					queue.push_back(next);
				}
			}
		}
		self.nodes
			.keys()
			.filter(|id| !reached.contains(id))
			.cloned()
			.collect()
	}

	/// Expand flags follow off-canvas relatives. Collapse flags follow what
	/// the node's own expansions put on the canvas.
	fn refresh_affordances(&mut self, adjacency: &AdjacencyList) {
		let visible: BTreeSet<UserId> = self.nodes.keys().cloned().collect();
		let origins: HashSet<&Origin> = self.revealed_by.values().chain(self.drawn_by.values()).collect();
		for node in self.nodes.values_mut() {
			let has_origin = |fold: Fold| origins.contains(&(node.id.clone(), fold));
			node.affordances = Affordances {
				can_expand_up: has_hidden(adjacency, &visible, &node.id, Direction::Up),
				can_expand_down: has_hidden(adjacency, &visible, &node.id, Direction::Down),
				can_expand_horizontal: has_hidden(adjacency, &visible, &node.id, Direction::Left),
				can_collapse_up: has_origin(Fold::Up),
				can_collapse_down: has_origin(Fold::Down),
				can_collapse_horizontal: has_origin(Fold::Side),
			};
		}
	}
}

fn relatives<'a>(adjacency: &'a AdjacencyList, id: &UserId, direction: Direction) -> Vec<&'a UserId> {
	match direction {
		Direction::Up => adjacency.parents(id),
		Direction::Down => adjacency.children(id),
		Direction::Left | Direction::Right => adjacency.siblings(id),
	}
}

fn has_hidden(adjacency: &AdjacencyList, visible: &BTreeSet<UserId>, id: &UserId, direction: Direction) -> bool {
	relatives(adjacency, id, direction)
		.iter()
		.any(|r| !visible.contains(*r))
}

fn edge_key(a: &UserId, b: &UserId) -> (UserId, UserId) {
	if a <= b {
		(a.clone(), b.clone())
	} else {
		(b.clone(), a.clone())
	}
}
