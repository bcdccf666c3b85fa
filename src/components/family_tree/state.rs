use std::collections::{HashMap, HashSet};

use log::info;

use super::photos::PhotoCache;
use crate::config::TreeConfig;
use crate::family::{
	AdjacencyList, CameraTarget, CenteringRequest, Direction, FamilyGroup, Gender, LayoutChange,
	Size, TreeAction, TreeLayout, TreeNode, UserId, ViewportCentering, resolve,
};

const COLORS: &[&str] = &["#1f77b4", "#e377c2", "#9467bd", "#7f7f7f"];

/// Space between the avatar edge and a handle.
const HANDLE_GAP: f64 = 4.0;
/// Height of the text block under an avatar.
pub const LABEL_BLOCK: f64 = 46.0;
/// Pointer travel below which a press counts as a click.
const CLICK_SLOP: f64 = 4.0;

/// What is drawn for a visible person.
#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub name: String,
	pub initials: String,
	pub lifespan: Option<String>,
	/// Kinship label relative to the focal user.
	pub relation: Option<String>,
	pub color: String,
	pub photo_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PressState {
	pub x: f64,
	pub y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<UserId>,
	pub neighbors: HashSet<UserId>,
	pub highlight_t: f64,
	pub prev_node: Option<UserId>,
	pub prev_neighbors: HashSet<UserId>,
	delay_t: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Hit {
	Node(UserId),
	Handle(UserId, Direction),
}

pub struct FamilyTreeState {
	pub group: FamilyGroup,
	pub adjacency: AdjacencyList,
	pub layout: TreeLayout,
	pub info: HashMap<UserId, NodeInfo>,
	pub config: TreeConfig,
	pub transform: ViewTransform,
	/// Where the camera is easing to, if anywhere.
	pub camera: Option<CameraTarget>,
	pub centering: ViewportCentering,
	/// Rendered node sizes, filled in by the renderer.
	pub measured: HashMap<UserId, Size>,
	pub photos: PhotoCache,
	pub pan: PanState,
	pub press: Option<PressState>,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
}

impl FamilyTreeState {
	pub fn new(group: FamilyGroup, focal: UserId, width: f64, height: f64, config: TreeConfig) -> Self {
		let adjacency = AdjacencyList::from_group(&group);
		let layout = TreeLayout::new(focal, &adjacency, &config);
		let mut state = Self {
			group,
			adjacency,
			layout,
			info: HashMap::new(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			config,
			camera: None,
			centering: ViewportCentering::default(),
			measured: HashMap::new(),
			photos: PhotoCache::default(),
			pan: PanState::default(),
			press: None,
			hover: HoverState::default(),
			width,
			height,
			flow_time: 0.0,
		};
		state.refresh_info();
		state.center_on_focal();
		state
	}

	/// Swaps in fresh group data, keeping the focal user when still a member.
	pub fn set_group(&mut self, group: FamilyGroup) {
		let focal = if group.is_member(self.layout.focal()) {
			self.layout.focal().clone()
		} else {
			match group.viewer.clone().or_else(|| group.members.first().cloned()) {
				Some(id) => id,
				None => return,
			}
		};
		self.adjacency = AdjacencyList::from_group(&group);
		self.group = group;
		self.layout = TreeLayout::new(focal, &self.adjacency, &self.config);
		self.photos.clear();
		self.after_change(None);
		self.center_on_focal();
	}

	pub fn refocus(&mut self, focal: UserId) {
		if self.layout.focal() == &focal {
			return;
		}
		info!("focal user is now {focal}");
		let change = self.layout.refocus(&self.adjacency, focal);
		self.set_hover(None);
		self.after_change(Some(&change));
	}

	/// Presses the handle on `id`. Returns the user to focus on when the
	/// press asks for a new focal user instead of changing the tree in place.
	pub fn toggle(&mut self, id: &UserId, direction: Direction) -> Option<UserId> {
		match self.layout.toggle(&self.adjacency, id, direction) {
			TreeAction::Expanded(change) | TreeAction::Collapsed(change) => {
				self.after_change(Some(&change));
				None
			}
			TreeAction::Refocus(next) => Some(next),
			TreeAction::Unchanged => None,
		}
	}

	fn after_change(&mut self, change: Option<&LayoutChange>) {
		self.measured.retain(|id, _| self.layout.contains(id));
		self.refresh_info();
		if let Some(change) = change {
			self.centering
				.request(CenteringRequest::for_change(change, &self.layout));
		}
		let hovered = self.hover.node.clone();
		if hovered.as_ref().is_some_and(|id| !self.layout.contains(id)) {
			self.set_hover(None);
		}
	}

	fn center_on_focal(&mut self) {
		let mut targets = vec![self.layout.focal().clone()];
		targets.extend(
			self.adjacency
				.unions(self.layout.focal())
				.into_iter()
				.cloned(),
		);
		self.centering.request(CenteringRequest {
			targets,
			allow_zoom_in: true,
		});
	}

	/// Relationship labels are resolved against the focal user for every
	/// visible node.
	fn refresh_info(&mut self) {
		let focal = self.layout.focal().clone();
		self.info = self
			.layout
			.nodes()
			.map(|node| {
				let info = match self.group.person(&node.id) {
					Some(person) => NodeInfo {
						name: person.display_name(),
						initials: person.initials(),
						lifespan: person.lifespan(),
						relation: resolve(&self.adjacency, &focal, &node.id, person.gender)
							.filter(|rel| rel.hops > 0)
							.map(|rel| rel.label),
						color: gender_color(person.gender).into(),
						photo_url: person.photo_url.clone(),
					},
					None => NodeInfo {
						name: node.id.to_string(),
						color: COLORS[3].into(),
						..NodeInfo::default()
					},
				};
				(node.id.clone(), info)
			})
			.collect();
	}

	pub fn record_measurement(&mut self, id: &UserId, size: Size) {
		self.measured.insert(id.clone(), size);
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Centre of a node's handle for `direction`, in graph space.
	pub fn handle_center(&self, node: &TreeNode, direction: Direction) -> (f64, f64) {
		let (x, y) = (node.position.x, node.position.y);
		let offset = self.config.avatar_radius + self.config.handle_radius + HANDLE_GAP;
		match direction {
			Direction::Up => (x, y - offset),
			Direction::Down => (x, y + offset + LABEL_BLOCK),
			Direction::Left => (x - offset, y),
			Direction::Right => (x + offset, y),
		}
	}

	pub fn hit_at(&self, sx: f64, sy: f64) -> Option<Hit> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let within = |x: f64, y: f64, r: f64| (x - gx).hypot(y - gy) <= r;

		for node in self.layout.nodes() {
			for direction in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
				if !node.affordances.has_handle(direction) {
					continue;
				}
				let (hx, hy) = self.handle_center(node, direction);
				if within(hx, hy, self.config.handle_radius) {
					return Some(Hit::Handle(node.id.clone(), direction));
				}
			}
		}
		self.layout
			.nodes()
			.find(|n| within(n.position.x, n.position.y, self.config.avatar_radius))
			.map(|n| Hit::Node(n.id.clone()))
	}

	pub fn begin_press(&mut self, x: f64, y: f64) {
		self.press = Some(PressState { x, y, moved: false });
		if self.hit_at(x, y).is_none() {
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
			self.camera = None;
		}
	}

	pub fn drag_to(&mut self, x: f64, y: f64) {
		if let Some(press) = self.press.as_mut() {
			if (x - press.x).hypot(y - press.y) > CLICK_SLOP {
				press.moved = true;
			}
		}
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	/// Ends a press. A press that did not travel is a click on whatever is
	/// under the pointer; clicking an avatar asks for it to become focal.
	pub fn end_press(&mut self, x: f64, y: f64) -> Option<UserId> {
		self.pan.active = false;
		let press = self.press.take()?;
		if press.moved {
			return None;
		}
		match self.hit_at(x, y)? {
			Hit::Handle(id, direction) => self.toggle(&id, direction),
			Hit::Node(id) if &id != self.layout.focal() => Some(id),
			Hit::Node(_) => None,
		}
	}

	pub fn cancel_press(&mut self) {
		self.press = None;
		self.pan.active = false;
	}

	/// Zooms by `factor` keeping the graph point under (sx, sy) in place.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(self.config.min_zoom, self.config.max_zoom * 2.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.camera = None;
	}

	pub fn set_hover(&mut self, node: Option<UserId>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the previous highlight around so it can fade out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.neighbors.clear();
		if let Some(id) = &node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for edge in self.layout.edges() {
				if &edge.source == id {
					self.hover.neighbors.insert(edge.target.clone());
				} else if &edge.target == id {
					self.hover.neighbors.insert(edge.source.clone());
				}
			}
		}
		self.hover.node = node;
	}

	pub fn hover_at(&mut self, sx: f64, sy: f64) {
		let hovered = match self.hit_at(sx, sy) {
			Some(Hit::Node(id)) | Some(Hit::Handle(id, _)) => Some(id),
			None => None,
		};
		self.set_hover(hovered);
	}

	/// CSS cursor for the canvas in its current interaction state.
	pub fn cursor(&self) -> &'static str {
		if self.pan.active {
			"grabbing"
		} else if self.hover.node.is_some() {
			"pointer"
		} else {
			"grab"
		}
	}

	pub fn is_highlighted(&self, id: &UserId) -> bool {
		self.hover.node.as_ref() == Some(id)
			|| self.hover.neighbors.contains(id)
			|| self.hover.prev_node.as_ref() == Some(id)
			|| self.hover.prev_neighbors.contains(id)
	}

	pub fn is_hovered(&self, id: &UserId) -> bool {
		self.hover.node.as_ref() == Some(id) || self.hover.prev_node.as_ref() == Some(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;
		self.tick_hover(dt);

		let viewport = Size {
			width: self.width,
			height: self.height,
		};
		if let Some(target) =
			self.centering
				.poll(&self.layout, &self.measured, viewport, self.transform.k, &self.config)
		{
			self.camera = Some(target);
		}
		self.tick_camera(dt);
	}

	fn tick_hover(&mut self, dt: f64) {
		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	/// Eases the view transform towards the camera target.
	fn tick_camera(&mut self, dt: f64) {
		let Some(camera) = self.camera else {
			return;
		};
		let goal = ViewTransform {
			x: self.width / 2.0 - camera.x * camera.zoom,
			y: self.height / 2.0 - camera.y * camera.zoom,
			k: camera.zoom,
		};
		let t = 1.0 - (-self.config.camera_speed * dt).exp();
		let lerp = |from: f64, to: f64| from + (to - from) * t;
		self.transform = ViewTransform {
			x: lerp(self.transform.x, goal.x),
			y: lerp(self.transform.y, goal.y),
			k: lerp(self.transform.k, goal.k),
		};

		let settled = (self.transform.x - goal.x).abs() < 0.5
			&& (self.transform.y - goal.y).abs() < 0.5
			&& (self.transform.k - goal.k).abs() < 1e-3;
		if settled {
			self.transform = goal;
			self.camera = None;
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

fn gender_color(gender: Gender) -> &'static str {
	match gender {
		Gender::Male => COLORS[0],
		Gender::Female => COLORS[1],
		Gender::Other => COLORS[2],
		Gender::Unknown => COLORS[3],
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::family::{Person, Relation};

	fn group() -> FamilyGroup {
		let mut g = FamilyGroup::new("g", "Test");
		g.add_member(Person::new("me", "Sam", "Doe", Gender::Other));
		g.add_member(Person::new("mum", "Ann", "Doe", Gender::Female));
		g.add_member(Person::new("kid", "Kit", "Doe", Gender::Male));
		g.record_relationship(&"mum".into(), &"me".into(), Relation::Parent)
			.unwrap();
		g.record_relationship(&"me".into(), &"kid".into(), Relation::Parent)
			.unwrap();
		g
	}

	fn state() -> FamilyTreeState {
		FamilyTreeState::new(group(), "me".into(), 800.0, 600.0, TreeConfig::default())
	}

	/// Screen position of a graph point under the current transform.
	fn to_screen(s: &FamilyTreeState, (x, y): (f64, f64)) -> (f64, f64) {
		(
			x * s.transform.k + s.transform.x,
			y * s.transform.k + s.transform.y,
		)
	}

	#[test]
	fn clicking_handles_expands_and_labels() {
		let mut s = state();
		let me = s.layout.node(&"me".into()).unwrap().clone();
		let (x, y) = to_screen(&s, s.handle_center(&me, Direction::Up));
		s.begin_press(x, y);
		assert!(!s.pan.active);
		assert_eq!(s.end_press(x, y), None);

		assert!(s.layout.contains(&"mum".into()));
		let mum = &s.info[&UserId::from("mum")];
		assert_eq!(mum.relation.as_deref(), Some("Mother"));
		assert_eq!(mum.name, "Ann Doe");
		assert_eq!(s.info[&UserId::from("me")].relation, None);
		assert!(s.centering.is_pending());
	}

	#[test]
	fn clicking_another_avatar_requests_focus() {
		let mut s = state();
		s.toggle(&"me".into(), Direction::Up);
		let mum = s.layout.node(&"mum".into()).unwrap().position;
		let (x, y) = to_screen(&s, (mum.x, mum.y));
		s.begin_press(x, y);
		assert_eq!(s.end_press(x, y), Some("mum".into()));

		s.refocus("mum".into());
		assert_eq!(s.layout.focal(), &UserId::from("mum"));
		assert_eq!(s.info[&UserId::from("mum")].relation, None);
	}

	#[test]
	fn dragging_pans_instead_of_clicking() {
		let mut s = state();
		s.begin_press(10.0, 10.0);
		assert!(s.pan.active);
		s.drag_to(60.0, 30.0);
		assert_eq!(s.end_press(60.0, 30.0), None);
		assert_eq!((s.transform.x, s.transform.y), (450.0, 320.0));
	}

	#[test]
	fn cursor_follows_pan_and_hover() {
		let mut s = state();
		assert_eq!(s.cursor(), "grab");
		let me = s.layout.node(&"me".into()).unwrap().position;
		let (x, y) = to_screen(&s, (me.x, me.y));
		s.hover_at(x, y);
		assert_eq!(s.cursor(), "pointer");

		s.set_hover(None);
		s.begin_press(5.0, 5.0);
		s.drag_to(40.0, 5.0);
		assert_eq!(s.cursor(), "grabbing");
		s.end_press(40.0, 5.0);
		assert_eq!(s.cursor(), "grab");
	}

	#[test]
	fn camera_settles_on_measured_target() {
		let mut s = state();
		for node in s.layout.nodes().map(|n| n.id.clone()).collect::<Vec<_>>() {
			s.record_measurement(
				&node,
				Size {
					width: 60.0,
					height: 150.0,
				},
			);
		}
		for _ in 0..600 {
			s.tick(1.0 / 60.0);
		}
		assert!(s.camera.is_none());
		assert!(!s.centering.is_pending());
		// `me` sits at the origin, so it ends up in the middle of the screen
		assert!((s.transform.x - 400.0).abs() < 1e-9);
		assert!((s.transform.y - 300.0).abs() < 1e-9);
	}

	#[test]
	fn down_handles_fold_ancestors_and_refocus_others() {
		let mut s = state();
		s.toggle(&"me".into(), Direction::Up);
		assert_eq!(s.toggle(&"mum".into(), Direction::Down), None);
		// mum is an ancestor, so her down handle folds her away
		assert!(!s.layout.contains(&"mum".into()));

		s.toggle(&"me".into(), Direction::Down);
		assert_eq!(s.toggle(&"kid".into(), Direction::Down), Some("kid".into()));
		// the caller decides when to refocus
		assert_eq!(s.layout.focal(), &UserId::from("me"));
	}
}
