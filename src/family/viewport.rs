//! Camera framing after layout changes.
//!
//! Node sizes are only known once the renderer has drawn them, so a request
//! stays pending until every target has been measured and is retried on each
//! animation frame. A newer request replaces an older one.

use std::collections::HashMap;

use log::debug;

use super::layout::{LayoutChange, TreeLayout};
use super::types::UserId;
use crate::config::TreeConfig;

/// Rendered extent of a node, centred on its layout position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	/// World units.
	pub width: f64,
	/// World units.
	pub height: f64,
}

/// World-space point to centre on and the zoom to show it at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTarget {
	/// World x to put at the viewport centre.
	pub x: f64,
	/// World y to put at the viewport centre.
	pub y: f64,
	/// Already clamped to the configured limits.
	pub zoom: f64,
}

/// Nodes the camera should frame after a change.
#[derive(Clone, Debug, PartialEq)]
pub struct CenteringRequest {
	/// Anchor first, then whatever the change revealed.
	pub targets: Vec<UserId>,
	/// Collapses keep the current zoom unless the framed nodes do not fit.
	pub allow_zoom_in: bool,
}

impl CenteringRequest {
	/// Frames the source with whatever was revealed, or just the source
	/// (the focal user if the source itself went away) after a collapse.
	pub fn for_change(change: &LayoutChange, layout: &TreeLayout) -> Self {
		let anchor = if layout.contains(&change.source) {
			change.source.clone()
		} else {
			layout.focal().clone()
		};
		if change.added.is_empty() {
			return Self {
				targets: vec![anchor],
				allow_zoom_in: false,
			};
		}
		let revealed = change.added.iter().filter(|id| **id != anchor).cloned();
		let targets = std::iter::once(anchor.clone()).chain(revealed).collect();
		Self {
			targets,
			allow_zoom_in: true,
		}
	}
}

/// Holds at most one pending [`CenteringRequest`].
#[derive(Clone, Debug, Default)]
pub struct ViewportCentering {
	pending: Option<CenteringRequest>,
	/// Frames spent waiting on the pending request.
	waited: u32,
}

impl ViewportCentering {
	/// Queues `request`, replacing any pending one.
	pub fn request(&mut self, request: CenteringRequest) {
		if self.pending.is_some() {
			debug!("superseding pending centering request");
		}
		self.pending = Some(request);
		self.waited = 0;
	}

	/// Whether a request is still waiting.
	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Tries to resolve the pending request. Returns `None` while nothing is
	/// pending or some target has not been measured yet.
	pub fn poll(
		&mut self,
		layout: &TreeLayout,
		measured: &HashMap<UserId, Size>,
		viewport: Size,
		current_zoom: f64,
		config: &TreeConfig,
	) -> Option<CameraTarget> {
		let request = self.pending.as_ref()?;
		let targets: Vec<&UserId> = request
			.targets
			.iter()
			.filter(|id| layout.contains(id))
			.collect();
		if targets.is_empty() {
			debug!("dropping centering request: targets left the canvas");
			self.pending = None;
			return None;
		}

		let mut min = (f64::INFINITY, f64::INFINITY);
		let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for id in &targets {
			let (Some(node), Some(size)) = (layout.node(id), measured.get(*id)) else {
				self.waited += 1;
				return None;
			};
			let (half_w, half_h) = (size.width / 2.0, size.height / 2.0);
			min = (min.0.min(node.position.x - half_w), min.1.min(node.position.y - half_h));
			max = (max.0.max(node.position.x + half_w), max.1.max(node.position.y + half_h));
		}

		let pad = config.centering_padding;
		let (width, height) = (max.0 - min.0 + 2.0 * pad, max.1 - min.1 + 2.0 * pad);
		let fit = (viewport.width / width).min(viewport.height / height);
		let mut zoom = fit.clamp(config.min_zoom, config.max_zoom);
		if !request.allow_zoom_in {
			zoom = zoom.min(current_zoom.max(config.min_zoom));
		}

		debug!(
			"centering on {} nodes after {} frames",
			targets.len(),
			self.waited
		);
		let target = CameraTarget {
			x: (min.0 + max.0) / 2.0,
			y: (min.1 + max.1) / 2.0,
			zoom,
		};
		self.pending = None;
		self.waited = 0;
		Some(target)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::family::adjacency::AdjacencyList;
	use crate::family::layout::Direction;
	use crate::family::types::{Gender, Person, Relation, RelationshipEdge};

	fn setup() -> (AdjacencyList, TreeLayout) {
		let persons: Vec<Person> = ["me", "mum", "dad"]
			.iter()
			.map(|id| Person::new(*id, id, "", Gender::Unknown))
			.collect();
		let members: Vec<UserId> = persons.iter().map(|p| p.id.clone()).collect();
		let rows = [
			RelationshipEdge::canonical("mum".into(), "me".into(), Relation::Parent, "g"),
			RelationshipEdge::canonical("dad".into(), "me".into(), Relation::Parent, "g"),
		];
		let adj = AdjacencyList::build(&rows, &members, &persons);
		let layout = TreeLayout::new("me".into(), &adj, &TreeConfig::default());
		(adj, layout)
	}

	fn measure_all(layout: &TreeLayout) -> HashMap<UserId, Size> {
		layout
			.nodes()
			.map(|n| {
				(
					n.id.clone(),
					Size {
						width: 100.0,
						height: 100.0,
					},
				)
			})
			.collect()
	}

	const VIEWPORT: Size = Size {
		width: 800.0,
		height: 600.0,
	};

	#[test]
	fn waits_for_measurement() {
		let (adj, mut layout) = setup();
		let config = TreeConfig::default();
		let mut centering = ViewportCentering::default();
		let before = measure_all(&layout);

		let change = layout.expand(&adj, &"me".into(), Direction::Up);
		centering.request(CenteringRequest::for_change(&change, &layout));
		assert_eq!(centering.poll(&layout, &before, VIEWPORT, 1.0, &config), None);
		assert!(centering.is_pending());

		let target = centering
			.poll(&layout, &measure_all(&layout), VIEWPORT, 1.0, &config)
			.unwrap();
		assert!(!centering.is_pending());
		// me at (0, 0), parents at (-75, -170) and (75, -170)
		assert_eq!((target.x, target.y), (0.0, -85.0));
		let expected = (800.0f64 / 370.0).min(600.0 / 390.0);
		assert!((target.zoom - expected).abs() < 1e-9);
	}

	#[test]
	fn newer_requests_win() {
		let (_, layout) = setup();
		let config = TreeConfig::default();
		let mut centering = ViewportCentering::default();
		centering.request(CenteringRequest {
			targets: vec!["me".into()],
			allow_zoom_in: true,
		});
		centering.request(CenteringRequest {
			targets: vec!["ghost".into()],
			allow_zoom_in: true,
		});
		assert_eq!(
			centering.poll(&layout, &measure_all(&layout), VIEWPORT, 1.0, &config),
			None
		);
		assert!(!centering.is_pending());
	}

	#[test]
	fn collapses_do_not_zoom_in() {
		let (adj, mut layout) = setup();
		let config = TreeConfig::default();
		layout.expand(&adj, &"me".into(), Direction::Up);
		let change = layout.collapse(&adj, &"me".into(), Direction::Up);
		let request = CenteringRequest::for_change(&change, &layout);
		assert_eq!(request.targets, [UserId::from("me")]);

		let mut centering = ViewportCentering::default();
		centering.request(request);
		let target = centering
			.poll(&layout, &measure_all(&layout), VIEWPORT, 0.5, &config)
			.unwrap();
		assert_eq!((target.x, target.y, target.zoom), (0.0, 0.0, 0.5));
	}
}
