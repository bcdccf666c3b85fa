//! Tunables for tree layout, rendering and camera behaviour.

/// Demo group shown on the home page, as the persistence layer would hand it over.
pub const DEMO_GROUP_JSON: &str = include_str!("../assets/demo_group.json");

/// Layout spacing, drawing sizes and camera limits.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
	/// Minimum horizontal distance between two nodes on one level, also the
	/// increment used to move a batch out of the way of existing nodes.
	pub node_spacing: f64,
	/// Vertical distance between generations.
	pub level_height: f64,
	/// Radius of a node's avatar circle, in world units.
	pub avatar_radius: f64,
	/// Radius of the expand/collapse handles around an avatar.
	pub handle_radius: f64,
	/// Lowest zoom the wheel and centering may reach.
	pub min_zoom: f64,
	/// Highest zoom the wheel and centering may reach.
	pub max_zoom: f64,
	/// World-space margin kept around a framed subtree.
	pub centering_padding: f64,
	/// Fraction of the remaining camera distance covered per second.
	pub camera_speed: f64,
}

impl Default for TreeConfig {
	fn default() -> Self {
		Self {
			node_spacing: 150.0,
			level_height: 170.0,
			avatar_radius: 28.0,
			handle_radius: 9.0,
			min_zoom: 0.25,
			max_zoom: 1.6,
			centering_padding: 60.0,
			camera_speed: 6.0,
		}
	}
}
