use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{FamilyTreeState, LABEL_BLOCK, NodeInfo};
use crate::family::{Direction, Point, Size, TreeEdgeKind, TreeNode};

const EDGE_RGB: &str = "100, 180, 255";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &mut FamilyTreeState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &FamilyTreeState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let r = state.config.avatar_radius;
	let (dash, gap) = (8.0 / k, 4.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);

	for edge in state.layout.edges() {
		let (Some(a), Some(b)) = (state.layout.node(&edge.source), state.layout.node(&edge.target))
		else {
			continue;
		};
		let is_highlighted = state.is_highlighted(&a.id) && state.is_highlighted(&b.id);

		// t=0: every edge at 0.6, t=1: highlighted at 0.9, the rest at 0.15
		let (alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, (1.5 / k) * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, (1.5 / k) * (1.0 - 0.3 * t))
		};
		ctx.set_stroke_style_str(&format!("rgba({EDGE_RGB}, {alpha})"));
		ctx.set_line_width(width);

		let (pa, pb) = (a.position, b.position);
		match edge.kind {
			TreeEdgeKind::Parent => {
				let _ = ctx.set_line_dash(&js_sys::Array::new());
				let start_y = pa.y + r + LABEL_BLOCK;
				let end_y = pb.y - r;
				let mid_y = (start_y + end_y) / 2.0;
				ctx.begin_path();
				ctx.move_to(pa.x, start_y);
				ctx.line_to(pa.x, mid_y);
				ctx.line_to(pb.x, mid_y);
				ctx.line_to(pb.x, end_y);
				ctx.stroke();
			}
			TreeEdgeKind::Union => {
				let _ = ctx.set_line_dash(&js_sys::Array::of2(
					&JsValue::from_f64(dash),
					&JsValue::from_f64(gap),
				));
				ctx.set_line_dash_offset(dash_offset);
				stroke_between(ctx, pa, pb, r);
			}
			TreeEdgeKind::Sibling => {
				let _ = ctx.set_line_dash(&js_sys::Array::of2(
					&JsValue::from_f64(2.0 / k),
					&JsValue::from_f64(gap),
				));
				stroke_between(ctx, pa, pb, r);
			}
		}
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

/// Straight line between two avatars, stopping at their rims.
fn stroke_between(ctx: &CanvasRenderingContext2d, a: Point, b: Point, r: f64) {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let dist = dx.hypot(dy);
	if dist < 2.0 * r {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	ctx.begin_path();
	ctx.move_to(a.x + ux * r, a.y + uy * r);
	ctx.line_to(b.x - ux * r, b.y - uy * r);
	ctx.stroke();
}

fn draw_nodes(state: &mut FamilyTreeState, ctx: &CanvasRenderingContext2d) {
	let has_highlight = state.has_active_highlight();
	let t = ease_out_cubic(state.hover.highlight_t);
	let nodes: Vec<TreeNode> = state.layout.nodes().cloned().collect();

	// dimmed nodes first so highlighted ones end up on top
	let (lit, dim): (Vec<&TreeNode>, Vec<&TreeNode>) = nodes
		.iter()
		.partition(|n| has_highlight && state.is_highlighted(&n.id));

	for node in dim {
		let alpha = if has_highlight { 1.0 - 0.7 * t } else { 1.0 };
		draw_node(state, ctx, node, alpha, 1.0);
	}
	for node in lit {
		let scale = if state.is_hovered(&node.id) {
			1.0 + 0.15 * t
		} else {
			1.0 + 0.08 * t
		};
		if state.is_hovered(&node.id) && t > 0.01 {
			draw_glow(ctx, node.position, state.config.avatar_radius * scale, t);
		}
		draw_node(state, ctx, node, 1.0, scale);
	}
}

fn draw_glow(ctx: &CanvasRenderingContext2d, at: Point, radius: f64, t: f64) {
	let glow_radius = radius * (1.3 + 0.4 * t);
	let Ok(gradient) = ctx.create_radial_gradient(at.x, at.y, radius * 0.3, at.x, at.y, glow_radius)
	else {
		return;
	};
	let alpha = 0.35 * t;
	let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {alpha})"));
	let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
	let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
	ctx.begin_path();
	let _ = ctx.arc(at.x, at.y, glow_radius, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}

fn draw_node(
	state: &mut FamilyTreeState,
	ctx: &CanvasRenderingContext2d,
	node: &TreeNode,
	alpha: f64,
	scale: f64,
) {
	let Some(info) = state.info.get(&node.id).cloned() else {
		return;
	};
	let k = state.transform.k;
	let (x, y) = (node.position.x, node.position.y);
	let radius = state.config.avatar_radius * scale;

	ctx.set_global_alpha(alpha);
	draw_avatar(state, ctx, node, &info, radius);

	if &node.id == state.layout.focal() {
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius + 3.0, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str("rgba(255, 215, 90, 0.9)");
		ctx.set_line_width(2.5 / k.max(0.5));
		ctx.stroke();
	}

	let font_px = 11.0 / k.max(0.5);
	ctx.set_text_align("center");
	ctx.set_font(&format!("{font_px}px sans-serif"));
	let mut widest = 2.0 * radius;
	let mut line_y = y + state.config.avatar_radius + 14.0;
	for (text, color) in [
		(Some(info.name.as_str()), "rgba(255, 255, 255, 0.9)"),
		(info.lifespan.as_deref(), "rgba(200, 200, 220, 0.7)"),
		(info.relation.as_deref(), "rgba(255, 215, 90, 0.9)"),
	] {
		let Some(text) = text else { continue };
		ctx.set_fill_style_str(color);
		let _ = ctx.fill_text(text, x, line_y);
		if let Ok(metrics) = ctx.measure_text(text) {
			widest = widest.max(metrics.width());
		}
		line_y += 14.0;
	}

	draw_handles(state, ctx, node);
	ctx.set_global_alpha(1.0);
	ctx.set_text_align("start");

	let half_height = state.config.avatar_radius + LABEL_BLOCK;
	state.record_measurement(
		&node.id,
		Size {
			width: widest,
			height: 2.0 * half_height,
		},
	);
}

/// Photo clipped to a circle when it has loaded, initials otherwise.
fn draw_avatar(
	state: &mut FamilyTreeState,
	ctx: &CanvasRenderingContext2d,
	node: &TreeNode,
	info: &NodeInfo,
	radius: f64,
) {
	let (x, y) = (node.position.x, node.position.y);
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&info.color);
	ctx.fill();

	let photo = info
		.photo_url
		.as_deref()
		.and_then(|url| state.photos.get(&node.id, url));
	match photo {
		Some(img) => {
			ctx.save();
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius - 2.0, 0.0, 2.0 * PI);
			ctx.clip();
			let side = 2.0 * (radius - 2.0);
			let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
				img,
				x - side / 2.0,
				y - side / 2.0,
				side,
				side,
			);
			ctx.restore();
		}
		None => {
			ctx.set_fill_style_str("white");
			ctx.set_text_align("center");
			ctx.set_text_baseline("middle");
			ctx.set_font(&format!("bold {}px sans-serif", radius * 0.7));
			let _ = ctx.fill_text(&info.initials, x, y);
			ctx.set_text_baseline("alphabetic");
		}
	}
}

fn draw_handles(state: &FamilyTreeState, ctx: &CanvasRenderingContext2d, node: &TreeNode) {
	let r = state.config.handle_radius;
	let k = state.transform.k;
	for direction in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
		let affordances = node.affordances;
		if !affordances.has_handle(direction) {
			continue;
		}
		let (hx, hy) = state.handle_center(node, direction);
		ctx.begin_path();
		let _ = ctx.arc(hx, hy, r, 0.0, 2.0 * PI);
		ctx.set_fill_style_str("#2a2a4a");
		ctx.fill();
		ctx.set_stroke_style_str(&format!("rgba({EDGE_RGB}, 0.9)"));
		ctx.set_line_width(1.5 / k.max(0.5));
		ctx.stroke();

		// plus while relatives are hidden, minus once everything is shown
		let arm = r * 0.5;
		ctx.begin_path();
		ctx.move_to(hx - arm, hy);
		ctx.line_to(hx + arm, hy);
		if affordances.can_expand(direction) {
			ctx.move_to(hx, hy - arm);
			ctx.line_to(hx, hy + arm);
		}
		ctx.stroke();
	}
}
