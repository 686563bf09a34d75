use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::graph::{Edge, Node};

use super::state::{
	Bounds, HANDLE_RADIUS, NODE_CORNER, NODE_HEIGHT, NODE_WIDTH, SurfaceState, bezier_point,
	edge_curve, graph_bounds, source_handle, target_handle,
};

const EDGE_COLOR: &str = "#b1b1b7";
const EDGE_SELECTED_COLOR: &str = "#555";
const NODE_BORDER: &str = "#1a192b";
const MINIMAP_WIDTH: f64 = 200.0;
const MINIMAP_HEIGHT: f64 = 150.0;
const MINIMAP_MARGIN: f64 = 15.0;

pub fn render(state: &SurfaceState, nodes: &[Node], edges: &[Edge], ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	draw_background(state, ctx);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, nodes, edges, ctx);
	draw_connection_preview(state, nodes, ctx);
	draw_nodes(state, nodes, ctx);
	ctx.restore();
	if state.options.minimap {
		draw_minimap(state, nodes, ctx);
	}
}

fn draw_background(state: &SurfaceState, ctx: &CanvasRenderingContext2d) {
	let gap = state.options.background_gap * state.transform.k;
	if gap < 4.0 {
		return;
	}
	let r = 0.5 * state.transform.k.max(1.0);
	ctx.set_fill_style_str(&state.options.background_color);
	let mut x = state.transform.x.rem_euclid(gap);
	while x < state.width {
		let mut y = state.transform.y.rem_euclid(gap);
		while y < state.height {
			ctx.fill_rect(x - r, y - r, 2.0 * r, 2.0 * r);
			y += gap;
		}
		x += gap;
	}
}

fn draw_edges(state: &SurfaceState, nodes: &[Node], edges: &[Edge], ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let arrow_size = 8.0;
	for edge in edges {
		let (Some(source), Some(target)) = (
			nodes.iter().find(|n| n.id == edge.source),
			nodes.iter().find(|n| n.id == edge.target),
		) else {
			continue;
		};
		let c = edge_curve(source, target);
		let color = if edge.selected {
			EDGE_SELECTED_COLOR
		} else {
			EDGE_COLOR
		};

		let width = if edge.selected { 2.0 } else { 1.0 };
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(width / k.min(1.0));
		ctx.begin_path();
		ctx.move_to(c[0].0, c[0].1);
		ctx.bezier_curve_to(c[1].0, c[1].1, c[2].0, c[2].1, c[3].0, c[3].1);
		ctx.stroke();

		// Arrow follows the tangent at the end of the curve.
		let (bx, by) = bezier_point(&c, 0.95);
		let (dx, dy) = (c[3].0 - bx, c[3].1 - by);
		let dist = dx.hypot(dy);
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let (tip_x, tip_y) = c[3];
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.set_fill_style_str(color);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_connection_preview(state: &SurfaceState, nodes: &[Node], ctx: &CanvasRenderingContext2d) {
	let Some(connect) = &state.connect else {
		return;
	};
	let Some(source) = nodes.iter().find(|n| n.id == connect.source) else {
		return;
	};
	let (sx, sy) = source_handle(source);
	let offset = ((connect.y - sy).abs() / 2.0).max(40.0);
	let dash = 5.0 / state.transform.k;
	ctx.set_stroke_style_str(EDGE_SELECTED_COLOR);
	ctx.set_line_width(1.0 / state.transform.k);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dash),
		&JsValue::from_f64(dash),
	));
	ctx.begin_path();
	ctx.move_to(sx, sy);
	ctx.bezier_curve_to(
		sx,
		sy + offset,
		connect.x,
		connect.y - offset,
		connect.x,
		connect.y,
	);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_handle(ctx: &CanvasRenderingContext2d, (x, y): (f64, f64)) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, HANDLE_RADIUS, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(NODE_BORDER);
	ctx.fill();
}

fn draw_nodes(state: &SurfaceState, nodes: &[Node], ctx: &CanvasRenderingContext2d) {
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for node in nodes {
		let Node {
			position, data, ..
		} = node;
		let hovered = state.hover.as_ref() == Some(&node.id);

		rounded_rect(ctx, position.x, position.y, NODE_WIDTH, NODE_HEIGHT, NODE_CORNER);
		ctx.set_fill_style_str("#ffffff");
		ctx.fill();
		ctx.set_stroke_style_str(NODE_BORDER);
		ctx.set_line_width(if node.selected { 2.0 } else { 1.0 });
		ctx.stroke();
		if hovered && !node.selected {
			ctx.set_stroke_style_str("rgba(26, 25, 43, 0.25)");
			ctx.set_line_width(4.0);
			ctx.stroke();
		}

		let cx = position.x + NODE_WIDTH / 2.0;
		ctx.set_fill_style_str("#222");
		match &data.status {
			Some(status) if !status.is_empty() => {
				ctx.set_font("12px sans-serif");
				let _ = ctx.fill_text(&data.label, cx, position.y + NODE_HEIGHT * 0.38);
				ctx.set_fill_style_str("#777");
				ctx.set_font("10px sans-serif");
				let _ = ctx.fill_text(status, cx, position.y + NODE_HEIGHT * 0.75);
			}
			_ => {
				ctx.set_font("12px sans-serif");
				let _ = ctx.fill_text(&data.label, cx, position.y + NODE_HEIGHT / 2.0);
			}
		}

		draw_handle(ctx, target_handle(node));
		draw_handle(ctx, source_handle(node));
	}
}

fn draw_minimap(state: &SurfaceState, nodes: &[Node], ctx: &CanvasRenderingContext2d) {
	let viewport = state.viewport();
	let world: Bounds = graph_bounds(nodes).map_or(viewport, |b| b.union(viewport));
	if world.width() <= 0.0 || world.height() <= 0.0 {
		return;
	}
	let scale = (MINIMAP_WIDTH / world.width()).min(MINIMAP_HEIGHT / world.height());
	let (left, top) = (
		state.width - MINIMAP_WIDTH - MINIMAP_MARGIN,
		state.height - MINIMAP_HEIGHT - MINIMAP_MARGIN,
	);
	// Centre the scaled world inside the minimap frame.
	let ox = left + (MINIMAP_WIDTH - world.width() * scale) / 2.0 - world.min_x * scale;
	let oy = top + (MINIMAP_HEIGHT - world.height() * scale) / 2.0 - world.min_y * scale;

	ctx.set_fill_style_str("rgba(240, 240, 240, 0.9)");
	ctx.fill_rect(left, top, MINIMAP_WIDTH, MINIMAP_HEIGHT);
	ctx.set_fill_style_str("#e2e2e2");
	for node in nodes {
		ctx.fill_rect(
			ox + node.position.x * scale,
			oy + node.position.y * scale,
			NODE_WIDTH * scale,
			NODE_HEIGHT * scale,
		);
	}
	ctx.set_stroke_style_str("#999");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(
		ox + viewport.min_x * scale,
		oy + viewport.min_y * scale,
		viewport.width() * scale,
		viewport.height() * scale,
	);
	ctx.set_stroke_style_str("#ccc");
	ctx.stroke_rect(left, top, MINIMAP_WIDTH, MINIMAP_HEIGHT);
}
