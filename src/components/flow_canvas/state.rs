use crate::graph::{Edge, EdgeChange, EdgeId, Node, NodeChange, NodeId, Position};

use super::types::CanvasOptions;

pub const NODE_WIDTH: f64 = 150.0;
pub const NODE_HEIGHT: f64 = 40.0;
pub const NODE_CORNER: f64 = 4.0;
pub const HANDLE_RADIUS: f64 = 4.0;
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const FIT_PADDING: f64 = 0.1;

// Hit radii are in graph space, so they scale with zoom like the nodes do.
const HANDLE_HIT_RADIUS: f64 = 8.0;
const EDGE_HIT_DISTANCE: f64 = 6.0;
// Screen pixels a press may travel and still count as a click.
const CLICK_TOLERANCE: f64 = 3.0;
const BEZIER_SAMPLES: usize = 16;
const SELF_LOOP_REACH: f64 = 60.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<NodeId>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Position,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
}

/// An in-flight connect gesture; `x`/`y` track the pointer in graph space.
#[derive(Clone, Debug)]
pub struct ConnectState {
	pub source: NodeId,
	pub x: f64,
	pub y: f64,
}

/// What the pointer landed on.
#[derive(Clone, Debug, PartialEq)]
pub enum Hit {
	SourceHandle(NodeId),
	Node(NodeId),
	Edge(EdgeId),
}

/// Outcome of releasing the pointer.
#[derive(Clone, Debug, PartialEq)]
pub enum Release {
	NodeClick(NodeId),
	Connect { source: NodeId, x: f64, y: f64 },
	PaneClick,
	Nothing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl Bounds {
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	pub fn union(self, other: Bounds) -> Bounds {
		Bounds {
			min_x: self.min_x.min(other.min_x),
			min_y: self.min_y.min(other.min_y),
			max_x: self.max_x.max(other.max_x),
			max_y: self.max_y.max(other.max_y),
		}
	}
}

/// Viewport and gesture state of one canvas. Graph data lives in the store.
pub struct SurfaceState {
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub connect: Option<ConnectState>,
	pub hover: Option<NodeId>,
	pub width: f64,
	pub height: f64,
	pub options: CanvasOptions,
}

impl SurfaceState {
	pub fn new(width: f64, height: f64, options: CanvasOptions) -> Self {
		Self {
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			connect: None,
			hover: None,
			width,
			height,
			options,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Visible region in graph space.
	pub fn viewport(&self) -> Bounds {
		let (min_x, min_y) = self.screen_to_graph(0.0, 0.0);
		let (max_x, max_y) = self.screen_to_graph(self.width, self.height);
		Bounds {
			min_x,
			min_y,
			max_x,
			max_y,
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Zooms by `factor`, keeping the graph point under (`sx`, `sy`) fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn zoom_by(&mut self, factor: f64) {
		self.zoom_at(self.width / 2.0, self.height / 2.0, factor);
	}

	/// Centres all nodes in the viewport with a margin of [`FIT_PADDING`].
	pub fn fit_view(&mut self, nodes: &[Node]) {
		let Some(bounds) = graph_bounds(nodes) else {
			self.transform = ViewTransform::default();
			return;
		};
		let scale = 1.0 + FIT_PADDING;
		let k = (self.width / (bounds.width() * scale))
			.min(self.height / (bounds.height() * scale))
			.clamp(MIN_ZOOM, MAX_ZOOM);
		let (cx, cy) = (
			(bounds.min_x + bounds.max_x) / 2.0,
			(bounds.min_y + bounds.max_y) / 2.0,
		);
		self.transform = ViewTransform {
			x: self.width / 2.0 - cx * k,
			y: self.height / 2.0 - cy * k,
			k,
		};
	}

	pub fn begin_drag(&mut self, node: NodeId, node_start: Position, sx: f64, sy: f64) {
		self.drag = DragState {
			node: Some(node),
			start_x: sx,
			start_y: sy,
			node_start,
			moved: false,
		};
	}

	/// Returns the dragged node's new position once the press has become a drag.
	pub fn drag_to(&mut self, sx: f64, sy: f64) -> Option<(NodeId, Position)> {
		let id = self.drag.node.clone()?;
		let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
		if !self.drag.moved && dx.hypot(dy) < CLICK_TOLERANCE {
			return None;
		}
		self.drag.moved = true;
		let position = Position::new(
			self.drag.node_start.x + dx / self.transform.k,
			self.drag.node_start.y + dy / self.transform.k,
		);
		Some((id, position))
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
			moved: false,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
		if dx.hypot(dy) >= CLICK_TOLERANCE {
			self.pan.moved = true;
		}
		self.transform.x = self.pan.transform_start_x + dx;
		self.transform.y = self.pan.transform_start_y + dy;
	}

	pub fn begin_connect(&mut self, source: NodeId, sx: f64, sy: f64) {
		let (x, y) = self.screen_to_graph(sx, sy);
		self.connect = Some(ConnectState { source, x, y });
	}

	pub fn connect_to(&mut self, sx: f64, sy: f64) {
		let (x, y) = self.screen_to_graph(sx, sy);
		if let Some(c) = self.connect.as_mut() {
			c.x = x;
			c.y = y;
		}
	}

	pub fn is_busy(&self) -> bool {
		self.drag.node.is_some() || self.pan.active || self.connect.is_some()
	}

	/// Ends whatever gesture is active and reports what it amounted to.
	pub fn release(&mut self) -> Release {
		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);
		if let Some(c) = self.connect.take() {
			return Release::Connect {
				source: c.source,
				x: c.x,
				y: c.y,
			};
		}
		match drag.node {
			Some(id) if !drag.moved => Release::NodeClick(id),
			Some(_) => Release::Nothing,
			None if pan.active && !pan.moved => Release::PaneClick,
			None => Release::Nothing,
		}
	}

	pub fn cancel_gestures(&mut self) {
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.connect = None;
		self.hover = None;
	}
}

pub fn source_handle(node: &Node) -> (f64, f64) {
	(
		node.position.x + NODE_WIDTH / 2.0,
		node.position.y + NODE_HEIGHT,
	)
}

pub fn target_handle(node: &Node) -> (f64, f64) {
	(node.position.x + NODE_WIDTH / 2.0, node.position.y)
}

fn contains(node: &Node, gx: f64, gy: f64) -> bool {
	let p = node.position;
	gx >= p.x && gx <= p.x + NODE_WIDTH && gy >= p.y && gy <= p.y + NODE_HEIGHT
}

/// Topmost node under the point. Handles sticking out of the box count.
pub fn node_at(nodes: &[Node], gx: f64, gy: f64) -> Option<&Node> {
	nodes.iter().rev().find(|n| {
		let p = n.position;
		gx >= p.x
			&& gx <= p.x + NODE_WIDTH
			&& gy >= p.y - HANDLE_HIT_RADIUS
			&& gy <= p.y + NODE_HEIGHT + HANDLE_HIT_RADIUS
	})
}

/// Control points of the cubic curve drawn for an edge.
pub fn edge_curve(source: &Node, target: &Node) -> [(f64, f64); 4] {
	let (sx, sy) = source_handle(source);
	let (tx, ty) = target_handle(target);
	if source.id == target.id {
		return [
			(sx, sy),
			(sx + NODE_WIDTH, sy + SELF_LOOP_REACH),
			(tx + NODE_WIDTH, ty - SELF_LOOP_REACH),
			(tx, ty),
		];
	}
	let offset = ((ty - sy).abs() / 2.0).max(40.0);
	[(sx, sy), (sx, sy + offset), (tx, ty - offset), (tx, ty)]
}

pub fn bezier_point(c: &[(f64, f64); 4], t: f64) -> (f64, f64) {
	let u = 1.0 - t;
	let (a, b, d, e) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
	(
		a * c[0].0 + b * c[1].0 + d * c[2].0 + e * c[3].0,
		a * c[0].1 + b * c[1].1 + d * c[2].1 + e * c[3].1,
	)
}

fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (abx, aby) = (b.0 - a.0, b.1 - a.1);
	let len2 = abx * abx + aby * aby;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((p.0 - a.0) * abx + (p.1 - a.1) * aby) / len2).clamp(0.0, 1.0)
	};
	let (qx, qy) = (a.0 + abx * t, a.1 + aby * t);
	(p.0 - qx).hypot(p.1 - qy)
}

fn distance_to_curve(c: &[(f64, f64); 4], p: (f64, f64)) -> f64 {
	let mut prev = c[0];
	let mut best = f64::INFINITY;
	for i in 1..=BEZIER_SAMPLES {
		let next = bezier_point(c, i as f64 / BEZIER_SAMPLES as f64);
		best = best.min(distance_to_segment(p, prev, next));
		prev = next;
	}
	best
}

fn find<'a>(nodes: &'a [Node], id: &NodeId) -> Option<&'a Node> {
	nodes.iter().find(|n| &n.id == id)
}

/// Resolves a graph-space point to a source handle, node or edge, in that order.
pub fn hit_test(nodes: &[Node], edges: &[Edge], gx: f64, gy: f64) -> Option<Hit> {
	for node in nodes.iter().rev() {
		let (hx, hy) = source_handle(node);
		if (gx - hx).hypot(gy - hy) <= HANDLE_HIT_RADIUS {
			return Some(Hit::SourceHandle(node.id.clone()));
		}
		if contains(node, gx, gy) {
			return Some(Hit::Node(node.id.clone()));
		}
	}
	edges
		.iter()
		.rev()
		.find(|e| match (find(nodes, &e.source), find(nodes, &e.target)) {
			(Some(s), Some(t)) => distance_to_curve(&edge_curve(s, t), (gx, gy)) <= EDGE_HIT_DISTANCE,
			_ => false,
		})
		.map(|e| Hit::Edge(e.id.clone()))
}

pub fn graph_bounds(nodes: &[Node]) -> Option<Bounds> {
	nodes
		.iter()
		.map(|n| Bounds {
			min_x: n.position.x,
			min_y: n.position.y,
			max_x: n.position.x + NODE_WIDTH,
			max_y: n.position.y + NODE_HEIGHT,
		})
		.reduce(Bounds::union)
}

/// Changes that leave only `id` selected.
pub fn select_only_node(nodes: &[Node], edges: &[Edge], id: &NodeId) -> (Vec<NodeChange>, Vec<EdgeChange>) {
	let node_changes = nodes
		.iter()
		.filter(|n| n.selected != (&n.id == id))
		.map(|n| NodeChange::Select {
			id: n.id.clone(),
			selected: &n.id == id,
		})
		.collect();
	(node_changes, deselect_edges(edges, None))
}

/// Changes that leave only edge `id` selected.
pub fn select_only_edge(nodes: &[Node], edges: &[Edge], id: &EdgeId) -> (Vec<NodeChange>, Vec<EdgeChange>) {
	let mut edge_changes = deselect_edges(edges, Some(id));
	if edges.iter().any(|e| &e.id == id && !e.selected) {
		edge_changes.push(EdgeChange::Select {
			id: id.clone(),
			selected: true,
		});
	}
	(deselect_nodes(nodes), edge_changes)
}

pub fn clear_selection(nodes: &[Node], edges: &[Edge]) -> (Vec<NodeChange>, Vec<EdgeChange>) {
	(deselect_nodes(nodes), deselect_edges(edges, None))
}

/// Removals for everything currently selected.
pub fn remove_selected(nodes: &[Node], edges: &[Edge]) -> (Vec<NodeChange>, Vec<EdgeChange>) {
	(
		nodes
			.iter()
			.filter(|n| n.selected)
			.map(|n| NodeChange::Remove(n.id.clone()))
			.collect(),
		edges
			.iter()
			.filter(|e| e.selected)
			.map(|e| EdgeChange::Remove(e.id.clone()))
			.collect(),
	)
}

fn deselect_nodes(nodes: &[Node]) -> Vec<NodeChange> {
	nodes
		.iter()
		.filter(|n| n.selected)
		.map(|n| NodeChange::Select {
			id: n.id.clone(),
			selected: false,
		})
		.collect()
}

fn deselect_edges(edges: &[Edge], keep: Option<&EdgeId>) -> Vec<EdgeChange> {
	edges
		.iter()
		.filter(|e| e.selected && Some(&e.id) != keep)
		.map(|e| EdgeChange::Select {
			id: e.id.clone(),
			selected: false,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::TaskData;

	fn node(id: &str, x: f64, y: f64) -> Node {
		Node::new(id, Position::new(x, y), TaskData::labelled(id))
	}

	fn surface() -> SurfaceState {
		SurfaceState::new(800.0, 600.0, CanvasOptions::default())
	}

	#[test]
	fn screen_to_graph_inverts_transform() {
		let mut s = surface();
		s.transform = ViewTransform {
			x: 100.0,
			y: 50.0,
			k: 2.0,
		};
		assert_eq!(s.screen_to_graph(300.0, 250.0), (100.0, 100.0));
	}

	#[test]
	fn zoom_is_clamped_and_keeps_anchor() {
		let mut s = surface();
		let before = s.screen_to_graph(200.0, 100.0);
		s.zoom_at(200.0, 100.0, 10.0);
		assert_eq!(s.transform.k, MAX_ZOOM);
		let after = s.screen_to_graph(200.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
		s.zoom_by(0.01);
		assert_eq!(s.transform.k, MIN_ZOOM);
	}

	#[test]
	fn fit_view_centres_the_graph() {
		let mut s = surface();
		let nodes = [node("1", 100.0, 100.0), node("2", 300.0, 100.0), node("3", 500.0, 100.0)];
		s.fit_view(&nodes);
		let bounds = graph_bounds(&nodes).expect("bounds");
		let cx = (bounds.min_x + bounds.max_x) / 2.0;
		let cy = (bounds.min_y + bounds.max_y) / 2.0;
		let (gx, gy) = s.screen_to_graph(400.0, 300.0);
		assert!((gx - cx).abs() < 1e-9);
		assert!((gy - cy).abs() < 1e-9);
		assert!(s.transform.k >= MIN_ZOOM && s.transform.k <= MAX_ZOOM);
	}

	#[test]
	fn fit_view_without_nodes_resets() {
		let mut s = surface();
		s.zoom_by(1.5);
		s.fit_view(&[]);
		assert_eq!(s.transform.k, 1.0);
	}

	#[test]
	fn hit_test_prefers_handle_then_node_then_edge() {
		let nodes = [node("1", 0.0, 0.0), node("2", 0.0, 200.0)];
		let edges = [Edge::new("e1", "1", "2")];
		let (hx, hy) = source_handle(&nodes[0]);
		assert_eq!(hit_test(&nodes, &edges, hx, hy), Some(Hit::SourceHandle("1".into())));
		assert_eq!(hit_test(&nodes, &edges, 20.0, 10.0), Some(Hit::Node("1".into())));
		assert_eq!(hit_test(&nodes, &edges, hx, 120.0), Some(Hit::Edge("e1".into())));
		assert_eq!(hit_test(&nodes, &edges, 600.0, 600.0), None);
	}

	#[test]
	fn edge_curve_runs_from_source_bottom_to_target_top() {
		let (a, b) = (node("1", 0.0, 0.0), node("2", 300.0, 200.0));
		let curve = edge_curve(&a, &b);
		assert_eq!(bezier_point(&curve, 0.0), source_handle(&a));
		assert_eq!(bezier_point(&curve, 1.0), target_handle(&b));
	}

	#[test]
	fn short_press_is_a_click_long_press_is_a_drag() {
		let mut s = surface();
		s.begin_drag("1".into(), Position::new(10.0, 10.0), 50.0, 50.0);
		assert_eq!(s.drag_to(51.0, 50.0), None);
		assert_eq!(s.release(), Release::NodeClick("1".into()));

		s.begin_drag("1".into(), Position::new(10.0, 10.0), 50.0, 50.0);
		assert_eq!(s.drag_to(70.0, 60.0), Some(("1".into(), Position::new(30.0, 20.0))));
		assert_eq!(s.release(), Release::Nothing);
		assert!(!s.is_busy());
	}

	#[test]
	fn pan_release_without_movement_is_a_pane_click() {
		let mut s = surface();
		s.begin_pan(10.0, 10.0);
		assert_eq!(s.release(), Release::PaneClick);
		s.begin_pan(10.0, 10.0);
		s.pan_to(60.0, 10.0);
		assert_eq!(s.transform.x, 50.0);
		assert_eq!(s.release(), Release::Nothing);
	}

	#[test]
	fn connect_reports_pointer_in_graph_space() {
		let mut s = surface();
		s.transform.k = 2.0;
		s.begin_connect("1".into(), 0.0, 0.0);
		s.connect_to(100.0, 40.0);
		assert_eq!(
			s.release(),
			Release::Connect {
				source: "1".into(),
				x: 50.0,
				y: 20.0
			}
		);
	}

	#[test]
	fn node_at_includes_handle_slack() {
		let nodes = [node("1", 0.0, 0.0)];
		assert!(node_at(&nodes, 75.0, -4.0).is_some());
		assert!(node_at(&nodes, 75.0, -40.0).is_none());
	}

	#[test]
	fn select_only_node_flips_just_what_changed() {
		let mut nodes = vec![node("1", 0.0, 0.0), node("2", 0.0, 0.0)];
		nodes[0].selected = true;
		let mut edges = vec![Edge::new("e1", "1", "2")];
		edges[0].selected = true;
		let (n, e) = select_only_node(&nodes, &edges, &"2".into());
		assert_eq!(
			n,
			vec![
				NodeChange::Select {
					id: "1".into(),
					selected: false
				},
				NodeChange::Select {
					id: "2".into(),
					selected: true
				},
			]
		);
		assert_eq!(
			e,
			vec![EdgeChange::Select {
				id: "e1".into(),
				selected: false
			}]
		);
	}

	#[test]
	fn remove_selected_targets_selection_only() {
		let mut nodes = vec![node("1", 0.0, 0.0), node("2", 0.0, 0.0)];
		nodes[1].selected = true;
		let mut edges = vec![Edge::new("e1", "1", "2"), Edge::new("e2", "1", "1")];
		edges[0].selected = true;
		let (n, e) = remove_selected(&nodes, &edges);
		assert_eq!(n, vec![NodeChange::Remove("2".into())]);
		assert_eq!(e, vec![EdgeChange::Remove("e1".into())]);
	}
}
