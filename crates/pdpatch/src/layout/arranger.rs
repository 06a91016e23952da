//! Depth-first auto-arranger.
//!
//! Each canvas is arranged on its own, deepest canvases first. The nodes
//! lacking a position become the vertices of a directed graph whose edges
//! are the connections between them. Starting from every unplaced vertex
//! in creation order, the arranger places a node at the cursor, moves the
//! cursor one row down and then visits the node's successors sorted by
//! outlet. A successor reached through outlet `k > 0` shares the row of its
//! parent and is shifted `k` columns to the right, or one column past the
//! previous such sibling when that one already sits further right.
//!
//! A successor that is already placed is not moved to the cursor. Instead
//! one of the two nodes is nudged:
//!
//! - when the two nodes connect both ways, the parent moves one column to
//!   the right of the child;
//! - when they sit on different rows, the node on the later row takes the
//!   column of the other one;
//! - otherwise the child moves one row down.
//!
//! Column and row sizes are the largest estimated node width and height of
//! the canvas, scaled by the horizontal and vertical steps. The traversal
//! uses an explicit stack, so long chains of connections cannot exhaust
//! the call stack, and every choice follows node and connection order, so
//! the result is the same on every run.

use std::collections::HashMap;

use log::{debug, trace};
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

use pdpatch_core::{
    geometry::{Point, Size},
    model::{Canvas, CanvasId, Patch},
};

use crate::config::ArrangeConfig;

/// Edge weight: the outlet of the connection and its position in the
/// canvas connection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Link {
    outlet: u32,
    order: usize,
}

/// A node waiting on the work stack, with the parent and outlet it was
/// reached through.
#[derive(Debug, Clone, Copy)]
struct Step {
    node: NodeIndex,
    from: Option<(NodeIndex, u32)>,
}

/// Placement state of one canvas.
struct Placement {
    /// Width of one column.
    column: f32,
    /// Height of one row.
    row: f32,
    cursor: Point,
    /// Lowest row used so far.
    lowest: Option<f32>,
    positions: Vec<Option<Point>>,
    /// Rightmost x taken on a parent's row by its outlet `k > 0` children.
    fanned: Vec<Option<f32>>,
}

impl Placement {
    fn position(&self, node: NodeIndex) -> Option<Point> {
        self.positions[node.index()]
    }

    fn set(&mut self, node: NodeIndex, position: Point) {
        self.positions[node.index()] = Some(position);
        self.lowest = Some(self.lowest.map_or(position.y(), |y| y.max(position.y())));
    }

    /// The row below everything placed so far.
    fn next_row(&self, margin: Point) -> f32 {
        self.lowest.map_or(margin.y(), |y| y + self.row)
    }

    /// The x of the next child placed on the row of `parent` through
    /// `outlet`.
    fn fan_out(&mut self, parent: NodeIndex, origin: Point, outlet: u32) -> f32 {
        let base = origin.x() + self.column * outlet as f32;
        let x = self.fanned[parent.index()].map_or(base, |last| base.max(last + self.column));
        self.fanned[parent.index()] = Some(x);
        x
    }
}

/// Assigns positions to nodes that have none.
///
/// # Examples
///
/// ```
/// # use pdpatch::{config::ArrangeConfig, layout::Arranger};
/// # use pdpatch_core::model::{Connection, NodeKind, Object, Patch};
/// let mut patch = Patch::new("chain").unwrap();
/// let root = patch.root_mut();
/// let a = root.add_node(NodeKind::Object(Object::new("bang", Vec::<String>::new())), None);
/// let b = root.add_node(NodeKind::Object(Object::new("print", Vec::<String>::new())), None);
/// root.connect(Connection::new(a, 0, b, 0));
///
/// Arranger::new(&ArrangeConfig::default()).arrange(&mut patch);
///
/// let nodes = patch.root().nodes();
/// assert!(nodes[1].position().unwrap().y() > nodes[0].position().unwrap().y());
/// ```
#[derive(Debug, Clone)]
pub struct Arranger {
    hstep: f32,
    vstep: f32,
    margin: Point,
    force: bool,
}

impl Arranger {
    pub fn new(config: &ArrangeConfig) -> Self {
        Self {
            hstep: config.hstep(),
            vstep: config.vstep(),
            margin: Point::new(config.margin_x(), config.margin_y()),
            force: config.force(),
        }
    }

    /// Arrange every canvas of the patch, deepest canvases first.
    ///
    /// Returns the number of nodes that received a position.
    pub fn arrange(&self, patch: &mut Patch) -> usize {
        let labels: HashMap<CanvasId, String> = patch
            .canvases()
            .map(|(id, canvas)| (id, subpatch_label(canvas)))
            .collect();

        let mut placed = 0;
        for id in patch.preorder().into_iter().rev() {
            if let Some(canvas) = patch.canvas_mut(id) {
                let count = self.arrange_canvas(canvas, &labels);
                debug!(canvas:% = id, placed = count; "Canvas arranged");
                placed += count;
            }
        }
        placed
    }

    /// Arrange the nodes of one canvas. `labels` holds the box text of the
    /// subpatches the canvas contains.
    pub fn arrange_canvas(
        &self,
        canvas: &mut Canvas,
        labels: &HashMap<CanvasId, String>,
    ) -> usize {
        if self.force {
            for node in canvas.nodes_mut() {
                node.clear_position();
            }
        }

        let font = canvas.font();
        let largest = canvas
            .nodes()
            .iter()
            .filter(|node| node.kind().has_position())
            .map(|node| {
                let label = node.subpatch().and_then(|id| labels.get(&id));
                node.estimated_size(font, label.map(String::as_str))
            })
            .fold(Size::default(), Size::max);

        let mut graph = DiGraph::<usize, Link>::new();
        let mut vertices = HashMap::new();
        let mut lowest: Option<f32> = None;
        for (index, node) in canvas.nodes().iter().enumerate() {
            if !node.kind().has_position() {
                continue;
            }
            match node.position() {
                Some(position) => {
                    lowest = Some(lowest.map_or(position.y(), |y| y.max(position.y())));
                }
                None => {
                    vertices.insert(node.id(), graph.add_node(index));
                }
            }
        }
        for (order, connection) in canvas.connections().iter().enumerate() {
            let (Some(&source), Some(&sink)) = (
                vertices.get(&connection.source()),
                vertices.get(&connection.sink()),
            ) else {
                continue;
            };
            if source != sink {
                let outlet = connection.outlet();
                graph.add_edge(source, sink, Link { outlet, order });
            }
        }

        let mut placement = Placement {
            column: largest.width() * self.hstep,
            row: largest.height() * self.vstep,
            cursor: self.margin,
            lowest,
            positions: vec![None; graph.node_count()],
            fanned: vec![None; graph.node_count()],
        };
        self.place(&graph, &mut placement);

        let nodes = canvas.nodes_mut();
        for vertex in graph.node_indices() {
            if let Some(position) = placement.position(vertex) {
                nodes[graph[vertex]].set_position(position);
            }
        }

        for comment in canvas.comments_mut() {
            if comment.position().is_none() {
                let position = Point::new(self.margin.x(), placement.next_row(self.margin));
                comment.set_position(position);
                placement.lowest = Some(position.y());
            }
        }

        graph.node_count()
    }

    fn place(&self, graph: &DiGraph<usize, Link>, placement: &mut Placement) {
        let mut stack = Vec::new();
        for root in graph.node_indices() {
            if placement.position(root).is_some() {
                continue;
            }
            placement.cursor = Point::new(self.margin.x(), placement.next_row(self.margin));
            stack.push(Step {
                node: root,
                from: None,
            });

            while let Some(step) = stack.pop() {
                if placement.position(step.node).is_some() {
                    if let Some((parent, _)) = step.from {
                        relocate(graph, placement, parent, step.node);
                    }
                    continue;
                }

                if let Some((parent, outlet)) = step.from {
                    let Some(origin) = placement.position(parent) else {
                        continue;
                    };
                    placement.cursor = if outlet == 0 {
                        placement.cursor.with_x(origin.x())
                    } else {
                        let x = placement.fan_out(parent, origin, outlet);
                        Point::new(x, origin.y())
                    };
                }

                let position = placement.cursor;
                trace!(node = graph[step.node], x = position.x(), y = position.y(); "Node placed");
                placement.set(step.node, position);
                placement.cursor = position.with_y(position.y() + placement.row);

                let mut successors: Vec<(Link, NodeIndex)> = graph
                    .edges_directed(step.node, Direction::Outgoing)
                    .map(|edge| (*edge.weight(), edge.target()))
                    .collect();
                successors.sort();
                for (link, child) in successors.into_iter().rev() {
                    stack.push(Step {
                        node: child,
                        from: Some((step.node, link.outlet)),
                    });
                }
            }
        }
    }
}

/// Nudge one of two placed nodes connected `parent -> child`.
fn relocate(
    graph: &DiGraph<usize, Link>,
    placement: &mut Placement,
    parent: NodeIndex,
    child: NodeIndex,
) {
    let (Some(from), Some(to)) = (placement.position(parent), placement.position(child)) else {
        return;
    };
    if graph.contains_edge(child, parent) {
        placement.set(parent, from.with_x(to.x() + placement.column));
    } else if (from.y() - to.y()).abs() > f32::EPSILON {
        if to.y() > from.y() {
            placement.set(child, to.with_x(from.x()));
        } else {
            placement.set(parent, from.with_x(to.x()));
        }
    } else {
        placement.set(child, to.with_y(to.y() + placement.row));
    }
    trace!(parent = graph[parent], child = graph[child]; "Placed node relocated");
}

/// The box text of a subpatch node.
fn subpatch_label(canvas: &Canvas) -> String {
    canvas
        .title_text()
        .unwrap_or_else(|| format!("pd {}", canvas.name()))
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use pdpatch_core::model::{Comment, Connection, NodeKind, Object, ScalarInstance};

    use super::*;

    fn object(class: &str) -> NodeKind {
        NodeKind::Object(Object::new(class, Vec::<String>::new()))
    }

    fn arranger() -> Arranger {
        Arranger::new(&ArrangeConfig::default())
    }

    fn positions(canvas: &Canvas) -> Vec<Point> {
        canvas
            .nodes()
            .iter()
            .map(|node| node.position().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_chain_moves_down() {
        let mut patch = Patch::new("chain").unwrap();
        let root = patch.root_mut();
        let a = root.add_node(object("loadbang"), None);
        let b = root.add_node(object("t b b"), None);
        let c = root.add_node(object("print"), None);
        root.connect(Connection::new(a, 0, b, 0));
        root.connect(Connection::new(b, 0, c, 0));

        assert_eq!(arranger().arrange(&mut patch), 3);

        let [a, b, c] = positions(patch.root())[..] else {
            panic!("Expected three nodes");
        };
        assert_approx_eq!(f32, a.x(), 10.0);
        assert_approx_eq!(f32, a.y(), 10.0);
        assert!(b.y() > a.y());
        assert!(c.y() > b.y());
        assert_approx_eq!(f32, b.x(), a.x());
    }

    #[test]
    fn test_outlet_fans_out_on_parent_row() {
        let mut patch = Patch::new("fan").unwrap();
        let root = patch.root_mut();
        let source = root.add_node(object("t b b"), None);
        let left = root.add_node(object("f"), None);
        let right = root.add_node(object("f"), None);
        root.connect(Connection::new(source, 1, right, 0));
        root.connect(Connection::new(source, 0, left, 0));

        arranger().arrange(&mut patch);

        let [source, left, right] = positions(patch.root())[..] else {
            panic!("Expected three nodes");
        };
        assert!(left.y() > source.y());
        assert_approx_eq!(f32, left.x(), source.x());
        assert_approx_eq!(f32, right.y(), source.y());
        assert!(right.x() > source.x());
    }

    #[test]
    fn test_siblings_on_one_outlet_do_not_overlap() {
        let mut patch = Patch::new("fan").unwrap();
        let root = patch.root_mut();
        let source = root.add_node(object("t b b"), None);
        let first = root.add_node(object("print a"), None);
        let second = root.add_node(object("print b"), None);
        root.connect(Connection::new(source, 1, first, 0));
        root.connect(Connection::new(source, 1, second, 0));

        arranger().arrange(&mut patch);

        let [source, first, second] = positions(patch.root())[..] else {
            panic!("Expected three nodes");
        };
        assert_approx_eq!(f32, first.y(), source.y());
        assert_approx_eq!(f32, second.y(), source.y());
        assert!(first.x() > source.x());
        assert!(second.x() > first.x());
    }

    #[test]
    fn test_later_row_parent_takes_child_column() {
        let mut patch = Patch::new("merge").unwrap();
        let root = patch.root_mut();
        let a = root.add_node(object("t b b"), None);
        let c = root.add_node(object("print"), None);
        let b = root.add_node(object("bang"), None);
        root.connect(Connection::new(a, 1, c, 0));
        root.connect(Connection::new(b, 0, c, 0));

        arranger().arrange(&mut patch);

        let [a, c, b] = positions(patch.root())[..] else {
            panic!("Expected three nodes");
        };
        assert_approx_eq!(f32, c.y(), a.y());
        assert!(c.x() > a.x());
        // b starts a new row at the margin, then moves under c
        assert!(b.y() > c.y());
        assert_approx_eq!(f32, b.x(), c.x());
    }

    #[test]
    fn test_later_row_child_takes_parent_column() {
        let mut patch = Patch::new("cross").unwrap();
        let root = patch.root_mut();
        let a = root.add_node(object("t b b"), None);
        let c = root.add_node(object("print"), None);
        let p = root.add_node(object("f"), None);
        root.connect(Connection::new(a, 0, c, 0));
        root.connect(Connection::new(a, 1, p, 0));
        root.connect(Connection::new(p, 0, c, 1));

        arranger().arrange(&mut patch);

        let [a, c, p] = positions(patch.root())[..] else {
            panic!("Expected three nodes");
        };
        assert_approx_eq!(f32, p.y(), a.y());
        assert!(p.x() > a.x());
        assert!(c.y() > a.y());
        assert_approx_eq!(f32, c.x(), p.x());
    }

    #[test]
    fn test_same_row_child_moves_down() {
        let mut patch = Patch::new("row").unwrap();
        let root = patch.root_mut();
        let a = root.add_node(object("t b b b"), None);
        let x = root.add_node(object("f"), None);
        let y = root.add_node(object("f"), None);
        root.connect(Connection::new(a, 1, x, 0));
        root.connect(Connection::new(a, 2, y, 0));
        root.connect(Connection::new(y, 0, x, 1));

        arranger().arrange(&mut patch);

        let [a, x, y] = positions(patch.root())[..] else {
            panic!("Expected three nodes");
        };
        assert_approx_eq!(f32, y.y(), a.y());
        assert!(x.y() > a.y());
        assert!(x.x() > a.x());
        assert!(x.x() < y.x());
    }

    #[test]
    fn test_two_cycle_moves_parent_right() {
        let mut patch = Patch::new("loop").unwrap();
        let root = patch.root_mut();
        let a = root.add_node(object("f"), None);
        let b = root.add_node(object("+ 1"), None);
        root.connect(Connection::new(a, 0, b, 0));
        root.connect(Connection::new(b, 0, a, 1));

        arranger().arrange(&mut patch);

        let [a, b] = positions(patch.root())[..] else {
            panic!("Expected two nodes");
        };
        assert!(b.y() > a.y());
        assert!(b.x() > a.x());
    }

    #[test]
    fn test_existing_positions_are_kept() {
        let mut patch = Patch::new("kept").unwrap();
        let root = patch.root_mut();
        let a = root.add_node(object("osc~ 440"), Some(Point::new(100.0, 200.0)));
        let b = root.add_node(object("dac~"), None);
        root.connect(Connection::new(a, 0, b, 0));

        assert_eq!(arranger().arrange(&mut patch), 1);

        let [a, b] = positions(patch.root())[..] else {
            panic!("Expected two nodes");
        };
        assert_approx_eq!(f32, a.x(), 100.0);
        assert_approx_eq!(f32, a.y(), 200.0);
        assert!(b.y() > a.y());
    }

    #[test]
    fn test_force_discards_positions() {
        let mut patch = Patch::new("forced").unwrap();
        patch
            .root_mut()
            .add_node(object("osc~"), Some(Point::new(300.0, 300.0)));

        let config = ArrangeConfig::default().with_force(true);
        assert_eq!(Arranger::new(&config).arrange(&mut patch), 1);

        let position = patch.root().nodes()[0].position().unwrap();
        assert_approx_eq!(f32, position.x(), 10.0);
        assert_approx_eq!(f32, position.y(), 10.0);
    }

    #[test]
    fn test_scalars_and_comments() {
        let mut patch = Patch::new("misc").unwrap();
        let root = patch.root_mut();
        root.add_node(NodeKind::Scalar(ScalarInstance::new("t", None)), None);
        root.add_node(object("f"), None);
        root.add_comment(Comment::new(None, vec!["note".to_string()]));
        root.add_comment(Comment::new(Some(Point::new(5.0, 5.0)), vec!["kept".to_string()]));

        arranger().arrange(&mut patch);

        let root = patch.root();
        assert!(root.nodes()[0].position().is_none());
        let node = root.nodes()[1].position().unwrap();
        let note = root.comments()[0].position().unwrap();
        assert!(note.y() > node.y());
        assert_approx_eq!(f32, root.comments()[1].position().unwrap().x(), 5.0);
    }

    #[test]
    fn test_nested_canvases() {
        let mut patch = Patch::new("outer").unwrap();
        let sub =
            Canvas::subpatch("inner", Point::default(), Size::new(300.0, 200.0), true).unwrap();
        let (inner, _) = patch.add_subpatch(CanvasId::ROOT, sub, None).unwrap();
        let canvas = patch.canvas_mut(inner).unwrap();
        let a = canvas.add_node(object("inlet"), None);
        let b = canvas.add_node(object("outlet"), None);
        canvas.connect(Connection::new(a, 0, b, 0));

        assert_eq!(arranger().arrange(&mut patch), 3);
        assert!(patch.root().nodes()[0].position().is_some());
        let nodes = patch.canvas(inner).unwrap().nodes();
        assert!(nodes[1].position().unwrap().y() > nodes[0].position().unwrap().y());
    }

    #[test]
    fn test_long_chain() {
        let mut patch = Patch::new("long").unwrap();
        let root = patch.root_mut();
        let mut previous = root.add_node(object("f"), None);
        for _ in 0..10_000 {
            let next = root.add_node(object("+ 1"), None);
            root.connect(Connection::new(previous, 0, next, 0));
            previous = next;
        }

        assert_eq!(arranger().arrange(&mut patch), 10_001);
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        // =====================================================================
        // Strategies
        // =====================================================================

        fn connections_strategy() -> impl Strategy<Value = (usize, Vec<(usize, u32, usize)>)> {
            (1usize..12).prop_flat_map(|count| {
                (
                    Just(count),
                    prop::collection::vec((0..count, 0u32..3, 0..count), 0..24),
                )
            })
        }

        fn build(count: usize, edges: &[(usize, u32, usize)]) -> Patch {
            let mut patch = Patch::new("random").unwrap();
            let root = patch.root_mut();
            for index in 0..count {
                root.add_node(object(&format!("node{index}")), None);
            }
            for &(source, outlet, sink) in edges {
                root.connect(Connection::new(source, outlet, sink, 0));
            }
            patch
        }

        // =====================================================================
        // Checks
        // =====================================================================

        fn check_determinism(count: usize, edges: &[(usize, u32, usize)]) {
            let mut first = build(count, edges);
            let mut second = build(count, edges);
            arranger().arrange(&mut first);
            arranger().arrange(&mut second);

            let first = positions(first.root());
            let second = positions(second.root());
            for (a, b) in first.iter().zip(&second) {
                assert_eq!(a.x().to_bits(), b.x().to_bits());
                assert_eq!(a.y().to_bits(), b.y().to_bits());
            }
        }

        fn check_every_node_placed(count: usize, edges: &[(usize, u32, usize)]) {
            let mut patch = build(count, edges);
            assert_eq!(arranger().arrange(&mut patch), count);
            assert!(patch.root().nodes().iter().all(|node| node.position().is_some()));
        }

        // =====================================================================
        // Properties
        // =====================================================================

        proptest! {
            #[test]
            fn arranger_is_deterministic((count, edges) in connections_strategy()) {
                check_determinism(count, &edges);
            }

            #[test]
            fn arranger_places_every_node((count, edges) in connections_strategy()) {
                check_every_node_placed(count, &edges);
            }
        }
    }
}
