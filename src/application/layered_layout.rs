// Layered graph layout - Top-to-bottom Sugiyama-style placement
//
// 1. break cycles by reversing DFS back edges
// 2. longest-path ranking, sources pulled down next to their successors
// 3. dummy vertices split edges spanning more than one rank
// 4. barycenter sweeps order each rank, keeping the order with fewest crossings
// 5. median-target passes assign x under separation constraints
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsEvent, depth_first_search};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub node_width: f64,
    pub node_height: f64,
    /// Vertical gap between ranks.
    pub rank_sep: f64,
    /// Horizontal gap between nodes of one rank.
    pub node_sep: f64,
    /// Horizontal gap next to edge bends.
    pub edge_sep: f64,
    pub order_sweeps: usize,
    pub position_passes: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            node_width: 450.0,
            node_height: 50.0,
            rank_sep: 50.0,
            node_sep: 50.0,
            edge_sep: 10.0,
            order_sweeps: 8,
            position_passes: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub key: String,
    pub width: f64,
    pub height: f64,
}

/// Center position of a laid-out node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePosition {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub nodes: Vec<NodePosition>,
}

impl Layout {
    pub fn position(&self, key: &str) -> Option<&NodePosition> {
        self.nodes.iter().find(|n| n.key == key)
    }
}

/// Working graph: real vertices first, then dummies.
struct Ranked {
    width: Vec<f64>,
    height: Vec<f64>,
    rank: Vec<usize>,
    dummy: Vec<bool>,
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
}

impl Ranked {
    fn len(&self) -> usize {
        self.rank.len()
    }

    fn push_dummy(&mut self, rank: usize) -> usize {
        self.width.push(0.0);
        self.height.push(0.0);
        self.rank.push(rank);
        self.dummy.push(true);
        self.preds.push(Vec::new());
        self.succs.push(Vec::new());
        self.len() - 1
    }

    fn link(&mut self, from: usize, to: usize) {
        self.succs[from].push(to);
        self.preds[to].push(from);
    }

    fn separation(&self, a: usize, b: usize, settings: &LayoutSettings) -> f64 {
        let gap = if self.dummy[a] || self.dummy[b] {
            settings.edge_sep
        } else {
            settings.node_sep
        };
        (self.width[a] + self.width[b]) / 2.0 + gap
    }
}

/// Lay out `nodes` top to bottom. Edges naming an unknown node and self-loops
/// do not influence placement.
pub fn layout(nodes: &[LayoutNode], edges: &[(String, String)], settings: &LayoutSettings) -> Layout {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut real: Vec<&LayoutNode> = Vec::new();
    for node in nodes {
        if index.contains_key(node.key.as_str()) {
            tracing::warn!("Duplicate layout node '{}' ignored", node.key);
            continue;
        }
        index.insert(node.key.as_str(), real.len());
        real.push(node);
    }
    if real.is_empty() {
        return Layout::default();
    }

    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let handles: Vec<NodeIndex> = (0..real.len()).map(|i| graph.add_node(i)).collect();
    let mut seen = HashSet::new();
    for (source, target) in edges {
        match (index.get(source.as_str()), index.get(target.as_str())) {
            (Some(&s), Some(&t)) if s != t => {
                if seen.insert((s, t)) {
                    graph.add_edge(handles[s], handles[t], ());
                }
            }
            (Some(_), Some(_)) => tracing::debug!("Ignoring self-loop on '{}'", source),
            _ => tracing::debug!("Ignoring edge {}->{} with unknown endpoint", source, target),
        }
    }

    let dag = break_cycles(&graph);
    let ranks = assign_ranks(&dag);
    let mut ranked = Ranked {
        width: real.iter().map(|n| n.width).collect(),
        height: real.iter().map(|n| n.height).collect(),
        rank: ranks,
        dummy: vec![false; real.len()],
        preds: vec![Vec::new(); real.len()],
        succs: vec![Vec::new(); real.len()],
    };
    split_long_edges(&dag, &mut ranked);

    let initial = initial_order(&ranked, real.len());
    let layers = order_layers(initial, &ranked, settings.order_sweeps);
    let xs = assign_x(&layers, &ranked, settings);

    let mut rank_height = vec![0.0_f64; layers.len()];
    for v in 0..ranked.len() {
        rank_height[ranked.rank[v]] = rank_height[ranked.rank[v]].max(ranked.height[v]);
    }
    let mut rank_y = Vec::with_capacity(layers.len());
    let mut cursor = 0.0;
    for h in &rank_height {
        rank_y.push(cursor + h / 2.0);
        cursor += h + settings.rank_sep;
    }

    let left = (0..ranked.len())
        .map(|v| xs[v] - ranked.width[v] / 2.0)
        .fold(f64::INFINITY, f64::min);

    let positioned = real
        .iter()
        .enumerate()
        .map(|(v, node)| NodePosition {
            key: node.key.clone(),
            x: xs[v] - left,
            y: rank_y[ranked.rank[v]],
            width: node.width,
            height: node.height,
        })
        .collect();

    Layout { nodes: positioned }
}

/// Reverse every DFS back edge so the remaining graph is acyclic.
fn break_cycles(graph: &DiGraph<usize, ()>) -> DiGraph<usize, ()> {
    let mut back_edges = HashSet::new();
    depth_first_search(graph, graph.node_indices(), |event| {
        if let DfsEvent::BackEdge(u, v) = event {
            back_edges.insert((u, v));
        }
    });
    if !back_edges.is_empty() {
        tracing::debug!("Reversing {} back edges before ranking", back_edges.len());
    }

    let mut dag: DiGraph<usize, ()> = DiGraph::new();
    for idx in graph.node_indices() {
        dag.add_node(graph[idx]);
    }
    let mut seen = HashSet::new();
    for edge in graph.raw_edges() {
        let (u, v) = (edge.source(), edge.target());
        let (from, to) = if back_edges.contains(&(u, v)) { (v, u) } else { (u, v) };
        if seen.insert((from, to)) {
            dag.add_edge(from, to, ());
        }
    }
    dag
}

/// Longest-path ranks, sources tightened against their successors, then
/// compacted so used ranks are consecutive from 0.
fn assign_ranks(dag: &DiGraph<usize, ()>) -> Vec<usize> {
    let order: Vec<NodeIndex> = match toposort(dag, None) {
        Ok(order) => order,
        Err(cycle) => {
            tracing::warn!("Layout graph still cyclic at {:?}; ranking in insertion order", cycle.node_id());
            dag.node_indices().collect()
        }
    };

    let mut rank = vec![0usize; dag.node_count()];
    for &v in &order {
        let r = dag
            .neighbors_directed(v, petgraph::Direction::Incoming)
            .map(|u| rank[u.index()] + 1)
            .max()
            .unwrap_or(0);
        rank[v.index()] = r;
    }

    for &v in order.iter().rev() {
        let has_preds = dag.neighbors_directed(v, petgraph::Direction::Incoming).next().is_some();
        if has_preds {
            continue;
        }
        if let Some(min_succ) = dag
            .neighbors_directed(v, petgraph::Direction::Outgoing)
            .map(|w| rank[w.index()])
            .min()
        {
            rank[v.index()] = min_succ - 1;
        }
    }

    let mut used: Vec<usize> = rank.clone();
    used.sort_unstable();
    used.dedup();
    rank.iter()
        .map(|r| used.binary_search(r).unwrap_or(0))
        .collect()
}

fn split_long_edges(dag: &DiGraph<usize, ()>, ranked: &mut Ranked) {
    for edge in dag.raw_edges() {
        let (u, v) = (edge.source().index(), edge.target().index());
        let mut prev = u;
        for r in ranked.rank[u] + 1..ranked.rank[v] {
            let dummy = ranked.push_dummy(r);
            ranked.link(prev, dummy);
            prev = dummy;
        }
        ranked.link(prev, v);
    }
}

/// Ranks filled in DFS discovery order from the real vertices, shallowest first.
fn initial_order(ranked: &Ranked, real_count: usize) -> Vec<Vec<usize>> {
    let layer_count = ranked.rank.iter().copied().max().map_or(0, |m| m + 1);
    let mut layers = vec![Vec::new(); layer_count];
    let mut visited = vec![false; ranked.len()];

    let mut starts: Vec<usize> = (0..real_count).collect();
    starts.sort_by_key(|&v| ranked.rank[v]);

    for start in starts.into_iter().chain(real_count..ranked.len()) {
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            if visited[v] {
                continue;
            }
            visited[v] = true;
            layers[ranked.rank[v]].push(v);
            for &w in ranked.succs[v].iter().rev() {
                if !visited[w] {
                    stack.push(w);
                }
            }
        }
    }

    layers
}

fn positions(layers: &[Vec<usize>], size: usize) -> Vec<usize> {
    let mut pos = vec![0; size];
    for layer in layers {
        for (i, &v) in layer.iter().enumerate() {
            pos[v] = i;
        }
    }
    pos
}

/// Edge crossings between every pair of adjacent ranks.
fn count_crossings(layers: &[Vec<usize>], ranked: &Ranked) -> usize {
    let pos = &positions(layers, ranked.len());
    let mut total = 0;
    for layer in layers {
        let edges: Vec<(usize, usize)> = layer
            .iter()
            .flat_map(|&u| ranked.succs[u].iter().map(move |&w| (pos[u], pos[w])))
            .collect();
        for (i, &(a, b)) in edges.iter().enumerate() {
            for &(c, d) in &edges[i + 1..] {
                if (a < c && b > d) || (a > c && b < d) {
                    total += 1;
                }
            }
        }
    }
    total
}

fn order_layers(initial: Vec<Vec<usize>>, ranked: &Ranked, sweeps: usize) -> Vec<Vec<usize>> {
    let mut best_crossings = count_crossings(&initial, ranked);
    let mut best = initial.clone();
    let mut layers = initial;

    for sweep in 0..sweeps {
        if best_crossings == 0 {
            break;
        }
        let downward = sweep % 2 == 0;
        let indices: Vec<usize> = if downward {
            (1..layers.len()).collect()
        } else {
            (0..layers.len().saturating_sub(1)).rev().collect()
        };

        for l in indices {
            let pos = positions(&layers, ranked.len());
            let mut keyed: Vec<(f64, usize)> = layers[l]
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let neighbors = if downward { &ranked.preds[v] } else { &ranked.succs[v] };
                    let key = if neighbors.is_empty() {
                        i as f64
                    } else {
                        neighbors.iter().map(|&n| pos[n] as f64).sum::<f64>() / neighbors.len() as f64
                    };
                    (key, v)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            layers[l] = keyed.into_iter().map(|(_, v)| v).collect();
        }

        let crossings = count_crossings(&layers, ranked);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        }
    }

    best
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Closest placement to `desired` that keeps order and separation: the mean
/// of the left-packed and right-packed solutions.
fn place_layer(layer: &[usize], desired: &[f64], ranked: &Ranked, settings: &LayoutSettings, xs: &mut [f64]) {
    let n = layer.len();
    if n == 0 {
        return;
    }
    let mut left = desired.to_vec();
    for i in 1..n {
        left[i] = left[i].max(left[i - 1] + ranked.separation(layer[i - 1], layer[i], settings));
    }
    let mut right = desired.to_vec();
    for i in (0..n - 1).rev() {
        right[i] = right[i].min(right[i + 1] - ranked.separation(layer[i], layer[i + 1], settings));
    }
    for i in 0..n {
        xs[layer[i]] = (left[i] + right[i]) / 2.0;
    }
}

fn assign_x(layers: &[Vec<usize>], ranked: &Ranked, settings: &LayoutSettings) -> Vec<f64> {
    let mut xs = vec![0.0; ranked.len()];

    for layer in layers {
        let mut cursor = 0.0;
        for (i, &v) in layer.iter().enumerate() {
            if i > 0 {
                cursor += ranked.separation(layer[i - 1], v, settings);
            }
            xs[v] = cursor;
        }
        let shift = cursor / 2.0;
        for &v in layer {
            xs[v] -= shift;
        }
    }

    for _ in 0..settings.position_passes {
        for downward in [true, false] {
            let indices: Vec<usize> = if downward {
                (1..layers.len()).collect()
            } else {
                (0..layers.len().saturating_sub(1)).rev().collect()
            };
            for l in indices {
                let desired: Vec<f64> = layers[l]
                    .iter()
                    .map(|&v| {
                        let neighbors = if downward { &ranked.preds[v] } else { &ranked.succs[v] };
                        let mut targets: Vec<f64> = neighbors.iter().map(|&n| xs[n]).collect();
                        median(&mut targets).unwrap_or(xs[v])
                    })
                    .collect();
                place_layer(&layers[l], &desired, ranked, settings, &mut xs);
            }
        }
    }

    xs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(keys: &[&str]) -> Vec<LayoutNode> {
        keys.iter()
            .map(|k| LayoutNode {
                key: k.to_string(),
                width: 450.0,
                height: 50.0,
            })
            .collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(s, t)| (s.to_string(), t.to_string())).collect()
    }

    fn overlaps(a: &NodePosition, b: &NodePosition) -> bool {
        (a.x - b.x).abs() < (a.width + b.width) / 2.0 && (a.y - b.y).abs() < (a.height + b.height) / 2.0
    }

    #[test]
    fn test_chain_stacks_vertically() {
        let layout = layout(&nodes(&["1", "2", "3"]), &edges(&[("1", "2"), ("2", "3")]), &LayoutSettings::default());

        let ys: Vec<f64> = layout.nodes.iter().map(|n| n.y).collect();
        assert_eq!(ys, vec![25.0, 125.0, 225.0]);
        assert!(layout.nodes.iter().all(|n| (n.x - 225.0).abs() < 1e-9));
        assert!(layout.nodes.iter().all(|n| n.x - n.width / 2.0 == 0.0));
    }

    #[test]
    fn test_diamond_separates_siblings_and_centers_parent() {
        let layout = layout(
            &nodes(&["1", "2", "3", "4"]),
            &edges(&[("1", "2"), ("1", "3"), ("2", "4"), ("3", "4")]),
            &LayoutSettings::default(),
        );

        let p = |k: &str| layout.position(k).unwrap().clone();
        assert_eq!(p("1").y, 25.0);
        assert_eq!(p("2").y, 125.0);
        assert_eq!(p("3").y, 125.0);
        assert_eq!(p("4").y, 225.0);
        assert!((p("2").x - p("3").x).abs() >= 500.0 - 1e-9);
        assert!((p("1").x - (p("2").x + p("3").x) / 2.0).abs() < 1e-6);
        assert!((p("4").x - p("1").x).abs() < 1e-6);
    }

    #[test]
    fn test_no_overlaps_and_non_negative_corner() {
        let keys = ["1", "2", "3", "4", "5", "6", "7"];
        let layout = layout(
            &nodes(&keys),
            &edges(&[("1", "3"), ("2", "3"), ("3", "4"), ("3", "5"), ("1", "6"), ("5", "7"), ("6", "7")]),
            &LayoutSettings::default(),
        );

        for (i, a) in layout.nodes.iter().enumerate() {
            assert!(a.x - a.width / 2.0 >= -1e-9);
            assert!(a.y - a.height / 2.0 >= -1e-9);
            for b in &layout.nodes[i + 1..] {
                assert!(!overlaps(a, b), "{} overlaps {}", a.key, b.key);
            }
        }
    }

    #[test]
    fn test_sources_are_pulled_next_to_successor() {
        let layout = layout(
            &nodes(&["1", "2", "3", "late"]),
            &edges(&[("1", "2"), ("2", "3"), ("late", "3")]),
            &LayoutSettings::default(),
        );

        assert_eq!(layout.position("late").unwrap().y, layout.position("2").unwrap().y);
    }

    #[test]
    fn test_cycles_and_unknown_endpoints_are_tolerated() {
        let layout = layout(
            &nodes(&["a", "b"]),
            &edges(&[("a", "b"), ("b", "a"), ("a", "a"), ("ghost", "b")]),
            &LayoutSettings::default(),
        );

        assert_eq!(layout.nodes.len(), 2);
        assert_ne!(layout.position("a").unwrap().y, layout.position("b").unwrap().y);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let n = nodes(&["1", "2", "3", "4", "5"]);
        let e = edges(&[("1", "4"), ("2", "3"), ("1", "3"), ("3", "5"), ("4", "5")]);

        assert_eq!(layout(&n, &e, &LayoutSettings::default()), layout(&n, &e, &LayoutSettings::default()));
    }

    #[test]
    fn test_ordering_removes_avoidable_crossing() {
        // a -> y, b -> x drawn with x before y crosses once.
        let mut ranked = Ranked {
            width: vec![1.0; 4],
            height: vec![1.0; 4],
            rank: vec![0, 0, 1, 1],
            dummy: vec![false; 4],
            preds: vec![Vec::new(); 4],
            succs: vec![Vec::new(); 4],
        };
        ranked.link(0, 3);
        ranked.link(1, 2);

        let crossed = vec![vec![0, 1], vec![2, 3]];
        assert_eq!(count_crossings(&crossed, &ranked), 1);

        let ordered = order_layers(crossed, &ranked, 4);
        assert_eq!(count_crossings(&ordered, &ranked), 0);
    }

    #[test]
    fn test_empty_graph() {
        assert_eq!(layout(&[], &[], &LayoutSettings::default()), Layout::default());
    }
}
