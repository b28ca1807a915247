//! Annotated graph adapter traits.
//!
//! The walk never owns the graph: it only needs, for a node, its outgoing neighbors, and
//! for an ordered pair, the feature records on that edge.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

/// A named, weighted feature attached to one directed edge.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Feature {
    pub name: String,
    pub weight: f64,
}

impl Feature {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self { name: name.into(), weight }
    }
}

/// A directed graph whose edges carry feature lists.
///
/// Node ids are opaque; they only need a total order (distributions are ordered maps, so
/// diagnostics and floating-point accumulation order are reproducible).
pub trait FeatureGraph {
    type Node: Ord + Clone + Debug;

    /// Outgoing neighbors of `node`. Empty for unknown nodes.
    fn neighbors(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Features on the edge `source -> target`. Empty if there is no such edge.
    fn features(&self, source: &Self::Node, target: &Self::Node) -> &[Feature];

    /// Every feature name appearing on any edge.
    fn feature_names(&self) -> BTreeSet<String>;

    fn out_degree(&self, node: &Self::Node) -> usize {
        self.neighbors(node).len()
    }
}

/// In-memory adjacency map: `source -> target -> features`.
#[derive(Debug, Clone)]
pub struct AnnotatedGraph<N> {
    adj: BTreeMap<N, BTreeMap<N, Vec<Feature>>>,
}

impl<N: Ord + Clone> Default for AnnotatedGraph<N> {
    fn default() -> Self {
        Self { adj: BTreeMap::new() }
    }
}

impl<N: Ord + Clone> AnnotatedGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) the edge `source -> target` with `features`.
    ///
    /// Calling this twice for the same pair appends to the existing feature list.
    pub fn add_edge(&mut self, source: N, target: N, features: impl IntoIterator<Item = Feature>) {
        self.adj
            .entry(source)
            .or_default()
            .entry(target)
            .or_default()
            .extend(features);
    }

    /// Builder-style variant of [`AnnotatedGraph::add_edge`].
    pub fn with_edge(mut self, source: N, target: N, features: impl IntoIterator<Item = Feature>) -> Self {
        self.add_edge(source, target, features);
        self
    }

    pub fn edge_count(&self) -> usize {
        self.adj.values().map(BTreeMap::len).sum()
    }
}

impl<N: Ord + Clone + Debug> FeatureGraph for AnnotatedGraph<N> {
    type Node = N;

    fn neighbors(&self, node: &N) -> Vec<N> {
        self.adj
            .get(node)
            .map(|out| out.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn features(&self, source: &N, target: &N) -> &[Feature] {
        self.adj
            .get(source)
            .and_then(|out| out.get(target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn feature_names(&self) -> BTreeSet<String> {
        self.adj
            .values()
            .flat_map(BTreeMap::values)
            .flatten()
            .map(|f| f.name.clone())
            .collect()
    }

    fn out_degree(&self, node: &N) -> usize {
        self.adj.get(node).map_or(0, BTreeMap::len)
    }
}

/// `petgraph` adapter: edge weights are the feature lists.
///
/// Parallel edges between the same pair are not merged; `features` reports the first one
/// `find_edge` returns.
#[cfg(feature = "petgraph")]
impl<N, Ix> FeatureGraph for petgraph::Graph<N, Vec<Feature>, petgraph::Directed, Ix>
where
    Ix: petgraph::graph::IndexType,
{
    type Node = petgraph::graph::NodeIndex<Ix>;

    fn neighbors(&self, node: &Self::Node) -> Vec<Self::Node> {
        if node.index() >= self.node_count() {
            return Vec::new();
        }
        let mut out: Vec<Self::Node> = self
            .neighbors_directed(*node, petgraph::Direction::Outgoing)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn features(&self, source: &Self::Node, target: &Self::Node) -> &[Feature] {
        if source.index() >= self.node_count() || target.index() >= self.node_count() {
            return &[];
        }
        self.find_edge(*source, *target)
            .map(|e| self[e].as_slice())
            .unwrap_or(&[])
    }

    fn feature_names(&self) -> BTreeSet<String> {
        self.edge_weights()
            .flatten()
            .map(|f| f.name.clone())
            .collect()
    }
}
