use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use tributary_catalog::{NodePortSchema, NodeType};
use tributary_config::{EdgeDef, EntryBinding};

/// A node instance placed in a graph.
#[derive(Debug, Clone)]
pub struct Instance {
  id: String,
  node_type: Arc<NodeType>,
}

impl Instance {
  pub(crate) fn new(id: String, node_type: Arc<NodeType>) -> Self {
    Self { id, node_type }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn node_type(&self) -> &Arc<NodeType> {
    &self.node_type
  }

  pub fn schema(&self) -> &NodePortSchema {
    self.node_type.schema()
  }

  pub fn is_trigger(&self) -> bool {
    self.node_type.is_trigger()
  }
}

/// The port pair an edge connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
  pub source_port: String,
  pub target_port: String,
}

/// A directed multigraph of node instances.
///
/// Nodes are instances; every edge between two existing instances is a
/// [`Wire`] naming the source output and target input, so parallel edges on
/// different ports are kept apart. The flat edge list from the definition is
/// kept as well, including edges that reference unknown instances, so the
/// validator can report them in declaration order.
#[derive(Debug, Clone)]
pub struct Graph {
  name: Option<String>,
  inner: DiGraph<Instance, Wire>,
  index: HashMap<String, NodeIndex>,
  edges: Vec<EdgeDef>,
  entries: Vec<EntryBinding>,
}

impl Graph {
  pub(crate) fn new(name: Option<String>) -> Self {
    Self {
      name,
      inner: DiGraph::new(),
      index: HashMap::new(),
      edges: Vec::new(),
      entries: Vec::new(),
    }
  }

  pub(crate) fn add_instance(&mut self, instance: Instance) -> NodeIndex {
    let id = instance.id.clone();
    let idx = self.inner.add_node(instance);
    self.index.insert(id, idx);
    idx
  }

  pub(crate) fn add_edge(&mut self, edge: EdgeDef) {
    if let (Some(&from), Some(&to)) = (self.index.get(&edge.source), self.index.get(&edge.target)) {
      self.inner.add_edge(
        from,
        to,
        Wire {
          source_port: edge.source_port.clone(),
          target_port: edge.target_port.clone(),
        },
      );
    }
    self.edges.push(edge);
  }

  pub(crate) fn add_entry(&mut self, entry: EntryBinding) {
    self.entries.push(entry);
  }

  pub(crate) fn inner(&self) -> &DiGraph<Instance, Wire> {
    &self.inner
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn len(&self) -> usize {
    self.inner.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.node_count() == 0
  }

  /// Instances in declaration order.
  pub fn instances(&self) -> impl Iterator<Item = (NodeIndex, &Instance)> {
    self.inner.node_indices().map(|idx| (idx, &self.inner[idx]))
  }

  pub fn instance(&self, id: &str) -> Option<&Instance> {
    self.index.get(id).map(|&idx| &self.inner[idx])
  }

  pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
    self.index.get(id).copied()
  }

  /// The instance at `idx`. Panics if `idx` did not come from this graph.
  pub fn instance_at(&self, idx: NodeIndex) -> &Instance {
    &self.inner[idx]
  }

  /// The edges as declared, including ones with unknown endpoints.
  pub fn edges(&self) -> &[EdgeDef] {
    &self.edges
  }

  /// Values bound to inputs at run start, in declaration order.
  pub fn entries(&self) -> &[EntryBinding] {
    &self.entries
  }

  /// Entry values bound to the given input, in declaration order.
  pub fn entries_for<'a>(&'a self, id: &'a str, input: &'a str) -> impl Iterator<Item = &'a EntryBinding> {
    self
      .entries
      .iter()
      .filter(move |e| e.instance_id == id && e.input == input)
  }

  /// Whether any entry binding seeds the given input.
  pub fn is_bound(&self, id: &str, input: &str) -> bool {
    self.entries_for(id, input).next().is_some()
  }

  /// Whether any edge feeds the given input.
  pub fn has_inbound(&self, idx: NodeIndex, input: &str) -> bool {
    self
      .inner
      .edges_directed(idx, Direction::Incoming)
      .any(|e| e.weight().target_port == input)
  }

  /// Source instances of every edge feeding the given input.
  pub fn inbound_sources(&self, idx: NodeIndex, input: &str) -> Vec<NodeIndex> {
    self
      .inner
      .edges_directed(idx, Direction::Incoming)
      .filter(|e| e.weight().target_port == input)
      .map(|e| e.source())
      .collect()
  }

  /// Targets fed by the given output, in edge declaration order.
  pub fn routes(&self, idx: NodeIndex, output: &str) -> Vec<(NodeIndex, &str)> {
    let mut routes: Vec<(EdgeIndex, NodeIndex, &str)> = self
      .inner
      .edges_directed(idx, Direction::Outgoing)
      .filter(|e| e.weight().source_port == output)
      .map(|e| (e.id(), e.target(), e.weight().target_port.as_str()))
      .collect();
    routes.sort_by_key(|(id, _, _)| *id);
    routes
      .into_iter()
      .map(|(_, target, port)| (target, port))
      .collect()
  }

  /// `idx` and every instance reachable from it.
  pub fn downstream_closure(&self, idx: NodeIndex) -> HashSet<NodeIndex> {
    let mut reached = HashSet::new();
    let mut bfs = Bfs::new(&self.inner, idx);
    while let Some(next) = bfs.next(&self.inner) {
      reached.insert(next);
    }
    reached
  }
}
