use std::collections::HashSet;

use tracing::debug;
use tributary_catalog::NodeCatalog;
use tributary_config::GraphDef;

use crate::error::BuildError;
use crate::graph::{Graph, Instance};

/// Build a graph from a definition, resolving type names against `catalog`.
///
/// Only type names and instance id uniqueness are checked here. Edges and
/// entry bindings are taken as given; [`validate`](crate::validate) reports
/// bad endpoints, types and cycles.
pub fn build(catalog: &NodeCatalog, def: &GraphDef) -> Result<Graph, BuildError> {
  let mut graph = Graph::new(def.name.clone());
  let mut seen = HashSet::new();

  for instance in &def.instances {
    if !seen.insert(instance.id.as_str()) {
      return Err(BuildError::DuplicateInstanceId {
        instance_id: instance.id.clone(),
      });
    }

    let node_type = catalog
      .get(&instance.node_type)
      .ok_or_else(|| BuildError::UnknownType {
        instance_id: instance.id.clone(),
        type_name: instance.node_type.clone(),
      })?;

    graph.add_instance(Instance::new(instance.id.clone(), node_type.clone()));
  }

  for edge in &def.edges {
    graph.add_edge(edge.clone());
  }

  for entry in &def.entries {
    graph.add_entry(entry.clone());
  }

  debug!(
    instances = graph.len(),
    edges = graph.edges().len(),
    entries = graph.entries().len(),
    "graph built"
  );

  Ok(graph)
}
