use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use tracing::{debug, warn};

use crate::diagnostic::{Diagnostic, PortDirection, ValidationReport};
use crate::error::ValidationError;
use crate::graph::Graph;

/// Check a graph and collect every problem found.
///
/// Checks run in a fixed order: edge endpoints, port types, entry bindings,
/// cycle safety, then coverage (warnings for unfed inputs and instances that
/// can never fire). Validation never mutates the graph, so running it twice
/// yields the same report.
pub fn validate(graph: &Graph) -> ValidationReport {
  let mut diagnostics = Vec::new();

  check_endpoints(graph, &mut diagnostics);
  check_types(graph, &mut diagnostics);
  check_entries(graph, &mut diagnostics);
  check_cycles(graph, &mut diagnostics);
  check_coverage(graph, &mut diagnostics);

  let report = ValidationReport::new(diagnostics);
  debug!(
    errors = report.error_count(),
    warnings = report.warnings().count(),
    "graph validated"
  );
  report
}

fn check_endpoints(graph: &Graph, out: &mut Vec<Diagnostic>) {
  for (i, edge) in graph.edges().iter().enumerate() {
    let source = graph.instance(&edge.source);
    let target = graph.instance(&edge.target);

    if source.is_none() {
      out.push(Diagnostic::UnknownInstance {
        edge: i,
        instance_id: edge.source.clone(),
      });
    }
    if target.is_none() {
      out.push(Diagnostic::UnknownInstance {
        edge: i,
        instance_id: edge.target.clone(),
      });
    }

    if let Some(source) = source
      && source.schema().get_output(&edge.source_port).is_none()
    {
      out.push(Diagnostic::UnknownPort {
        edge: i,
        instance_id: edge.source.clone(),
        port: edge.source_port.clone(),
        direction: PortDirection::Output,
      });
    }

    if let Some(target) = target {
      if target.is_trigger() {
        out.push(Diagnostic::TriggerTarget {
          edge: i,
          instance_id: edge.target.clone(),
        });
      } else if target.schema().get_input(&edge.target_port).is_none() {
        out.push(Diagnostic::UnknownPort {
          edge: i,
          instance_id: edge.target.clone(),
          port: edge.target_port.clone(),
          direction: PortDirection::Input,
        });
      }
    }
  }
}

fn check_types(graph: &Graph, out: &mut Vec<Diagnostic>) {
  for (i, edge) in graph.edges().iter().enumerate() {
    // Endpoint problems were already reported.
    let Some(output) = graph
      .instance(&edge.source)
      .and_then(|s| s.schema().get_output(&edge.source_port))
    else {
      continue;
    };
    let Some(input) = graph
      .instance(&edge.target)
      .filter(|t| !t.is_trigger())
      .and_then(|t| t.schema().get_input(&edge.target_port))
    else {
      continue;
    };

    if !output.port_type.compatible_with(&input.port_type) {
      out.push(Diagnostic::TypeMismatch {
        edge: i,
        source_instance: edge.source.clone(),
        source_port: edge.source_port.clone(),
        source_type: output.port_type.to_string(),
        target_instance: edge.target.clone(),
        target_port: edge.target_port.clone(),
        target_type: input.port_type.to_string(),
      });
    }
  }
}

fn check_entries(graph: &Graph, out: &mut Vec<Diagnostic>) {
  for (i, entry) in graph.entries().iter().enumerate() {
    match graph.instance(&entry.instance_id) {
      Some(instance) if instance.is_trigger() => out.push(Diagnostic::BindingToTrigger {
        entry: i,
        instance_id: entry.instance_id.clone(),
      }),
      Some(instance) if instance.schema().get_input(&entry.input).is_some() => {}
      _ => out.push(Diagnostic::UnknownBinding {
        entry: i,
        instance_id: entry.instance_id.clone(),
        input: entry.input.clone(),
      }),
    }
  }
}

fn check_cycles(graph: &Graph, out: &mut Vec<Diagnostic>) {
  let inner = graph.inner();

  let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(inner)
    .into_iter()
    .filter(|component| {
      component.len() > 1 || inner.find_edge(component[0], component[0]).is_some()
    })
    .collect();
  for cycle in &mut cycles {
    cycle.sort();
  }
  cycles.sort_by_key(|cycle| cycle[0]);

  for cycle in cycles {
    let members: HashSet<NodeIndex> = cycle.iter().copied().collect();
    if cycle.iter().any(|&idx| can_start(graph, idx, &members)) {
      continue;
    }

    out.push(Diagnostic::UnstartableCycle {
      instances: cycle
        .iter()
        .map(|&idx| graph.instance_at(idx).id().to_string())
        .collect(),
    });
  }
}

/// Whether `idx` can fire before any other member of its cycle has produced.
///
/// Every input must be satisfiable from outside the cycle (an initial value,
/// an entry binding, an edge from a non-member, or a default on an
/// unconnected input), and at least one input must actually receive a queued
/// value, since defaults alone never make an instance ready.
fn can_start(graph: &Graph, idx: NodeIndex, members: &HashSet<NodeIndex>) -> bool {
  let instance = graph.instance_at(idx);
  if instance.is_trigger() {
    return true;
  }

  let mut seeded = false;
  for input in &instance.schema().inputs {
    let sources = graph.inbound_sources(idx, &input.name);
    let fed_from_outside = sources.iter().any(|s| !members.contains(s));

    if input.initial.is_some() || fed_from_outside || graph.is_bound(instance.id(), &input.name) {
      seeded = true;
    } else if !(sources.is_empty() && input.default.is_some()) {
      return false;
    }
  }
  seeded
}

fn check_coverage(graph: &Graph, out: &mut Vec<Diagnostic>) {
  for (idx, instance) in graph.instances() {
    if instance.is_trigger() {
      continue;
    }

    let mut unfed = false;
    let mut queued = false;
    for input in &instance.schema().inputs {
      let wired = graph.has_inbound(idx, &input.name);
      let bound = graph.is_bound(instance.id(), &input.name);
      queued |= wired || bound || input.initial.is_some();

      if input.initial.is_none() && input.default.is_none() && !wired && !bound {
        unfed = true;
        out.push(Diagnostic::UnfedInput {
          instance_id: instance.id().to_string(),
          input: input.name.clone(),
        });
      }
    }

    // Defaults never make an instance ready on their own.
    if !queued && !unfed {
      out.push(Diagnostic::NeverReady {
        instance_id: instance.id().to_string(),
      });
    }
  }
}

/// A graph that passed validation. The engine only accepts this type.
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
  graph: Arc<Graph>,
  report: ValidationReport,
}

impl ValidatedGraph {
  pub fn graph(&self) -> &Arc<Graph> {
    &self.graph
  }

  /// Warnings raised during validation.
  pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
    self.report.warnings()
  }
}

impl Deref for ValidatedGraph {
  type Target = Graph;

  fn deref(&self) -> &Graph {
    &self.graph
  }
}

impl Graph {
  /// Validate and, if there are no errors, wrap the graph for execution.
  pub fn into_validated(self) -> Result<ValidatedGraph, ValidationError> {
    let report = validate(&self);
    if !report.is_valid() {
      return Err(ValidationError(report));
    }

    for warning in report.warnings() {
      warn!(instance = warning.instance_id(), "{}", warning);
    }

    Ok(ValidatedGraph {
      graph: Arc::new(self),
      report,
    })
  }
}
