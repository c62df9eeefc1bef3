//! Per-port input queues.
//!
//! One FIFO per (instance, input), indexed by node index and input position.
//! Firing tasks append concurrently through a per-queue mutex; only the
//! scheduler dequeues.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tributary_graph::{Graph, NodeIndex};

#[derive(Debug, Default)]
struct PortQueue {
  values: VecDeque<Value>,
  closed: bool,
}

#[derive(Debug)]
struct Port {
  queue: Mutex<PortQueue>,
  connected: bool,
}

#[derive(Debug)]
pub(crate) struct QueueArena {
  slots: Vec<Vec<Port>>,
}

fn lock(queue: &Mutex<PortQueue>) -> MutexGuard<'_, PortQueue> {
  queue.lock().unwrap_or_else(PoisonError::into_inner)
}

impl QueueArena {
  /// Create an empty queue for every input, push each non-trigger input's
  /// initial value once, then append the graph's entry bindings in order.
  pub(crate) fn new(graph: &Graph) -> Self {
    let slots = graph
      .instances()
      .map(|(idx, instance)| {
        instance
          .schema()
          .inputs
          .iter()
          .map(|input| {
            let mut queue = PortQueue::default();
            if !instance.is_trigger() {
              queue.values.extend(input.initial.iter().cloned());
              queue.values.extend(
                graph
                  .entries_for(instance.id(), &input.name)
                  .map(|entry| entry.value.clone()),
              );
            }
            Port {
              queue: Mutex::new(queue),
              connected: graph.has_inbound(idx, &input.name),
            }
          })
          .collect()
      })
      .collect();

    Self { slots }
  }

  fn port(&self, idx: NodeIndex, pos: usize) -> &Port {
    &self.slots[idx.index()][pos]
  }

  /// Append a value. Returns false if the instance is quarantined.
  pub(crate) fn push(&self, idx: NodeIndex, pos: usize, value: Value) -> bool {
    let mut queue = lock(&self.port(idx, pos).queue);
    if queue.closed {
      return false;
    }
    queue.values.push_back(value);
    true
  }

  pub(crate) fn pop(&self, idx: NodeIndex, pos: usize) -> Option<Value> {
    lock(&self.port(idx, pos).queue).values.pop_front()
  }

  pub(crate) fn has_value(&self, idx: NodeIndex, pos: usize) -> bool {
    !lock(&self.port(idx, pos).queue).values.is_empty()
  }

  /// Whether any edge feeds this input.
  pub(crate) fn is_connected(&self, idx: NodeIndex, pos: usize) -> bool {
    self.port(idx, pos).connected
  }

  /// Drop every queued value for an instance and refuse further appends.
  pub(crate) fn close(&self, idx: NodeIndex) {
    for port in &self.slots[idx.index()] {
      let mut queue = lock(&port.queue);
      queue.closed = true;
      queue.values.clear();
    }
  }

  /// Number of values still queued, keyed by `instance.input`.
  pub(crate) fn leftovers(&self, graph: &Graph) -> BTreeMap<String, usize> {
    let mut leftovers = BTreeMap::new();
    for (idx, instance) in graph.instances() {
      for (pos, input) in instance.schema().inputs.iter().enumerate() {
        let count = lock(&self.port(idx, pos).queue).values.len();
        if count > 0 {
          leftovers.insert(format!("{}.{}", instance.id(), input.name), count);
        }
      }
    }
    leftovers
  }
}
