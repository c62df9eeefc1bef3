//! Trigger arming and pending resolutions.
//!
//! A trigger is *armed* while the run is waiting for it to be resolved, and
//! each resolution is queued until the scheduler fires the trigger with it.
//! A trigger that fired and was not re-armed is *parked*: it still holds the
//! run open, waiting for `listen`. Only the scheduler touches the desk.

use std::collections::{BTreeMap, VecDeque};

use serde_json::Value;
use tributary_graph::{Graph, NodeIndex};

#[derive(Debug, Default)]
struct TriggerSlot {
  armed: bool,
  parked: bool,
  pending: VecDeque<Value>,
  quarantined: bool,
}

#[derive(Debug)]
pub(crate) struct TriggerDesk {
  slots: BTreeMap<NodeIndex, TriggerSlot>,
}

impl TriggerDesk {
  pub(crate) fn new(graph: &Graph) -> Self {
    let slots = graph
      .instances()
      .filter(|(_, instance)| instance.is_trigger())
      .map(|(idx, _)| (idx, TriggerSlot::default()))
      .collect();
    Self { slots }
  }

  /// Trigger instances in declaration order.
  pub(crate) fn triggers(&self) -> impl Iterator<Item = NodeIndex> + '_ {
    self.slots.keys().copied()
  }

  /// Arm a trigger. Returns true if it was not armed before, meaning the
  /// caller should announce it.
  pub(crate) fn arm(&mut self, idx: NodeIndex) -> bool {
    match self.slots.get_mut(&idx) {
      Some(slot) if !slot.quarantined && !slot.armed => {
        slot.armed = true;
        slot.parked = false;
        true
      }
      _ => false,
    }
  }

  /// Queue a value for the trigger. Returns false if it was discarded.
  pub(crate) fn resolve(&mut self, idx: NodeIndex, value: Value) -> bool {
    match self.slots.get_mut(&idx) {
      Some(slot) if !slot.quarantined => {
        slot.pending.push_back(value);
        true
      }
      _ => false,
    }
  }

  pub(crate) fn has_pending(&self, idx: NodeIndex) -> bool {
    self
      .slots
      .get(&idx)
      .is_some_and(|slot| !slot.pending.is_empty())
  }

  /// Take the next resolution, disarming the trigger.
  pub(crate) fn take(&mut self, idx: NodeIndex) -> Option<Value> {
    let slot = self.slots.get_mut(&idx)?;
    let value = slot.pending.pop_front()?;
    slot.armed = false;
    Some(value)
  }

  /// Keep a fired trigger waiting for an explicit `listen`.
  pub(crate) fn park(&mut self, idx: NodeIndex) {
    if let Some(slot) = self.slots.get_mut(&idx)
      && !slot.quarantined
      && !slot.armed
    {
      slot.parked = true;
    }
  }

  pub(crate) fn quarantine(&mut self, idx: NodeIndex) {
    if let Some(slot) = self.slots.get_mut(&idx) {
      slot.quarantined = true;
      slot.armed = false;
      slot.parked = false;
      slot.pending.clear();
    }
  }

  /// Whether any trigger is armed, parked, or holds an unconsumed resolution.
  pub(crate) fn is_waiting(&self) -> bool {
    self
      .slots
      .values()
      .any(|slot| slot.armed || slot.parked || !slot.pending.is_empty())
  }
}
