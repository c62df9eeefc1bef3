use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::computation::Computation;
use crate::error::CatalogError;
use crate::port::NodePortSchema;

/// A registered node type: its schema and the computation that implements it.
pub struct NodeType {
  name: String,
  schema: NodePortSchema,
  computation: Arc<dyn Computation>,
}

impl NodeType {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn schema(&self) -> &NodePortSchema {
    &self.schema
  }

  pub fn computation(&self) -> &Arc<dyn Computation> {
    &self.computation
  }

  pub fn is_trigger(&self) -> bool {
    self.schema.trigger
  }
}

impl fmt::Debug for NodeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NodeType")
      .field("name", &self.name)
      .field("schema", &self.schema)
      .finish_non_exhaustive()
  }
}

/// Registry of node types keyed by type name.
///
/// Types are immutable once registered; instances in a built graph share the
/// registered [`NodeType`] through an `Arc`.
#[derive(Default, Clone)]
pub struct NodeCatalog {
  types: BTreeMap<String, Arc<NodeType>>,
}

impl NodeCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a node type.
  ///
  /// Fails if the name is taken or the schema is malformed (duplicate port
  /// names, or a trigger that does not declare exactly one input).
  pub fn register(
    &mut self,
    name: impl Into<String>,
    schema: NodePortSchema,
    computation: Arc<dyn Computation>,
  ) -> Result<(), CatalogError> {
    let name = name.into();
    if self.types.contains_key(&name) {
      return Err(CatalogError::DuplicateType { name });
    }
    schema.check(&name)?;

    self.types.insert(
      name.clone(),
      Arc::new(NodeType {
        name,
        schema,
        computation,
      }),
    );
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&Arc<NodeType>> {
    self.types.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.types.contains_key(name)
  }

  /// Registered types in name order.
  pub fn iter(&self) -> impl Iterator<Item = &Arc<NodeType>> {
    self.types.values()
  }

  pub fn len(&self) -> usize {
    self.types.len()
  }

  pub fn is_empty(&self) -> bool {
    self.types.is_empty()
  }
}

impl fmt::Debug for NodeCatalog {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.types.keys()).finish()
  }
}
