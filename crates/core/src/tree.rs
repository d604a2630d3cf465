//! # Tree Decomposition
//!
//! Structured values (tuples of cotangents, parameter records, sentinels) are
//! decomposed into an ordered list of leaf values plus a [`TreeDef`] that
//! remembers how to put them back together. Transformations operate on the
//! leaves and rebuild the structure afterwards.
//!
//! Node types opt in through [`TreeRegistry::register`], giving a flatten
//! function (node → leaves + optional auxiliary data) and an unflatten
//! function (auxiliary data + leaves → node).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::CoreError;
use crate::registry::{TypeKey, TypeRegistry};
use crate::value::Value;

type AuxData = Arc<dyn Any + Send + Sync>;

type FlattenFn = dyn Fn(&dyn Any) -> Result<(Vec<Value>, Option<AuxData>), CoreError> + Send + Sync;

type UnflattenFn =
    dyn Fn(Option<&AuxData>, Vec<Value>) -> Result<Box<dyn Any + Send>, CoreError> + Send + Sync;

struct NodeHandlers {
    flatten: Box<FlattenFn>,
    unflatten: Box<UnflattenFn>,
}

/// Structure of a flattened node.
#[derive(Clone)]
pub struct TreeDef {
    node: TypeKey,
    aux: Option<AuxData>,
    num_leaves: usize,
}

impl TreeDef {
    pub fn node_type(&self) -> TypeKey {
        self.node
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// The auxiliary data recorded at flatten time, if any.
    pub fn aux<A: Any>(&self) -> Option<&A> {
        self.aux.as_ref().and_then(|aux| aux.downcast_ref::<A>())
    }

    pub fn has_aux(&self) -> bool {
        self.aux.is_some()
    }
}

impl fmt::Debug for TreeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeDef")
            .field("node", &self.node.name())
            .field("aux", &self.aux.is_some())
            .field("num_leaves", &self.num_leaves)
            .finish()
    }
}

/// Registry of node types that take part in flatten/unflatten.
pub struct TreeRegistry {
    nodes: TypeRegistry<NodeHandlers>,
}

impl TreeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: TypeRegistry::new("tree"),
        }
    }

    /// Register `T` as a tree node with auxiliary data of type `A`.
    pub fn register<T, A, F, U>(&self, flatten: F, unflatten: U)
    where
        T: Any + Send,
        A: Any + Send + Sync,
        F: Fn(&T) -> (Vec<Value>, Option<A>) + Send + Sync + 'static,
        U: Fn(Option<&A>, Vec<Value>) -> T + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let flatten_node = move |node: &dyn Any| -> Result<(Vec<Value>, Option<AuxData>), CoreError> {
            let node = node.downcast_ref::<T>().ok_or_else(|| CoreError::TreeMismatch {
                expected: key.name().to_string(),
                got: "value of another type".to_string(),
            })?;
            let (leaves, aux) = flatten(node);
            Ok((leaves, aux.map(|aux| Arc::new(aux) as AuxData)))
        };
        let unflatten_node = move |aux: Option<&AuxData>,
                                   leaves: Vec<Value>|
              -> Result<Box<dyn Any + Send>, CoreError> {
            let aux = match aux {
                Some(aux) => Some(aux.downcast_ref::<A>().ok_or_else(|| {
                    CoreError::TreeMismatch {
                        expected: std::any::type_name::<A>().to_string(),
                        got: "auxiliary data of another type".to_string(),
                    }
                })?),
                None => None,
            };
            Ok(Box::new(unflatten(aux, leaves)) as Box<dyn Any + Send>)
        };
        let handlers = NodeHandlers {
            flatten: Box::new(flatten_node),
            unflatten: Box::new(unflatten_node),
        };
        self.nodes.register(key, Arc::new(handlers));
    }

    pub fn is_registered<T: Any>(&self) -> bool {
        self.nodes.contains(TypeKey::of::<T>())
    }

    /// Decompose `node` into leaves and structure.
    pub fn flatten<T: Any>(&self, node: &T) -> Result<(Vec<Value>, TreeDef), CoreError> {
        let key = TypeKey::of::<T>();
        let handlers = self.nodes.lookup(key)?;
        let (leaves, aux) = (handlers.flatten)(node)?;
        let treedef = TreeDef {
            node: key,
            aux,
            num_leaves: leaves.len(),
        };
        Ok((leaves, treedef))
    }

    /// Rebuild a `T` from leaves and the structure recorded by `flatten`.
    pub fn unflatten<T: Any>(&self, treedef: &TreeDef, leaves: Vec<Value>) -> Result<T, CoreError> {
        let key = TypeKey::of::<T>();
        if treedef.node != key {
            return Err(CoreError::TreeMismatch {
                expected: key.name().to_string(),
                got: treedef.node.name().to_string(),
            });
        }
        if leaves.len() != treedef.num_leaves {
            return Err(CoreError::TreeMismatch {
                expected: format!("{} leaves", treedef.num_leaves),
                got: format!("{} leaves", leaves.len()),
            });
        }
        let handlers = self.nodes.lookup(key)?;
        let node = (handlers.unflatten)(treedef.aux.as_ref(), leaves)?;
        node.downcast::<T>()
            .map(|node| *node)
            .map_err(|_| CoreError::TreeMismatch {
                expected: key.name().to_string(),
                got: "node of another type".to_string(),
            })
    }

    /// Number of registered node types.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for TreeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TreeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeRegistry")
            .field("node_count", &self.nodes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Unit;

    #[derive(Debug, PartialEq)]
    struct Pair(Value, Value);

    #[derive(Debug, PartialEq)]
    struct Labeled {
        label: String,
        value: Value,
    }

    fn registry() -> TreeRegistry {
        let trees = TreeRegistry::new();
        trees.register::<Pair, (), _, _>(
            |pair| (vec![pair.0.clone(), pair.1.clone()], None),
            |_, mut leaves| {
                let second = leaves.pop().unwrap_or_else(Value::unit);
                let first = leaves.pop().unwrap_or_else(Value::unit);
                Pair(first, second)
            },
        );
        trees.register::<Labeled, String, _, _>(
            |node| (vec![node.value.clone()], Some(node.label.clone())),
            |label, mut leaves| Labeled {
                label: label.cloned().unwrap_or_default(),
                value: leaves.pop().unwrap_or_else(Value::unit),
            },
        );
        trees
    }

    #[test]
    fn test_flatten_pair() {
        let trees = registry();
        let (leaves, treedef) = trees.flatten(&Pair(Value::unit(), Value::unit())).unwrap();

        assert_eq!(leaves.len(), 2);
        assert_eq!(treedef.num_leaves(), 2);
        assert!(!treedef.has_aux());
        assert_eq!(treedef.node_type(), TypeKey::of::<Pair>());
    }

    #[test]
    fn test_unflatten_restores_aux() {
        let trees = registry();
        let node = Labeled {
            label: "bias".to_string(),
            value: Value::new(Unit),
        };

        let (leaves, treedef) = trees.flatten(&node).unwrap();
        assert_eq!(treedef.aux::<String>().map(String::as_str), Some("bias"));

        let rebuilt: Labeled = trees.unflatten(&treedef, leaves).unwrap();
        assert_eq!(rebuilt, node);
    }

    #[test]
    fn test_unflatten_wrong_leaf_count() {
        let trees = registry();
        let (_, treedef) = trees.flatten(&Pair(Value::unit(), Value::unit())).unwrap();

        let err = trees.unflatten::<Pair>(&treedef, vec![Value::unit()]).unwrap_err();
        assert!(matches!(err, CoreError::TreeMismatch { .. }));
    }

    #[test]
    fn test_unflatten_wrong_node_type() {
        let trees = registry();
        let (leaves, treedef) = trees.flatten(&Pair(Value::unit(), Value::unit())).unwrap();

        let err = trees.unflatten::<Labeled>(&treedef, leaves).unwrap_err();
        assert!(matches!(err, CoreError::TreeMismatch { .. }));
    }

    #[test]
    fn test_flatten_unregistered() {
        let trees = TreeRegistry::new();
        let err = trees.flatten(&Unit).unwrap_err();

        assert!(matches!(
            err,
            CoreError::Unregistered {
                registry: "tree",
                ..
            }
        ));
        assert!(!trees.is_registered::<Unit>());
    }
}
