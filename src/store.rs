//! Almacén de nodos del framework anfitrión.

use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

use serde_json::Value;
use tracing::debug;

use crate::node::Node;

/// Interfaz que la fuente consume para publicar nodos y tipos. Debe admitir
/// inserciones concurrentes.
pub trait NodeStore: Send + Sync {
    fn create_node(&self, node: Node);

    /// Añade `fields.<name>` a un nodo existente. Devuelve `false` si el nodo
    /// no existe.
    fn create_node_field(&self, node_id: &str, name: &str, value: Value) -> bool;

    fn create_types(&self, type_defs: &str);

    fn get_node(&self, id: &str) -> Option<Node>;

    fn nodes_by_type(&self, node_type: &str) -> Vec<Node>;
}

/// Implementación en memoria, usada por el servidor de inspección y los tests.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: Mutex<BTreeMap<String, Node>>,
    type_defs: Mutex<Vec<String>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descarta todos los nodos antes de una nueva pasada. Los tipos
    /// declarados se conservan.
    pub fn clear(&self) {
        self.nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_defs(&self) -> Vec<String> {
        self.type_defs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NodeStore for MemoryNodeStore {
    fn create_node(&self, node: Node) {
        debug!("Nodo {} ({}) creado", node.id, node.node_type());
        self.nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(node.id.clone(), node);
    }

    fn create_node_field(&self, node_id: &str, name: &str, value: Value) -> bool {
        let mut nodes = self.nodes.lock().unwrap_or_else(PoisonError::into_inner);
        match nodes.get_mut(node_id) {
            Some(node) => {
                node.fields.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }

    fn create_types(&self, type_defs: &str) {
        self.type_defs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(type_defs.to_string());
    }

    fn get_node(&self, id: &str) -> Option<Node> {
        self.nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn nodes_by_type(&self, node_type: &str) -> Vec<Node> {
        self.nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|n| n.node_type() == node_type)
            .cloned()
            .collect()
    }
}
