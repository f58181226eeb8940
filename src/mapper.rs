//! Conversión de los registros JSON de la API en nodos del grafo.
//!
//! Cada registro se decodifica por separado: un registro defectuoso se omite
//! y se informa, el resto del lote sigue adelante.

use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;

use crate::{
    models::SourceRecord,
    node::{create_node_id, Node},
};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{node_type} #{index}: falta el campo '_id'")]
    MissingId { node_type: &'static str, index: usize },
    #[error("{node_type} #{index} ({id}): registro mal formado: {source}")]
    Malformed {
        node_type: &'static str,
        index: usize,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Registro tipado junto al nodo que lo representa.
#[derive(Debug, Clone)]
pub struct MappedNode<T> {
    pub record: T,
    pub node: Node,
}

/// Resultado de mapear un lote completo.
#[derive(Debug)]
pub struct MappedBatch<T> {
    pub nodes: Vec<MappedNode<T>>,
    pub skipped: Vec<RecordError>,
    pub warnings: Vec<String>,
}

impl<T> Default for MappedBatch<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Decodifica un registro y construye su nodo. El contenido del nodo es el
/// registro tipado, no el JSON original.
pub fn map_record<T: SourceRecord>(index: usize, raw: &Value) -> Result<MappedNode<T>, RecordError> {
    let id = match raw.get("_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return Err(RecordError::MissingId {
                node_type: T::NODE_TYPE,
                index,
            })
        }
    };

    let malformed = |source| RecordError::Malformed {
        node_type: T::NODE_TYPE,
        index,
        id: id.clone(),
        source,
    };
    let record: T = serde_json::from_value(raw.clone()).map_err(malformed)?;
    let content = serde_json::to_value(&record).map_err(malformed)?;

    let node = Node::new(
        create_node_id(T::NODE_TYPE, record.natural_key()),
        T::NODE_TYPE,
        content,
        None,
    );
    Ok(MappedNode { record, node })
}

/// Campos de primer nivel presentes en el JSON crudo que el registro tipado
/// no conoce.
pub fn unknown_fields<'a>(raw: &'a Value, node: &Node) -> Vec<&'a str> {
    match raw.as_object() {
        Some(map) => map
            .keys()
            .filter(|k| !node.data.contains_key(k.as_str()))
            .map(String::as_str)
            .collect(),
        None => Vec::new(),
    }
}

/// Campos que llegaron con valor pero no se pudieron decodificar y quedaron
/// a `null` en el nodo.
pub fn rejected_fields<'a>(raw: &'a Value, node: &Node) -> Vec<&'a str> {
    match raw.as_object() {
        Some(map) => map
            .iter()
            .filter(|(k, v)| !v.is_null() && node.data.get(k.as_str()) == Some(&Value::Null))
            .map(|(k, _)| k.as_str())
            .collect(),
        None => Vec::new(),
    }
}

pub fn map_batch<T: SourceRecord>(records: &[Value]) -> MappedBatch<T> {
    let mut batch = MappedBatch::default();
    let mut ignored = BTreeSet::new();

    for (index, raw) in records.iter().enumerate() {
        match map_record::<T>(index, raw) {
            Ok(mapped) => {
                ignored.extend(unknown_fields(raw, &mapped.node).into_iter().map(str::to_string));
                let rejected = rejected_fields(raw, &mapped.node);
                if !rejected.is_empty() {
                    batch.warnings.push(format!(
                        "{} {}: valores no válidos descartados: {}",
                        T::NODE_TYPE,
                        mapped.record.natural_key(),
                        rejected.join(", ")
                    ));
                }
                let missing = mapped.record.missing_required();
                if !missing.is_empty() {
                    batch.warnings.push(format!(
                        "{} {}: faltan campos obligatorios: {}",
                        T::NODE_TYPE,
                        mapped.record.natural_key(),
                        missing.join(", ")
                    ));
                }
                batch.nodes.push(mapped);
            }
            Err(err) => batch.skipped.push(err),
        }
    }

    if !ignored.is_empty() {
        let names: Vec<_> = ignored.into_iter().collect();
        batch.warnings.push(format!(
            "{}: campos desconocidos ignorados: {}",
            T::NODE_TYPE,
            names.join(", ")
        ));
    }

    batch
}
