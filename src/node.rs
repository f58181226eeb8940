//! Descriptor de nodo del grafo de contenido: identificador estable, contenido
//! canónico y huella (`contentDigest`).

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Propietario de todos los nodos que crea esta fuente.
pub const OWNER: &str = "guesty-source";

/// Namespace UUID v5 propio de la fuente.
fn node_namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, OWNER.as_bytes())
}

/// Id estable a partir de `tipo + clave natural`. El tipo forma parte de la
/// entrada, así un Listing y una Review con el mismo `_id` no colisionan.
pub fn create_node_id(node_type: &str, natural_key: &str) -> String {
    Uuid::new_v5(&node_namespace(), format!("{node_type}:{natural_key}").as_bytes()).to_string()
}

/// JSON compacto con las claves de cada objeto ordenadas, independiente del
/// orden en que llegaron de la API.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// SHA-256 en hexadecimal del contenido canónico.
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Internal {
    #[serde(rename = "type")]
    pub node_type: String,
    pub content: String,
    pub content_digest: String,
    pub owner: String,
}

/// Nodo tal como lo consume el almacén del framework:
/// `{ ...campos, id, parent, children, fields, internal }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
    /// Campos añadidos tras la creación (`createNodeField`).
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    pub internal: Internal,
}

impl Node {
    /// Construye el nodo a partir del registro ya serializado. Los valores
    /// que no son objeto quedan solo en `internal.content`.
    pub fn new(id: String, node_type: &str, record: Value, parent: Option<String>) -> Self {
        let content = canonical_json(&record);
        let content_digest = content_digest(&content);
        let data = match record {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            id,
            parent,
            children: Vec::new(),
            data,
            fields: Map::new(),
            internal: Internal {
                node_type: node_type.to_string(),
                content,
                content_digest,
                owner: OWNER.to_string(),
            },
        }
    }

    pub fn node_type(&self) -> &str {
        &self.internal.node_type
    }
}
