//! Imágenes de los listings como nodos `File` enlazados.
//!
//! Por cada listing creado se pide un nodo `File` por URL de imagen y, si al
//! menos uno se crea, se enlaza en `fields.thumbnail` o `fields.picFiles`.
//! Un fallo de descarga solo deja sin enlazar esa imagen.

use std::{future::Future, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use url::Url;

use crate::{
    config::ImageMode,
    models::{FileNode, Listing},
    node::{create_node_id, Node},
    report::Reporter,
    store::NodeStore,
};

pub const FILE_NODE_TYPE: &str = "File";

/// Petición de creación de un nodo `File` a partir de una URL remota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileRequest {
    pub url: String,
    pub parent_node_id: String,
}

/// Crea nodos `File` a partir de URLs remotas. `Ok(None)` significa que no se
/// generó fichero y no es un error.
pub trait RemoteFileFactory: Send + Sync {
    fn create_remote_file_node(
        &self,
        request: RemoteFileRequest,
    ) -> impl Future<Output = Result<Option<FileNode>>> + Send;
}

/// Resultado del enlazado de imágenes de un listing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttachOutcome {
    pub requested: usize,
    pub attached: usize,
    pub failed: usize,
}

pub struct ImageAttacher<'a, F> {
    factory: &'a F,
    mode: ImageMode,
    timeout: Duration,
}

impl<'a, F: RemoteFileFactory> ImageAttacher<'a, F> {
    pub fn new(factory: &'a F, mode: ImageMode, timeout: Duration) -> Self {
        Self {
            factory,
            mode,
            timeout,
        }
    }

    fn urls<'l>(&self, listing: &'l Listing) -> Vec<&'l str> {
        match self.mode {
            ImageMode::Thumbnail => listing.thumbnail_url().into_iter().collect(),
            ImageMode::Gallery => listing.original_urls(),
            ImageMode::Disabled => Vec::new(),
        }
    }

    /// Pide todos los ficheros del listing en paralelo, cada uno acotado por
    /// `timeout`, y enlaza los que se crearon.
    pub async fn attach<S: NodeStore + ?Sized>(
        &self,
        listing: &Listing,
        node_id: &str,
        store: &S,
        reporter: &dyn Reporter,
    ) -> AttachOutcome {
        let Some(field) = self.mode.field_name() else {
            return AttachOutcome::default();
        };
        let urls = self.urls(listing);
        if urls.is_empty() {
            return AttachOutcome::default();
        }

        let requests = urls.iter().map(|url| {
            let request = RemoteFileRequest {
                url: url.to_string(),
                parent_node_id: node_id.to_string(),
            };
            tokio::time::timeout(self.timeout, self.factory.create_remote_file_node(request))
        });
        let results = join_all(requests).await;

        let mut outcome = AttachOutcome {
            requested: urls.len(),
            ..AttachOutcome::default()
        };
        let mut file_ids = Vec::new();

        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(Ok(Some(file))) => {
                    file_ids.push(file.id.clone());
                    store.create_node(file_to_node(&file));
                }
                Ok(Ok(None)) => debug!("Sin fichero para {url}"),
                Ok(Err(err)) => {
                    outcome.failed += 1;
                    reporter.warn(&format!("Imagen {url} del listing {}: {err:#}", listing.id));
                }
                Err(_) => {
                    outcome.failed += 1;
                    reporter.warn(&format!(
                        "Imagen {url} del listing {}: sin respuesta en {:?}",
                        listing.id, self.timeout
                    ));
                }
            }
        }

        if file_ids.is_empty() {
            return outcome;
        }

        let value = match self.mode {
            ImageMode::Thumbnail => Value::String(file_ids[0].clone()),
            _ => json!(file_ids),
        };
        if store.create_node_field(node_id, field, value) {
            outcome.attached = file_ids.len();
        }
        outcome
    }
}

/// Nodo `File` hijo del listing que lo originó.
pub fn file_to_node(file: &FileNode) -> Node {
    let record = json!({
        "url": file.url,
        "absolutePath": file.path,
        "base": file.filename,
        "size": file.size_bytes,
        "mediaType": file.mime_type,
    });
    let mut node = Node::new(
        file.id.clone(),
        FILE_NODE_TYPE,
        record,
        Some(file.parent_id.clone()),
    );
    node.internal.content_digest = file.content_digest.clone();
    node
}

/// Descarga las imágenes a un directorio de caché local.
#[derive(Clone, Debug)]
pub struct HttpFileFactory {
    http: reqwest::Client,
    cache_dir: PathBuf,
}

impl HttpFileFactory {
    pub fn new(cache_dir: PathBuf, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("No se pudo construir el cliente HTTP de imágenes")?;
        Ok(Self { http, cache_dir })
    }

    async fn download(&self, request: &RemoteFileRequest) -> Result<FileNode> {
        let url = Url::parse(&request.url).with_context(|| format!("URL de imagen inválida: {}", request.url))?;

        let response = self.http.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("{url} respondió con estado {}", response.status()));
        }
        let bytes = response.bytes().await?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = format!("{:x}", hasher.finalize());

        let mime = mime_guess::from_path(url.path()).first();
        let extension = std::path::Path::new(url.path())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        let filename = format!("{}{extension}", &digest[..16]);

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| format!("No se pudo crear {}", self.cache_dir.display()))?;
        let path = self.cache_dir.join(&filename);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("No se pudo escribir {}", path.display()))?;

        Ok(FileNode {
            id: create_node_id(FILE_NODE_TYPE, &request.url),
            url: request.url.clone(),
            parent_id: request.parent_node_id.clone(),
            path: path.to_string_lossy().to_string(),
            filename,
            size_bytes: bytes.len() as u64,
            mime_type: mime.map(|m| m.to_string()),
            content_digest: digest,
        })
    }
}

impl RemoteFileFactory for HttpFileFactory {
    async fn create_remote_file_node(&self, request: RemoteFileRequest) -> Result<Option<FileNode>> {
        let file = self.download(&request).await?;
        info!("Imagen {} guardada en {}", file.url, file.path);
        Ok(Some(file))
    }
}
