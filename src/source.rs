//! Una pasada completa de la fuente: descarga de listings y reviews en
//! paralelo, creación de nodos y enlazado de imágenes.

use std::{fmt, time::Duration};

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{
    client::{FetchError, GuestyClient},
    config::{AppConfig, ImageMode},
    images::{ImageAttacher, RemoteFileFactory},
    mapper::{map_batch, MappedBatch},
    models::{Listing, Review, SourceRecord},
    report::Reporter,
    store::NodeStore,
};

/// Parámetros de una pasada.
#[derive(Clone, Debug)]
pub struct SourceOptions {
    pub listing_fields: Vec<String>,
    pub image_mode: ImageMode,
    pub image_timeout: Duration,
}

impl SourceOptions {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            listing_fields: cfg.listing_fields.clone(),
            image_mode: cfg.image_mode,
            image_timeout: cfg.endpoint.timeout,
        }
    }
}

/// Resumen de los resultados de una pasada.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub listings_created: usize,
    pub reviews_created: usize,
    pub files_attached: usize,
    pub files_failed: usize,
    pub records_skipped: usize,
    pub batches_failed: usize,
}

impl fmt::Display for SourceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resumen: {} listings, {} reviews, {} imágenes enlazadas ({} fallidas), {} registros omitidos, {} lotes fallidos.",
            self.listings_created,
            self.reviews_created,
            self.files_attached,
            self.files_failed,
            self.records_skipped,
            self.batches_failed
        )
    }
}

/// Mapea un lote descargado, informa de los problemas y devuelve lo mapeado.
/// Un lote fallido no produce nodos pero no detiene la pasada.
fn collect_batch<T: SourceRecord>(
    fetched: Result<Vec<Value>, FetchError>,
    reporter: &dyn Reporter,
    summary: &mut SourceSummary,
) -> MappedBatch<T> {
    let records = match fetched {
        Ok(records) => records,
        Err(err) => {
            summary.batches_failed += 1;
            reporter.error(&format!("No se pudieron obtener los nodos {}: {err}", T::NODE_TYPE));
            return MappedBatch::default();
        }
    };

    let batch = map_batch::<T>(&records);
    for skipped in &batch.skipped {
        reporter.warn(&format!("Registro omitido: {skipped}"));
    }
    for warning in &batch.warnings {
        reporter.warn(warning);
    }
    summary.records_skipped += batch.skipped.len();
    batch
}

/// Ejecuta una pasada completa contra `store`.
pub async fn source_nodes<S, F>(
    client: &GuestyClient,
    store: &S,
    files: &F,
    reporter: &dyn Reporter,
    options: &SourceOptions,
) -> SourceSummary
where
    S: NodeStore + ?Sized,
    F: RemoteFileFactory,
{
    let mut summary = SourceSummary::default();

    let (listings, reviews) = tokio::join!(
        client.fetch_listings(&options.listing_fields),
        client.fetch_reviews()
    );

    let listings = collect_batch::<Listing>(listings, reporter, &mut summary);
    let reviews = collect_batch::<Review>(reviews, reporter, &mut summary);

    for mapped in &listings.nodes {
        store.create_node(mapped.node.clone());
    }
    summary.listings_created = listings.nodes.len();

    for mapped in reviews.nodes {
        store.create_node(mapped.node);
        summary.reviews_created += 1;
    }

    let attacher = ImageAttacher::new(files, options.image_mode, options.image_timeout);
    let outcomes = join_all(
        listings
            .nodes
            .iter()
            .map(|mapped| attacher.attach(&mapped.record, &mapped.node.id, store, reporter)),
    )
    .await;
    for outcome in outcomes {
        summary.files_attached += outcome.attached;
        summary.files_failed += outcome.failed;
    }

    info!("{summary}");
    summary
}
