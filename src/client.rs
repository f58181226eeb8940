//! Cliente HTTP de la API de Guesty. Se construye explícitamente a partir de
//! [`ClientSettings`]; no hay valores por defecto globales.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
    auth::Credentials,
    config::ApiEndpoint,
    models::{ListingsPage, ReviewsPage},
};

pub const LISTINGS_PATH: &str = "listings";
pub const REVIEWS_PATH: &str = "reviews-service/api/reviews";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL inválida para '{path}': {source}")]
    Url {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("la petición a {url} falló: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} respondió con estado {status}")]
    Status { url: String, status: u16 },
    #[error("respuesta de {url} no decodificable: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Todo lo necesario para hablar con la API.
#[derive(Clone, Debug)]
pub struct ClientSettings {
    pub endpoint: ApiEndpoint,
    pub credentials: Credentials,
}

#[derive(Clone, Debug)]
pub struct GuestyClient {
    http: reqwest::Client,
    base_url: Url,
    account_id: Option<String>,
}

impl GuestyClient {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&settings.credentials.authorization())
            .context("La cabecera Authorization no es válida")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.endpoint.timeout)
            .build()
            .context("No se pudo construir el cliente HTTP")?;

        info!("Cliente Guesty listo para {}", settings.endpoint.base_url);
        Ok(Self {
            http,
            base_url: settings.endpoint.base_url.clone(),
            account_id: settings.endpoint.account_id.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET autenticado contra `path` (relativo a la URL base), devolviendo el
    /// cuerpo JSON decodificado. Si hay `accountId` configurado se añade a la
    /// consulta.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self.base_url.join(path).map_err(|source| FetchError::Url {
            path: path.to_string(),
            source,
        })?;
        debug!("GET {url}");

        let mut request = self.http.get(url.clone()).query(query);
        if let Some(account_id) = &self.account_id {
            request = request.query(&[("accountId", account_id)]);
        }

        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Listings de la cuenta. `fields` vacío pide todos los campos.
    pub async fn fetch_listings(&self, fields: &[String]) -> Result<Vec<Value>, FetchError> {
        let query = if fields.is_empty() {
            Vec::new()
        } else {
            vec![("fields", fields.join(" "))]
        };
        let page: ListingsPage = self.get_json(LISTINGS_PATH, &query).await?;
        info!("{} listings recibidos de Guesty", page.results.len());
        Ok(page.results)
    }

    pub async fn fetch_reviews(&self) -> Result<Vec<Value>, FetchError> {
        let page: ReviewsPage = self.get_json(REVIEWS_PATH, &[]).await?;
        info!("{} reviews recibidas de Guesty", page.data.len());
        Ok(page.data)
    }

    /// Petición mínima autenticada para comprobar las credenciales.
    pub async fn probe(&self) -> Result<(), FetchError> {
        self.get_json::<Value>(LISTINGS_PATH, &[("limit", "1".to_string())])
            .await
            .map(|_| ())
    }
}
