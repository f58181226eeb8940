//! Carga y gestión de configuración de la fuente Guesty (API + servidor de inspección).

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.guesty.com/api/v2/";

/// Campos pedidos a `/listings` cuando no se configura otra lista.
pub const DEFAULT_LISTING_FIELDS: &str = "_id accommodates bedrooms beds bathrooms propertyType title occupancyStats customFields active prices terms amenities pictures picture address integrations isListed publicDescription";

pub const API_KEY_OPTION: &str = "GUESTY_API_KEY";
pub const API_SECRET_OPTION: &str = "GUESTY_API_SECRET";
pub const ACCOUNT_ID_VAR: &str = "GUESTY_ACCOUNT_ID";

/// Qué imágenes de cada listing se convierten en nodos `File`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageMode {
    /// Una sola miniatura (`picture.thumbnail`) enlazada en el campo `thumbnail`.
    Thumbnail,
    /// Todas las fotos originales (`pictures[].original`) en el campo `picFiles`.
    Gallery,
    Disabled,
}

impl ImageMode {
    /// Nombre del campo de nodo donde se enlazan los ficheros.
    pub fn field_name(self) -> Option<&'static str> {
        match self {
            Self::Thumbnail => Some("thumbnail"),
            Self::Gallery => Some("picFiles"),
            Self::Disabled => None,
        }
    }
}

impl FromStr for ImageMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "thumbnail" => Ok(Self::Thumbnail),
            "gallery" => Ok(Self::Gallery),
            "none" | "off" => Ok(Self::Disabled),
            other => Err(anyhow!("Modo de imágenes no soportado: {other}")),
        }
    }
}

/// Punto de acceso a la API: URL base, límite de tiempo por petición y, si
/// la cuenta lo requiere, el `accountId` que acompaña a cada petición.
#[derive(Clone, Debug)]
pub struct ApiEndpoint {
    pub base_url: Url,
    pub timeout: Duration,
    pub account_id: Option<String>,
}

impl ApiEndpoint {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout,
            account_id: None,
        })
    }

    pub fn with_account_id(mut self, account_id: Option<String>) -> Self {
        self.account_id = account_id.filter(|id| !id.trim().is_empty());
        self
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub endpoint: ApiEndpoint,
    pub listing_fields: Vec<String>,
    pub image_mode: ImageMode,
    pub cache_dir: PathBuf,
    pub server_addr: String,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    ///
    /// Las credenciales ausentes no son un error aquí: las valida
    /// [`crate::validate::validate_options`] con mensajes por campo.
    pub fn from_env() -> Result<Self> {
        let api_key = read_credential(API_KEY_OPTION);
        let api_secret = read_credential(API_SECRET_OPTION);
        let account_id = read_credential(ACCOUNT_ID_VAR);

        let base_url = env::var("GUESTY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match env::var("GUESTY_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("GUESTY_HTTP_TIMEOUT_SECS no es un número: {raw}"))?,
            Err(_) => 30,
        };
        if timeout_secs == 0 {
            return Err(anyhow!("GUESTY_HTTP_TIMEOUT_SECS debe ser mayor que cero"));
        }

        let listing_fields = parse_fields(
            &env::var("GUESTY_LISTING_FIELDS").unwrap_or_else(|_| DEFAULT_LISTING_FIELDS.to_string()),
        );

        let image_mode: ImageMode = env::var("GUESTY_IMAGE_MODE")
            .unwrap_or_else(|_| "gallery".to_string())
            .parse()?;

        let cache_dir = match env::var("GUESTY_CACHE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::cache_dir()
                .unwrap_or_else(env::temp_dir)
                .join("guesty-source"),
        };

        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3322".to_string());

        Ok(Self {
            api_key,
            api_secret,
            endpoint: ApiEndpoint::new(&base_url, Duration::from_secs(timeout_secs))?
                .with_account_id(account_id),
            listing_fields,
            image_mode,
            cache_dir,
            server_addr,
        })
    }

    /// Opciones del plugin tal como las recibiría el validador; las claves
    /// ausentes no se incluyen.
    pub fn plugin_options(&self) -> Value {
        let mut options = Map::new();
        if let Some(key) = &self.api_key {
            options.insert(API_KEY_OPTION.to_string(), Value::String(key.clone()));
        }
        if let Some(secret) = &self.api_secret {
            options.insert(API_SECRET_OPTION.to_string(), Value::String(secret.clone()));
        }
        Value::Object(options)
    }
}

fn read_credential(name: &str) -> Option<String> {
    env::var(name)
        .or_else(|_| env::var(format!("GATSBY_{name}")))
        .ok()
}

/// Acepta campos separados por espacios o comas.
pub fn parse_fields(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// `Url::join` descarta el último segmento si la base no termina en `/`.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).with_context(|| format!("URL base de Guesty inválida: {raw}"))
}
