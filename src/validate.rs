//! Validación de las opciones del plugin en dos fases: forma (ambos campos
//! presentes y de tipo texto) y comprobación en vivo contra la API. La
//! segunda fase solo se ejecuta si la primera pasa.

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    auth::Credentials,
    client::{ClientSettings, GuestyClient},
    config::{ApiEndpoint, API_KEY_OPTION, API_SECRET_OPTION},
};

pub const API_KEY_HELP: &str = "Your API key is incorrect, try checking https://support.guesty.com/kb/en/article/generating-an-internal-api-token for help";

pub const PROBE_FAILED: &str =
    "Cannot access Guesty API with the provided access token. Double check they are correct and try again!";

/// Opciones que acepta la fuente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PluginOptions {
    /// Used as username for basic auth token
    #[serde(rename = "GUESTY_API_KEY")]
    pub api_key: String,
    /// Used as password for basic auth token
    #[serde(rename = "GUESTY_API_SECRET")]
    pub api_secret: String,
}

impl PluginOptions {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.api_key.clone(), self.api_secret.clone())
    }
}

/// JSON Schema publicado de las opciones.
pub fn options_schema() -> Value {
    serde_json::to_value(schema_for!(PluginOptions)).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub options: Option<PluginOptions>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.options.is_some()
    }

    fn invalid(errors: Vec<String>) -> Self {
        Self {
            options: None,
            errors,
        }
    }
}

fn required_field<'a>(options: &'a Value, name: &str, errors: &mut Vec<String>) -> Option<&'a str> {
    match options.get(name) {
        Some(Value::String(value)) => Some(value.as_str()),
        None if name == API_KEY_OPTION => {
            errors.push(format!("\"{name}\" is required. {API_KEY_HELP}"));
            None
        }
        _ => {
            errors.push(format!("\"{name}\" is required"));
            None
        }
    }
}

/// Fase 1: un error por campo ausente o que no es texto.
pub fn check_shape(options: &Value) -> Result<PluginOptions, Vec<String>> {
    let mut errors = Vec::new();
    let api_key = required_field(options, API_KEY_OPTION, &mut errors);
    let api_secret = required_field(options, API_SECRET_OPTION, &mut errors);

    match (api_key, api_secret) {
        (Some(key), Some(secret)) => Ok(PluginOptions {
            api_key: key.to_string(),
            api_secret: secret.to_string(),
        }),
        _ => Err(errors),
    }
}

/// Fase 2: una petición autenticada real. Cualquier fallo es un único error.
pub async fn probe_credentials(options: &PluginOptions, endpoint: &ApiEndpoint) -> Result<(), String> {
    let settings = ClientSettings {
        endpoint: endpoint.clone(),
        credentials: options.credentials(),
    };
    let client = GuestyClient::new(&settings).map_err(|err| {
        warn!("No se pudo preparar la comprobación de credenciales: {err:#}");
        PROBE_FAILED.to_string()
    })?;

    client.probe().await.map_err(|err| {
        warn!("Comprobación de credenciales fallida: {err}");
        PROBE_FAILED.to_string()
    })
}

/// Valida las opciones tal como llegan de la configuración.
pub async fn validate_options(options: &Value, endpoint: &ApiEndpoint) -> ValidationResult {
    let parsed = match check_shape(options) {
        Ok(parsed) => parsed,
        Err(errors) => return ValidationResult::invalid(errors),
    };

    if let Err(error) = probe_credentials(&parsed, endpoint).await {
        return ValidationResult::invalid(vec![error]);
    }

    info!("Credenciales de Guesty verificadas.");
    ValidationResult {
        options: Some(parsed),
        errors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    // Si la fase en vivo se ejecutara contra este endpoint aparecería PROBE_FAILED.
    fn unreachable() -> ApiEndpoint {
        ApiEndpoint::new("http://127.0.0.1:9/api/v2/", Duration::from_millis(200)).unwrap()
    }

    #[tokio::test]
    async fn wrong_types_yield_one_required_error_per_field() {
        let options = json!({ "GUESTY_API_KEY": true, "GUESTY_API_SECRET": null });
        let result = validate_options(&options, &unreachable()).await;

        assert!(!result.is_valid());
        assert_eq!(
            result.errors,
            vec![
                "\"GUESTY_API_KEY\" is required".to_string(),
                "\"GUESTY_API_SECRET\" is required".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_key_gets_field_specific_message() {
        let options = json!({ "GUESTY_API_SECRET": "secret" });
        let result = validate_options(&options, &unreachable()).await;

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("\"GUESTY_API_KEY\" is required"));
        assert!(result.errors[0].contains("generating-an-internal-api-token"));
    }

    #[tokio::test]
    async fn missing_secret_is_reported_alone() {
        let options = json!({ "GUESTY_API_KEY": "key" });
        let result = validate_options(&options, &unreachable()).await;
        assert_eq!(result.errors, vec!["\"GUESTY_API_SECRET\" is required".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_api_is_a_single_probe_error() {
        let options = json!({ "GUESTY_API_KEY": "key", "GUESTY_API_SECRET": "secret" });
        let result = validate_options(&options, &unreachable()).await;

        assert!(!result.is_valid());
        assert_eq!(result.errors, vec![PROBE_FAILED.to_string()]);
    }

    #[test]
    fn shape_check_accepts_strings() {
        let options = json!({ "GUESTY_API_KEY": "user API key", "GUESTY_API_SECRET": "user API secret" });
        let parsed = check_shape(&options).unwrap();
        assert_eq!(parsed.credentials(), Credentials::new("user API key", "user API secret"));
    }

    #[test]
    fn options_schema_lists_both_fields_as_required() {
        let schema = options_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("GUESTY_API_KEY")));
        assert!(required.contains(&json!("GUESTY_API_SECRET")));
        assert_eq!(
            schema["properties"]["GUESTY_API_KEY"]["description"],
            "Used as username for basic auth token"
        );
    }
}
