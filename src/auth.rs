//! Credenciales de la API de Guesty y construcción del token Basic.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Codifica `key:secret` en base64 para la cabecera `Authorization: Basic`.
pub fn basic_auth_token(key: &str, secret: &str) -> String {
    STANDARD.encode(format!("{key}:{secret}"))
}

/// Par clave/secreto ya validado.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn token(&self) -> String {
        basic_auth_token(&self.api_key, &self.api_secret)
    }

    /// Valor completo de la cabecera `Authorization`.
    pub fn authorization(&self) -> String {
        format!("Basic {}", self.token())
    }
}

// El secreto nunca debe acabar en los logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}
