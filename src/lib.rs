//! Fuente de datos Guesty para el grafo de contenido de un generador de
//! sitios estáticos: descarga listings y reviews, los convierte en nodos con
//! id estable y huella de contenido, enlaza sus imágenes como nodos `File` y
//! declara el esquema de tipos.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod client;
pub mod config;
pub mod images;
pub mod mapper;
pub mod models;
pub mod node;
pub mod report;
pub mod schema;
pub mod source;
pub mod store;
pub mod validate;
