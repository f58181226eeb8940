//! Modelos de dominio: registros tipados de la API de Guesty y el nodo `File`
//! derivado de cada imagen descargada.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Registro de la API que se convierte en un nodo del grafo.
pub trait SourceRecord: Serialize + DeserializeOwned {
    /// Tipo de nodo (`internal.type`).
    const NODE_TYPE: &'static str;

    /// Clave natural (`_id`) del registro.
    fn natural_key(&self) -> &str;

    /// Campos obligatorios en el esquema que la API no ha enviado.
    fn missing_required(&self) -> Vec<&'static str>;
}

/// Respuesta de `GET /listings`.
#[derive(Debug, Default, Deserialize)]
pub struct ListingsPage {
    #[serde(default)]
    pub results: Vec<Value>,
}

/// Respuesta de `GET /reviews-service/api/reviews`.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewsPage {
    #[serde(default)]
    pub data: Vec<Value>,
}

/// Un alojamiento (:Listing).
///
/// Los campos opcionales se decodifican de forma tolerante: un valor con un
/// tipo inesperado se convierte en `None` en lugar de invalidar el registro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub accommodates: Option<i64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub bedrooms: Option<i64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub beds: Option<i64>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub bathrooms: Option<f64>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub property_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub occupancy_stats: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub custom_fields: Option<Vec<CustomField>>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub prices: Option<Prices>,
    pub terms: Option<Value>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub amenities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub pictures: Option<Vec<Picture>>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub picture: Option<Picture>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub address: Option<Address>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub tags: Option<Vec<String>>,
    /// La API lo envía a veces como objeto suelto; siempre se guarda como lista.
    #[serde(default, deserialize_with = "lenient::one_or_many")]
    pub integrations: Option<Vec<Integration>>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub is_listed: Option<bool>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub public_description: Option<PublicDescription>,
}

impl Listing {
    /// URL de la miniatura principal, si existe.
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.picture.as_ref()?.thumbnail.as_deref()
    }

    /// URLs originales de todas las fotos, en orden.
    pub fn original_urls(&self) -> Vec<&str> {
        self.pictures
            .iter()
            .flatten()
            .filter_map(|p| p.original.as_deref())
            .collect()
    }
}

impl SourceRecord for Listing {
    const NODE_TYPE: &'static str = "Listing";

    fn natural_key(&self) -> &str {
        &self.id
    }

    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.bedrooms.is_none() {
            missing.push("bedrooms");
        }
        if self.title.is_none() {
            missing.push("title");
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prices {
    pub base_price: Option<f64>,
    pub currency: Option<String>,
    pub cleaning_fee: Option<f64>,
    pub security_deposit_fee: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub thumbnail: Option<String>,
    pub regular: Option<String>,
    pub large: Option<String>,
    pub caption: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub full: Option<String>,
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    pub platform: Option<String>,
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub airbnb: Option<Airbnb>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airbnb {
    pub star_rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub reviews_count: Option<i64>,
    pub import_calendar: Option<bool>,
    pub is_calendar_synced: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub field_id: Option<String>,
    pub value: Option<Value>,
    pub full_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicDescription {
    pub summary: Option<String>,
    pub space: Option<String>,
    pub access: Option<String>,
    pub neighborhood: Option<String>,
    pub transit: Option<String>,
    pub notes: Option<String>,
    pub house_rules: Option<String>,
    pub interaction_with_guests: Option<String>,
}

/// Una reseña (:Review) asociada a un listing por `listingId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::value")]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub listing_id: Option<String>,
    /// Acepta RFC 3339, fecha y hora sin zona o solo fecha (medianoche UTC).
    #[serde(default, deserialize_with = "lenient::datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub raw_review: Option<RawReview>,
}

impl SourceRecord for Review {
    const NODE_TYPE: &'static str = "Review";

    fn natural_key(&self) -> &str {
        &self.id
    }

    fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.channel_id.is_none() {
            missing.push("channelId");
        }
        if self.listing_id.is_none() {
            missing.push("listingId");
        }
        missing
    }
}

/// Reseña tal cual la entrega el canal (campos en snake_case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    pub overall_rating: Option<f64>,
    pub public_review: Option<String>,
    pub category_ratings_cleanliness: Option<f64>,
    pub category_ratings_accuracy: Option<f64>,
    pub category_ratings_communications: Option<f64>,
    pub category_ratings_location: Option<f64>,
    pub category_ratings_checkin: Option<f64>,
    pub category_ratings_value: Option<f64>,
}

/// Decodificadores tolerantes para campos opcionales.
mod lenient {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{de::DeserializeOwned, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(raw).ok())
    }

    /// Enteros, también cuando llegan como `4.0`.
    pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            _ => None,
        })
    }

    /// Lista de `T`; un objeto suelto se envuelve en una lista de uno.
    pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            items @ Value::Array(_) => serde_json::from_value(items).ok(),
            single => serde_json::from_value::<T>(single).ok().map(|item| vec![item]),
        })
    }

    pub fn datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Value::String(raw) = Value::deserialize(deserializer)? else {
            return Ok(None);
        };
        if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(at.with_timezone(&Utc)));
        }
        if let Ok(at) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Some(at.and_utc()));
        }
        Ok(NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc()))
    }
}

/// Representa un nodo (:File) creado a partir de una imagen remota.
/// Contiene metadatos básicos del fichero descargado en la caché local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: String,
    pub url: String,
    pub parent_id: String,
    pub path: String,
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
    pub content_digest: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_drops_unknown_fields_on_serialization() {
        let listing: Listing = serde_json::from_value(json!({
            "_id": "L1",
            "title": "Casa",
            "bedrooms": 2,
            "nickname": "casa-azul"
        }))
        .unwrap();

        let out = serde_json::to_value(&listing).unwrap();
        assert!(out.get("nickname").is_none());
        assert_eq!(out["_id"], "L1");
        assert_eq!(out["propertyType"], Value::Null);
    }

    #[test]
    fn missing_mandatory_fields_are_listed() {
        let listing: Listing = serde_json::from_value(json!({ "_id": "L1" })).unwrap();
        assert_eq!(listing.missing_required(), vec!["bedrooms", "title"]);

        let review: Review =
            serde_json::from_value(json!({ "_id": "R1", "channelId": "airbnb2" })).unwrap();
        assert_eq!(review.missing_required(), vec!["listingId"]);
    }

    #[test]
    fn picture_urls_follow_image_variants() {
        let listing: Listing = serde_json::from_value(json!({
            "_id": "L1",
            "picture": { "thumbnail": "https://img/thumb.jpg" },
            "pictures": [
                { "_id": "p1", "original": "https://img/1.jpg" },
                { "_id": "p2", "caption": "sin original" },
                { "_id": "p3", "original": "https://img/3.jpg" }
            ]
        }))
        .unwrap();

        assert_eq!(listing.thumbnail_url(), Some("https://img/thumb.jpg"));
        assert_eq!(listing.original_urls(), vec!["https://img/1.jpg", "https://img/3.jpg"]);
    }

    #[test]
    fn null_pictures_yield_no_urls() {
        let listing: Listing =
            serde_json::from_value(json!({ "_id": "L1", "pictures": null, "picture": null })).unwrap();
        assert!(listing.original_urls().is_empty());
        assert_eq!(listing.thumbnail_url(), None);
    }

    #[test]
    fn review_parses_created_at_and_raw_review() {
        let review: Review = serde_json::from_value(json!({
            "_id": "R1",
            "channelId": "airbnb2",
            "listingId": "L1",
            "createdAt": "2021-03-04T10:00:00.000Z",
            "rawReview": { "overall_rating": 5, "public_review": "Genial" }
        }))
        .unwrap();

        assert_eq!(review.listing_id.as_deref(), Some("L1"));
        assert!(review.created_at.is_some());
        assert_eq!(review.raw_review.unwrap().overall_rating, Some(5.0));
    }

    #[test]
    fn created_at_accepts_date_only_values() {
        let review: Review = serde_json::from_value(json!({
            "_id": "R1",
            "createdAt": "2021-03-04"
        }))
        .unwrap();
        assert_eq!(
            review.created_at.unwrap().to_rfc3339(),
            "2021-03-04T00:00:00+00:00"
        );

        let review: Review =
            serde_json::from_value(json!({ "_id": "R2", "createdAt": "ayer" })).unwrap();
        assert_eq!(review.created_at, None);
    }

    #[test]
    fn whole_floats_are_accepted_as_integers() {
        let listing: Listing = serde_json::from_value(json!({
            "_id": "L1",
            "accommodates": 4.0,
            "bedrooms": 2,
            "beds": 1.5
        }))
        .unwrap();
        assert_eq!(listing.accommodates, Some(4));
        assert_eq!(listing.bedrooms, Some(2));
        assert_eq!(listing.beds, None);
    }

    #[test]
    fn single_integration_object_becomes_a_list() {
        let listing: Listing = serde_json::from_value(json!({
            "_id": "L1",
            "integrations": { "platform": "airbnb2", "airbnb": { "reviewsCount": 12.0 } }
        }))
        .unwrap();
        let integrations = listing.integrations.unwrap();
        assert_eq!(integrations.len(), 1);
        assert_eq!(integrations[0].platform.as_deref(), Some("airbnb2"));
        assert_eq!(integrations[0].airbnb.as_ref().unwrap().reviews_count, Some(12));
    }
}
