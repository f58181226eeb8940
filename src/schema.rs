//! Declaración de tipos (SDL) de los nodos Listing, Review y sus objetos
//! anidados, con los enlaces entre tipos que resuelve la capa de consultas.

use tracing::info;

use crate::{config::ImageMode, store::NodeStore};

const LISTING_FIELDS: &str = r#"
    _id: String!
    accommodates: Int
    bedrooms: Int!
    beds: Int
    bathrooms: Float
    propertyType: String
    title: String!
    occupancyStats: [JSON]
    active: Boolean
    prices: GuestyPrices
    terms: JSON
    amenities: [String]
    pictures: [GuestyPicture]
    picture: GuestyPicture
    address: GuestyAddress
    tags: [String]
    isListed: Boolean
    integrations: [GuestyIntegration]
    customFields: [GuestyCustomField]
    publicDescription: GuestyPublicDescription
    reviews: [Review] @link(by: "listingId", from: "_id")"#;

const NESTED_TYPES: &str = r#"
type GuestyPrices {
    basePrice: Float!
    currency: String!
    cleaningFee: Float
    securityDepositFee: Float
}

type GuestyPicture {
    _id: String
    thumbnail: String
    regular: String
    large: String
    caption: String
    original: String
}

type GuestyAddress {
    full: String
    lng: Float
    lat: Float
    street: String
    city: String
    country: String
}

type GuestyIntegration {
    platform: String
    _id: String
    airbnb: GuestyAirbnb
}

type GuestyAirbnb {
    starRating: Float
    reviewsCount: Int
    importCalendar: Boolean
    isCalendarSynced: Boolean
}

type GuestyCustomField {
    fieldId: String
    value: JSON
    fullText: String
}

type GuestyPublicDescription {
    summary: String
    space: String
    access: String
    neighborhood: String
    transit: String
    notes: String
    houseRules: String
    interactionWithGuests: String
}

type Review implements Node @dontInfer {
    _id: String!
    channelId: String!
    listingId: String!
    createdAt: Date @dateformat
    rawReview: GuestyRawReview
    listing: Listing @link(by: "_id", from: "listingId")
}

type GuestyRawReview {
    overall_rating: Float
    public_review: String
    category_ratings_cleanliness: Float
    category_ratings_accuracy: Float
    category_ratings_communications: Float
    category_ratings_location: Float
    category_ratings_checkin: Float
    category_ratings_value: Float
}
"#;

/// Campo de `Listing` que enlaza los nodos `File`, según el modo de imágenes.
fn file_link(mode: ImageMode) -> Option<String> {
    let field = mode.field_name()?;
    Some(match mode {
        ImageMode::Thumbnail => format!("    {field}: File @link(from: \"fields.{field}\")"),
        _ => format!("    {field}: [File] @link(from: \"fields.{field}\")"),
    })
}

/// SDL completo para el modo de imágenes dado.
pub fn type_definitions(mode: ImageMode) -> String {
    let mut listing = format!("type Listing implements Node @dontInfer {{{LISTING_FIELDS}\n");
    if let Some(link) = file_link(mode) {
        listing.push_str(&link);
        listing.push('\n');
    }
    listing.push('}');
    format!("{listing}\n{NESTED_TYPES}")
}

/// Registra los tipos en el almacén. Solo metadatos: no descarga ni valida.
pub fn declare<S: NodeStore + ?Sized>(store: &S, mode: ImageMode) {
    store.create_types(&type_definitions(mode));
    info!("Esquema de Listing/Review declarado (imágenes: {mode:?}).");
}
