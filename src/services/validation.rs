//! Structural checks on proposed payloads, applied at submission time and
//! again whenever a pending request is revised.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::db::models::catalog::{CatalogKind, CatalogStatus, SizeOption};
use crate::db::models::requests::{Payload, RequestAction, RequestEntity};
use crate::utils::error::{AppError, AppResult};

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// A category reference given either as a bare id or as `{ "id": ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(Uuid),
    Object { id: Uuid },
}

impl CategoryRef {
    pub fn id(self) -> Uuid {
        match self {
            CategoryRef::Id(id) | CategoryRef::Object { id } => id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub size_options: Option<Vec<SizeOption>>,
    pub images: Option<Vec<String>>,
    pub category: Option<CategoryRef>,
    pub status: Option<CatalogStatus>,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CategoryPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<CatalogStatus>,
    pub store_status: Option<CatalogStatus>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ToppingPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub extra_price: Option<i64>,
    pub status: Option<CatalogStatus>,
    pub store_status: Option<CatalogStatus>,
    pub topping_id: Option<Uuid>,
}

/// Deserialize a stored payload into one of the typed views above.
pub fn parse_payload<T: DeserializeOwned>(entity: RequestEntity, payload: &Payload) -> AppResult<T> {
    serde_json::from_value(Value::Object(payload.clone())).map_err(|e| {
        AppError::validation(format!("Invalid {} payload: {}", entity.as_str(), e))
    })
}

/// Validate and normalise `payload` for `(entity, action)`.
///
/// The returned payload is what gets stored: product category references are
/// flattened to a bare id and the product price is raised to the cheapest
/// size option when it is missing or below it.
pub fn validate_payload(
    entity: RequestEntity,
    action: RequestAction,
    payload: &Payload,
) -> AppResult<Payload> {
    if action == RequestAction::Update && payload.is_empty() {
        return Err(AppError::validation("Update payload must not be empty"));
    }
    if action == RequestAction::Delete {
        return Ok(payload.clone());
    }
    if action == RequestAction::Update {
        if let Some(id_key) = write_back_key(entity) {
            if payload.keys().all(|key| key == id_key) {
                return Err(AppError::validation(format!(
                    "Update payload has no applicable fields besides {}",
                    id_key
                )));
            }
        }
    }

    match entity {
        RequestEntity::Product => validate_product(action, payload),
        RequestEntity::Category => validate_category(action, payload),
        RequestEntity::Topping => validate_topping(action, payload),
        RequestEntity::Order | RequestEntity::Payment => Ok(payload.clone()),
    }
}

/// Id field that approval writes back into a create payload.
fn write_back_key(entity: RequestEntity) -> Option<&'static str> {
    match entity {
        RequestEntity::Product => Some("productId"),
        RequestEntity::Category => Some("categoryId"),
        RequestEntity::Topping => Some("toppingId"),
        RequestEntity::Order | RequestEntity::Payment => None,
    }
}

fn validate_product(action: RequestAction, payload: &Payload) -> AppResult<Payload> {
    let parsed: ProductPayload = parse_payload(RequestEntity::Product, payload)?;
    let mut normalized = payload.clone();

    check_name(parsed.name.as_deref(), action == RequestAction::Create)?;
    check_description(parsed.description.as_deref())?;

    if let Some(price) = parsed.price {
        if price < 0 {
            return Err(AppError::validation("price must not be negative"));
        }
    }

    if let Some(images) = &parsed.images {
        for image in images {
            check_uri(image, "image")?;
        }
    }

    if let Some(category) = parsed.category {
        normalized.insert("category".to_string(), Value::String(category.id().to_string()));
    }

    let sizes = parsed.size_options.as_deref().unwrap_or_default();
    let mut seen: Vec<&str> = Vec::with_capacity(sizes.len());
    for option in sizes {
        let size = option.size.trim();
        if size.is_empty() {
            return Err(AppError::validation("sizeOptions entries need a size"));
        }
        if option.price < 0 {
            return Err(AppError::validation(format!(
                "sizeOptions price for '{}' must not be negative",
                size
            )));
        }
        if seen.contains(&size) {
            return Err(AppError::validation(format!("Duplicate size option '{}'", size)));
        }
        seen.push(size);
    }

    if let Some(min_price) = sizes.iter().map(|o| o.price).min() {
        if parsed.price.map_or(true, |price| price < min_price) {
            normalized.insert("price".to_string(), Value::from(min_price));
        }
    } else if action == RequestAction::Create && parsed.price.is_none() {
        return Err(AppError::validation("price or sizeOptions is required"));
    }

    Ok(normalized)
}

fn validate_category(action: RequestAction, payload: &Payload) -> AppResult<Payload> {
    let parsed: CategoryPayload = parse_payload(RequestEntity::Category, payload)?;
    let linking = parsed.category_id.is_some();

    check_name(parsed.name.as_deref(), action == RequestAction::Create && !linking)?;
    check_description(parsed.description.as_deref())?;
    check_status(CatalogKind::Category, parsed.status)?;
    check_status(CatalogKind::Category, parsed.store_status)?;

    Ok(payload.clone())
}

fn validate_topping(action: RequestAction, payload: &Payload) -> AppResult<Payload> {
    let parsed: ToppingPayload = parse_payload(RequestEntity::Topping, payload)?;
    let linking = parsed.topping_id.is_some();

    check_name(parsed.name.as_deref(), action == RequestAction::Create && !linking)?;
    check_description(parsed.description.as_deref())?;
    check_status(CatalogKind::Topping, parsed.status)?;
    check_status(CatalogKind::Topping, parsed.store_status)?;

    if parsed.extra_price.is_some_and(|price| price < 0) {
        return Err(AppError::validation("extraPrice must not be negative"));
    }

    Ok(payload.clone())
}

fn check_name(name: Option<&str>, required: bool) -> AppResult<()> {
    match name.map(str::trim) {
        None if required => Err(AppError::validation("name is required")),
        Some("") => Err(AppError::validation("name must not be empty")),
        Some(name) if name.chars().count() > MAX_NAME_LEN => Err(AppError::validation(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        ))),
        _ => Ok(()),
    }
}

fn check_description(description: Option<&str>) -> AppResult<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(AppError::validation(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        ))),
        _ => Ok(()),
    }
}

fn check_status(kind: CatalogKind, status: Option<CatalogStatus>) -> AppResult<()> {
    match status {
        Some(status) if !kind.supports_status(status) => Err(AppError::validation(format!(
            "Status '{}' is not valid for a {}",
            status.as_str(),
            kind.as_str()
        ))),
        _ => Ok(()),
    }
}

fn check_uri(value: &str, what: &str) -> AppResult<()> {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => Err(AppError::validation(format!("Invalid {} URL: {}", what, value))),
    }
}

/// Attachments are links to supporting documents.
pub fn validate_attachments(attachments: &[String]) -> AppResult<()> {
    attachments.iter().try_for_each(|a| check_uri(a, "attachment"))
}

/// Trim tags and drop empty ones and repeats.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn price_defaults_to_cheapest_size() {
        let payload = map(json!({
            "name": "Trà Sữa Trân Châu",
            "sizeOptions": [{ "size": "S", "price": 20000 }, { "size": "L", "price": 30000 }]
        }));
        let out = validate_payload(RequestEntity::Product, RequestAction::Create, &payload).unwrap();
        assert_eq!(out["price"], json!(20000));
    }

    #[test]
    fn price_below_cheapest_size_is_raised() {
        let payload = map(json!({
            "name": "Matcha",
            "price": 5000,
            "sizeOptions": [{ "size": "M", "price": 28000 }, { "size": "L", "price": 35000 }]
        }));
        let out = validate_payload(RequestEntity::Product, RequestAction::Create, &payload).unwrap();
        assert_eq!(out["price"], json!(28000));
    }

    #[test]
    fn explicit_price_above_minimum_is_kept() {
        let payload = map(json!({
            "name": "Matcha",
            "price": 40000,
            "sizeOptions": [{ "size": "M", "price": 28000 }]
        }));
        let out = validate_payload(RequestEntity::Product, RequestAction::Create, &payload).unwrap();
        assert_eq!(out["price"], json!(40000));
    }

    #[test]
    fn product_create_needs_name_and_price() {
        let no_name = map(json!({ "price": 25000 }));
        assert!(validate_payload(RequestEntity::Product, RequestAction::Create, &no_name).is_err());

        let no_price = map(json!({ "name": "Trà Đào" }));
        let err = validate_payload(RequestEntity::Product, RequestAction::Create, &no_price).unwrap_err();
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn product_rejects_unknown_fields_and_bad_images() {
        let unknown = map(json!({ "name": "X", "price": 1, "colour": "red" }));
        assert!(validate_payload(RequestEntity::Product, RequestAction::Create, &unknown).is_err());

        let bad_image = map(json!({ "name": "X", "price": 1, "images": ["not a url"] }));
        assert!(validate_payload(RequestEntity::Product, RequestAction::Create, &bad_image).is_err());

        let ftp_image = map(json!({ "name": "X", "price": 1, "images": ["ftp://cdn.example.com/a.png"] }));
        assert!(validate_payload(RequestEntity::Product, RequestAction::Create, &ftp_image).is_err());
    }

    #[test]
    fn category_reference_is_flattened() {
        let id = Uuid::new_v4();
        let payload = map(json!({ "name": "X", "price": 1, "category": { "id": id } }));
        let out = validate_payload(RequestEntity::Product, RequestAction::Create, &payload).unwrap();
        assert_eq!(out["category"], json!(id.to_string()));
    }

    #[test]
    fn duplicate_sizes_are_rejected() {
        let payload = map(json!({
            "name": "X",
            "sizeOptions": [{ "size": "M", "price": 1 }, { "size": "M", "price": 2 }]
        }));
        assert!(validate_payload(RequestEntity::Product, RequestAction::Create, &payload).is_err());
    }

    #[test]
    fn update_payload_must_not_be_empty() {
        let err = validate_payload(RequestEntity::Category, RequestAction::Update, &Payload::new()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn category_cannot_be_out_of_stock() {
        let payload = map(json!({ "storeStatus": "out_of_stock" }));
        assert!(validate_payload(RequestEntity::Category, RequestAction::Update, &payload).is_err());
    }

    #[test]
    fn linking_existing_topping_needs_no_name() {
        let payload = map(json!({ "toppingId": Uuid::new_v4() }));
        assert!(validate_payload(RequestEntity::Topping, RequestAction::Create, &payload).is_ok());
        assert!(validate_payload(RequestEntity::Topping, RequestAction::Create, &Payload::new()).is_err());
    }

    #[test]
    fn update_with_only_the_id_field_is_rejected() {
        let topping = map(json!({ "toppingId": Uuid::new_v4() }));
        let err = validate_payload(RequestEntity::Topping, RequestAction::Update, &topping).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let category = map(json!({ "categoryId": Uuid::new_v4() }));
        assert!(validate_payload(RequestEntity::Category, RequestAction::Update, &category).is_err());

        let renamed = map(json!({ "categoryId": Uuid::new_v4(), "name": "Renamed" }));
        assert!(validate_payload(RequestEntity::Category, RequestAction::Update, &renamed).is_ok());
    }

    #[test]
    fn order_payloads_pass_through() {
        let payload = map(json!({ "orderId": "abc", "amount": 10 }));
        let out = validate_payload(RequestEntity::Order, RequestAction::RefundPartial, &payload).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = vec![" menu ".to_string(), "menu".to_string(), "".to_string(), "tet".to_string()];
        assert_eq!(normalize_tags(tags), vec!["menu".to_string(), "tet".to_string()]);
    }
}
