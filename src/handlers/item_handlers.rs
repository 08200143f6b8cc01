use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use chrono::NaiveDate;
use mime::Mime;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    filter::{CardGrid, FilterQuery},
    models::{Category, ImageRef, ItemType},
    repositories::item_repository::{CreateItemData, UpdateItemData},
    storage::{is_allowed_image_type, MAX_IMAGE_SIZE_BYTES, MAX_IMAGE_SIZE_MB},
    validation::{validate_item_form, ItemForm},
    AppState,
};

#[derive(Debug)]
struct TempImageField {
    filename: Option<String>,
    content_type: Option<Mime>,
    data: Bytes,
}

#[derive(Deserialize)]
pub struct ListItemsParams {
    #[serde(rename = "type")]
    item_type: Option<String>,
}

#[derive(Deserialize)]
pub struct GridParams {
    search: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
}

fn parse_type_filter(raw: Option<&str>) -> Result<Option<ItemType>, Response> {
    match raw {
        None => Ok(None),
        Some("") => Ok(None),
        Some(value) => match ItemType::parse(value) {
            Some(item_type) => Ok(Some(item_type)),
            None => Err((StatusCode::BAD_REQUEST, "Invalid item type").into_response()),
        },
    }
}

/// Handler to list listings as JSON, optionally restricted to one type.
pub async fn list_items_handler(
    State(state): State<AppState>,
    Query(params): Query<ListItemsParams>,
) -> Response {
    let type_filter = match parse_type_filter(params.item_type.as_deref()) {
        Ok(filter) => filter,
        Err(response) => return response,
    };
    let items = state.items.fetch_items(type_filter).await;
    (StatusCode::OK, Json(items)).into_response()
}

/// Handler to get a single listing by its ID.
pub async fn get_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Response {
    match state.items.repository().get(item_id).await {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Item not found").into_response(),
        Err(e) => {
            error!(error = %e, item_id = %item_id, "Failed to fetch item");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch item").into_response()
        }
    }
}

/// Handler rendering the card grid as HTML, narrowed by the search box and
/// the category/type selects. A signed-in caller sees owner affordances on
/// their own cards.
pub async fn items_grid_handler(
    State(state): State<AppState>,
    Query(params): Query<GridParams>,
    user: Option<AuthenticatedUser>,
) -> Response {
    let type_filter = match parse_type_filter(params.item_type.as_deref()) {
        Ok(filter) => filter,
        Err(response) => return response,
    };
    let items = state.items.fetch_items(type_filter).await;
    let current_user_id = user.map(|u| u.0.id);

    let mut grid = CardGrid::build(&items, current_user_id, type_filter);
    grid.apply(&FilterQuery::new(params.search, params.category, None));
    Html(grid.to_html()).into_response()
}

/// Handler to create a new listing from a multipart form with an optional
/// image. The image is validated and uploaded before the document is
/// written; the listing never references an unresolved upload.
pub async fn create_item_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Response {
    let mut form = ItemForm::default();
    let mut collected_image: Option<TempImageField> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let field_name = match field.name() {
                    Some(name) => name.to_string(),
                    None => continue,
                };

                match field_name.as_str() {
                    "type" | "title" | "category" | "description" | "location" | "contact"
                    | "date" => {
                        let value = match field.text().await {
                            Ok(text) => text,
                            Err(e) => {
                                return (
                                    StatusCode::BAD_REQUEST,
                                    format!("Failed to read {field_name} field: {e}"),
                                )
                                    .into_response();
                            }
                        };
                        let trimmed = value.trim();
                        let value = (!trimmed.is_empty()).then(|| trimmed.to_string());
                        match field_name.as_str() {
                            "type" => form.item_type = value,
                            "title" => form.title = value,
                            "category" => form.category = value,
                            "description" => form.description = value,
                            "location" => form.location = value,
                            "contact" => form.contact = value,
                            "date" => form.date = value,
                            _ => {}
                        }
                    }
                    "image" => {
                        let filename = field.file_name().map(|s| s.to_string());
                        let content_type =
                            field.content_type().and_then(|s| s.parse::<Mime>().ok());
                        match field.bytes().await {
                            // An empty part means the file input was left blank.
                            Ok(data) if !data.is_empty() => {
                                collected_image = Some(TempImageField {
                                    filename,
                                    content_type,
                                    data,
                                });
                            }
                            Ok(_) => {}
                            Err(e) => {
                                return (
                                    StatusCode::BAD_REQUEST,
                                    format!("Failed to read image data: {e}"),
                                )
                                    .into_response();
                            }
                        }
                    }
                    _ => { /* Ignore */ }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Multipart processing error");
                if e.to_string().contains("body limit exceeded") {
                    return (StatusCode::PAYLOAD_TOO_LARGE, "Total upload size limit exceeded")
                        .into_response();
                }
                return (
                    StatusCode::BAD_REQUEST,
                    format!("Multipart processing error: {e}"),
                )
                    .into_response();
            }
        }
    }

    // --- Validation ---
    let errors = validate_item_form(&form);
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response();
    }

    let item_type = match form.item_type.as_deref().and_then(ItemType::parse) {
        Some(item_type) => item_type,
        None => {
            return (StatusCode::BAD_REQUEST, "Item type must be lost or found").into_response();
        }
    };

    let date = match form
        .date
        .as_deref()
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
    {
        Some(Ok(date)) => date,
        _ => {
            return (StatusCode::BAD_REQUEST, "Invalid date format, expected YYYY-MM-DD")
                .into_response();
        }
    };

    // --- Image validation and upload ---
    let mut image: Option<ImageRef> = None;
    if let Some(image_field) = collected_image {
        let mime = match image_field.content_type {
            Some(mime) if is_allowed_image_type(&mime) => mime,
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    "Only JPG, PNG, WEBP or GIF images are allowed",
                )
                    .into_response();
            }
        };
        if image_field.data.len() as u64 > MAX_IMAGE_SIZE_BYTES {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Image must be under {MAX_IMAGE_SIZE_MB} MB"),
            )
                .into_response();
        }

        let filename = image_field.filename.unwrap_or_else(|| "upload".to_string());
        match state
            .image_storage
            .upload(image_field.data, &filename, &mime)
            .await
        {
            Ok(upload) => image = Some(ImageRef::Upload(upload)),
            Err(e) => {
                error!(error = %e, filename = %filename, "Image upload failed during item creation");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Image upload failed")
                    .into_response();
            }
        }
    }

    // --- Document write ---
    let data = CreateItemData {
        item_type,
        title: form.title.unwrap_or_default(),
        category: Category::from_name(form.category.as_deref().unwrap_or("")),
        description: form.description.unwrap_or_default(),
        location: form.location.unwrap_or_default(),
        date,
        contact: form.contact,
        user_id: user.0.id,
        user_email: user.0.email.clone(),
        user_name: user.0.name_or_email_prefix(),
        user_photo: user.0.photo_url.clone(),
        image,
    };

    match state.items.repository().add(data).await {
        Ok(item) => {
            state.items.invalidate();
            info!(item_id = %item.id, user_id = %user.0.id, "Successfully created item");
            (StatusCode::CREATED, Json(item)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create item");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to post item").into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateItemPayload {
    title: String,
    category: String,
    description: String,
    location: String,
    date: String,
    contact: Option<String>,
}

/// Handler to update a listing. Owner-only; image and ownership are
/// immutable after creation.
pub async fn update_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateItemPayload>,
) -> Response {
    let form = ItemForm {
        item_type: None,
        title: Some(payload.title.trim().to_string()),
        category: Some(payload.category.clone()),
        description: Some(payload.description.trim().to_string()),
        location: Some(payload.location.trim().to_string()),
        contact: payload.contact.clone(),
        date: Some(payload.date.clone()),
    };
    let errors = validate_item_form(&form);
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response();
    }

    let date = match NaiveDate::parse_from_str(&payload.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return (StatusCode::BAD_REQUEST, "Invalid date format, expected YYYY-MM-DD")
                .into_response();
        }
    };

    // Authorization check against the stored document, not the rendered card.
    match state.items.repository().get(item_id).await {
        Ok(Some(item)) => {
            if item.user_id != user.0.id {
                warn!(item_id = %item_id, user_id = %user.0.id, owner_id = %item.user_id, "User attempted to update item they did not create");
                return (StatusCode::FORBIDDEN, "Permission denied").into_response();
            }
        }
        Ok(None) => return (StatusCode::NOT_FOUND, "Item not found").into_response(),
        Err(e) => {
            error!(error = %e, item_id = %item_id, "Failed to fetch item for update");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching item for update")
                .into_response();
        }
    }

    let update = UpdateItemData {
        title: form.title.unwrap_or_default(),
        category: Category::from_name(&payload.category),
        description: form.description.unwrap_or_default(),
        location: form.location.unwrap_or_default(),
        date,
        contact: form.contact,
    };

    match state.items.repository().update(item_id, update).await {
        Ok(Some(updated)) => {
            state.items.invalidate();
            info!(item_id = %updated.id, "Successfully updated item");
            (StatusCode::OK, Json(updated)).into_response()
        }
        Ok(None) => {
            warn!(item_id = %item_id, "Item not found during update despite passing owner check");
            (StatusCode::NOT_FOUND, "Item not found during update").into_response()
        }
        Err(e) => {
            error!(error = %e, item_id = %item_id, "Failed to update item");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update item").into_response()
        }
    }
}

/// Handler to delete a listing. Owner-only; deletion is permanent.
pub async fn delete_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Response {
    match state.items.repository().get(item_id).await {
        Ok(Some(item)) => {
            if item.user_id != user.0.id {
                warn!(item_id = %item_id, user_id = %user.0.id, owner_id = %item.user_id, "User attempted to delete item they did not create");
                return (StatusCode::FORBIDDEN, "Permission denied").into_response();
            }
        }
        Ok(None) => return (StatusCode::NOT_FOUND, "Item not found").into_response(),
        Err(e) => {
            error!(error = %e, item_id = %item_id, "Failed to check item owner before deletion");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error checking owner")
                .into_response();
        }
    }

    match state.items.repository().delete(item_id).await {
        Ok(true) => {
            state.items.invalidate();
            info!(item_id = %item_id, deleted_by = %user.0.id, "Successfully deleted item");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => {
            warn!(item_id = %item_id, "Attempted delete, but item was already gone");
            (StatusCode::NOT_FOUND, "Item not found").into_response()
        }
        Err(e) => {
            error!(error = %e, item_id = %item_id, "Failed to delete item");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete item").into_response()
        }
    }
}
