//! `/api/v1/images` routes.
//!
//! Reads are public; writes go through the authorization gateway with the
//! `Admin` role.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{Authenticator, AuthorizationIdentity, Role};
use crate::catalog::{validate_name, Format, Image, ImageList, ImagesService, NewImage, Order, Paging};
use crate::error::Error;
use crate::http::error::ApiError;
use crate::http::middleware::{authorize, AuthorizeState};

#[derive(Clone)]
struct ImagesState {
    service: Arc<dyn ImagesService>,
}

pub fn images_router(service: Arc<dyn ImagesService>, authenticator: Arc<dyn Authenticator>) -> Router {
    let admin_only = middleware::from_fn_with_state(AuthorizeState::new(authenticator, Role::Admin), authorize);

    Router::new()
        .route(
            "/",
            get(fetch_images).merge(post(add_image).route_layer(admin_only.clone())),
        )
        .route(
            "/{image_id}",
            get(fetch_image).merge(patch(update_image).delete(delete_image).route_layer(admin_only)),
        )
        .with_state(ImagesState { service })
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    page: Option<String>,
    size: Option<String>,
    order: Option<String>,
}

async fn fetch_images(
    State(state): State<ImagesState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ImageList>, ApiError> {
    let paging = Paging::from_query(query.page.as_deref(), query.size.as_deref());
    let order = Order::parse_or(query.order.as_deref(), Order::Descending);
    let list = state.service.list(paging, order).await?;
    Ok(Json(list))
}

async fn fetch_image(
    State(state): State<ImagesState>,
    Path(image_id): Path<String>,
) -> Result<Json<Image>, ApiError> {
    let image = state.service.get_one(&image_id).await?;
    Ok(Json(image))
}

async fn add_image(
    State(state): State<ImagesState>,
    identity: AuthorizationIdentity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Image>), ApiError> {
    let upload = read_upload(multipart).await?;
    let image = state.service.upload(&identity, upload).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn update_image(
    State(state): State<ImagesState>,
    Path(image_id): Path<String>,
    identity: AuthorizationIdentity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Image>, ApiError> {
    let upload = read_upload(multipart).await?;
    let image = state.service.update(&identity, &image_id, upload).await?;
    Ok(Json(image))
}

async fn delete_image(
    State(state): State<ImagesState>,
    Path(image_id): Path<String>,
    identity: AuthorizationIdentity,
) -> Result<StatusCode, ApiError> {
    state.service.delete(&identity, &image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Read `name`, `format`, `originalFile` and `croppedFile` from a multipart
/// body. Unknown fields are skipped.
async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<NewImage, Error> {
    let malformed = |e: &dyn std::fmt::Display| {
        tracing::debug!(error = %e, "Rejected multipart body");
        Error::invalid_argument("failed parsing multipart form data")
    };

    let mut multipart = multipart.map_err(|e| malformed(&e))?;
    let mut name = None;
    let mut format = None;
    let mut original = None;
    let mut cropped = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| malformed(&e))? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("name") => name = Some(field.text().await.map_err(|e| malformed(&e))?),
            Some("format") => format = Some(field.text().await.map_err(|e| malformed(&e))?),
            Some("originalFile") => original = Some(field.bytes().await.map_err(|e| malformed(&e))?),
            Some("croppedFile") => cropped = Some(field.bytes().await.map_err(|e| malformed(&e))?),
            _ => {}
        }
    }

    let original = original.ok_or_else(|| Error::invalid_argument("missing originalFile"))?;
    let cropped = cropped.ok_or_else(|| Error::invalid_argument("missing croppedFile"))?;
    let name = name.unwrap_or_default();
    validate_name(&name)?;
    let format: Format = format.unwrap_or_default().parse()?;

    let upload = NewImage {
        name,
        format,
        original: original.to_vec(),
        cropped: cropped.to_vec(),
    };
    upload.validate()?;
    Ok(upload)
}
