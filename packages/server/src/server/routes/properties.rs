use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::common::{AppError, Page};
use crate::domains::listings::actions::{self, ImageUpload, MyListings};
use crate::domains::listings::models::{ListingSubmission, ListingUpdate, ListingView};
use crate::domains::listings::query::FeedParams;
use crate::server::app::AppState;
use crate::server::envelope::Reply;
use crate::server::middleware::Authenticated;

/// Ten images of a couple of megabytes each, plus the text fields.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_listing).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/feed", get(feed))
        .route("/my-listings", get(my_listings))
        .route(
            "/:id",
            get(get_listing).put(update_listing).delete(delete_listing),
        )
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::validation(format!("Invalid form data: {}", err.body_text()))
}

/// Split the form into text fields and image files.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(ListingSubmission, Vec<ImageUpload>), AppError> {
    let mut submission = ListingSubmission::default();
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "images" {
            let file_name = field.file_name().unwrap_or("image").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            images.push(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        let slot = match name.as_str() {
            "title" => &mut submission.title,
            "description" => &mut submission.description,
            "propertyType" => &mut submission.property_type,
            "isResaleProperty" => &mut submission.is_resale,
            "reraId" => &mut submission.rera_id,
            "price" => &mut submission.price,
            "location" => &mut submission.location,
            "details" => &mut submission.details,
            "amenities" => &mut submission.amenities,
            _ => continue,
        };
        *slot = Some(value);
    }

    Ok((submission, images))
}

async fn create_listing(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Reply<ListingView>, AppError> {
    let (submission, images) = read_form(multipart?).await?;
    let listing = actions::create_listing(&account, submission, images, &state.deps).await?;
    Ok(Reply::data(listing)
        .with_message("Listing created")
        .status(StatusCode::CREATED))
}

async fn feed(
    State(state): State<AppState>,
    params: Result<Query<FeedParams>, QueryRejection>,
) -> Result<Reply<Page<ListingView>>, AppError> {
    let Query(params) = params?;
    Ok(Reply::data(actions::feed(params, &state.deps).await?))
}

async fn my_listings(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
) -> Result<Reply<MyListings>, AppError> {
    Ok(Reply::data(actions::my_listings(&account, &state.deps).await?))
}

async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Reply<ListingView>, AppError> {
    Ok(Reply::data(actions::get_listing(&id, &state.deps).await?))
}

async fn update_listing(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(id): Path<String>,
    body: Result<Json<ListingUpdate>, JsonRejection>,
) -> Result<Reply<ListingView>, AppError> {
    let Json(update) = body?;
    let listing = actions::update_listing(&account, &id, update, &state.deps).await?;
    Ok(Reply::data(listing).with_message("Listing updated"))
}

async fn delete_listing(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(id): Path<String>,
) -> Result<Reply<()>, AppError> {
    actions::delete_listing(&account, &id, &state.deps).await?;
    Ok(Reply::message("Listing deleted"))
}
