//! Listing actions: publish, browse, fetch, edit, remove.

use serde::Serialize;
use tracing::info;

use crate::common::auth::{Actor, Capability, LISTING_PUBLISHERS};
use crate::common::{AppError, ListingId, Page};
use crate::domains::accounts::models::Account;
use crate::domains::listings::models::{
    Listing, ListingSubmission, ListingUpdate, ListingView, NewListing, MAX_IMAGES,
};
use crate::domains::listings::query::FeedParams;
use crate::kernel::ServerDeps;

/// Content types accepted for listing images.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];
const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// One image file from the multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn is_allowed(&self) -> bool {
        let content_type = self.content_type.to_ascii_lowercase();
        if ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return true;
        }
        // Some clients send application/octet-stream; fall back to the extension.
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
            && content_type == "application/octet-stream"
    }
}

fn check_images(images: &[ImageUpload]) -> Result<(), AppError> {
    if images.is_empty() {
        return Err(AppError::validation("At least one image is required"));
    }
    if images.len() > MAX_IMAGES {
        return Err(AppError::validation(format!(
            "At most {} images are allowed",
            MAX_IMAGES
        )));
    }
    if let Some(bad) = images.iter().find(|i| !i.is_allowed()) {
        return Err(AppError::validation(format!(
            "{} is not a supported image (jpg, jpeg, png, webp)",
            bad.file_name
        )));
    }
    Ok(())
}

/// Publish a new listing owned by the caller.
pub async fn create_listing(
    account: &Account,
    submission: ListingSubmission,
    images: Vec<ImageUpload>,
    deps: &ServerDeps,
) -> Result<ListingView, AppError> {
    Actor::from_account(account)
        .can(Capability::HoldRole(LISTING_PUBLISHERS))
        .check()?;

    let validated = submission.validate()?;
    check_images(&images)?;

    let mut urls = Vec::with_capacity(images.len());
    for image in images {
        let url = deps
            .images
            .upload(&image.file_name, &image.content_type, image.bytes)
            .await?;
        urls.push(url);
    }

    let new_listing = NewListing::builder()
        .title(validated.title)
        .description(validated.description)
        .property_type(validated.property_type)
        .is_resale(validated.is_resale)
        .rera_id(validated.rera_id)
        .location(validated.location)
        .price(validated.price)
        .details(validated.details)
        .images(urls)
        .amenities(validated.amenities)
        .owner_id(account.id)
        .created_at(deps.clock.now())
        .build();

    let listing = deps.listings.insert_listing(new_listing).await?;
    info!(listing_id = %listing.id, owner_id = %account.id, "Listing created");
    Ok(ListingView::bare(listing))
}

/// Public feed page.
pub async fn feed(params: FeedParams, deps: &ServerDeps) -> Result<Page<ListingView>, AppError> {
    let query = params.validate()?;
    let (rows, total) = deps.listings.search_listings(&query).await?;
    Ok(Page::new(rows, total, query.page).map(ListingView::with_owner_name))
}

fn parse_listing_id(raw: &str) -> Result<ListingId, AppError> {
    ListingId::parse(raw).map_err(|_| AppError::NotFound("Listing"))
}

/// Fetch one listing and count the view.
pub async fn get_listing(raw_id: &str, deps: &ServerDeps) -> Result<ListingView, AppError> {
    let id = parse_listing_id(raw_id)?;
    let row = deps
        .listings
        .record_listing_view(id)
        .await?
        .ok_or(AppError::NotFound("Listing"))?;
    Ok(ListingView::with_owner_contact(row))
}

async fn load_managed(
    account: &Account,
    raw_id: &str,
    deps: &ServerDeps,
) -> Result<Listing, AppError> {
    let id = parse_listing_id(raw_id)?;
    let listing = deps
        .listings
        .find_listing(id)
        .await?
        .ok_or(AppError::NotFound("Listing"))?;

    Actor::from_account(account)
        .can(Capability::ManageListing {
            owner_id: listing.owner_id,
        })
        .check()?;
    Ok(listing)
}

/// Apply whitelisted edits. Counters and ownership are never touched.
pub async fn update_listing(
    account: &Account,
    raw_id: &str,
    update: ListingUpdate,
    deps: &ServerDeps,
) -> Result<ListingView, AppError> {
    let listing = load_managed(account, raw_id, deps).await?;
    let changes = update.validate()?;
    if changes.is_empty() {
        return Err(AppError::validation("No updatable fields supplied"));
    }

    let updated = deps
        .listings
        .update_listing(listing.id, &changes, deps.clock.now())
        .await?
        .ok_or(AppError::NotFound("Listing"))?;

    info!(listing_id = %updated.id, actor = %account.id, "Listing updated");
    Ok(ListingView::bare(updated))
}

pub async fn delete_listing(
    account: &Account,
    raw_id: &str,
    deps: &ServerDeps,
) -> Result<(), AppError> {
    let listing = load_managed(account, raw_id, deps).await?;
    if !deps.listings.delete_listing(listing.id).await? {
        return Err(AppError::NotFound("Listing"));
    }
    info!(listing_id = %listing.id, actor = %account.id, "Listing deleted");
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct MyListings {
    pub count: usize,
    pub listings: Vec<ListingView>,
}

/// Everything the caller has listed, newest first.
pub async fn my_listings(account: &Account, deps: &ServerDeps) -> Result<MyListings, AppError> {
    let listings: Vec<ListingView> = deps
        .listings
        .find_listings_by_owner(account.id)
        .await?
        .into_iter()
        .map(ListingView::bare)
        .collect();

    Ok(MyListings {
        count: listings.len(),
        listings,
    })
}
