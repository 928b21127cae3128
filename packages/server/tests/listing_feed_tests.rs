//! Integration tests for listing CRUD and the feed query engine.

mod common;

use chrono::Duration;
use common::{admin, buyer, create_listing, listing_form, seller, ListingSeed, Part, TestHarness};
use marketplace_core::common::ListingId;
use marketplace_core::domains::listings::models::ListingChanges;
use marketplace_core::kernel::{BaseClock, BaseListingStore};
use serde_json::{json, Value};
use test_context::test_context;

const PUNE: (f64, f64) = (18.5204, 73.8567);

fn titles(response: &common::ApiResponse) -> Vec<String> {
    response
        .get("data.items")
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|item: Value| item["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

// ============================================================================
// Create
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_seller_creates_listing_with_images(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;

    let response = ctx
        .api()
        .post_multipart("/properties", listing_form(&ListingSeed::default()), Some(&token))
        .await;

    assert_eq!(response.status, 201, "{:?}", response.body);
    assert_eq!(response.get("data.title"), "Sea facing 2BHK");
    assert_eq!(response.get("data.status"), "Available");
    assert_eq!(response.get("data.isResaleProperty"), false);
    assert_eq!(response.get("data.viewCount"), 0);
    assert_eq!(response.get("data.price.currency"), "INR");
    assert_eq!(response.get("data.location.city"), "Mumbai");
    assert_eq!(response.get("data.amenities.1"), "Parking");

    let uploads = ctx.images().uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].file_name, "front.jpg");

    let images = response.get("data.images");
    assert_eq!(images.as_array().unwrap().len(), 2);
    assert!(images[0].as_str().unwrap().ends_with("front.jpg"));
    assert_eq!(response.get("data.thumbnail"), images[0]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_create_requires_publisher_role(ctx: &TestHarness) {
    let api = ctx.api();
    let form = || listing_form(&ListingSeed::default());

    let anonymous = api.post_multipart("/properties", form(), None).await;
    assert_eq!(anonymous.status, 401);

    let token = buyer(ctx, "b@example.com").await;
    let as_buyer = api.post_multipart("/properties", form(), Some(&token)).await;
    assert_eq!(as_buyer.status, 403);
    assert_eq!(as_buyer.error_code(), "forbidden");

    assert!(ctx.images().uploads().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_create_validates_form(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let api = ctx.api();

    let without_images: Vec<Part> = listing_form(&ListingSeed::default())
        .into_iter()
        .filter(|p| !matches!(p, Part::File { .. }))
        .collect();
    let response = api.post_multipart("/properties", without_images, Some(&token)).await;
    assert_eq!(response.status, 400);
    assert_eq!(response.error_code(), "validation_error");

    let mut gif = listing_form(&ListingSeed::default());
    gif.push(Part::image("anim.gif", "image/gif"));
    let response = api.post_multipart("/properties", gif, Some(&token)).await;
    assert_eq!(response.status, 400);

    let mut eleven = listing_form(&ListingSeed::default());
    for i in 0..9 {
        eleven.push(Part::image(&format!("extra{}.webp", i), "image/webp"));
    }
    let response = api.post_multipart("/properties", eleven, Some(&token)).await;
    assert_eq!(response.status, 400);

    let without_title: Vec<Part> = listing_form(&ListingSeed::default())
        .into_iter()
        .filter(|p| !matches!(p, Part::Text("title", _)))
        .collect();
    let response = api.post_multipart("/properties", without_title, Some(&token)).await;
    assert_eq!(response.status, 400);

    let mut bad_price = listing_form(&ListingSeed::default());
    bad_price.retain(|p| !matches!(p, Part::Text("price", _)));
    bad_price.push(Part::text("price", "{not json"));
    let response = api.post_multipart("/properties", bad_price, Some(&token)).await;
    assert_eq!(response.status, 400);

    let mut bad_type = listing_form(&ListingSeed::default());
    bad_type.retain(|p| !matches!(p, Part::Text("propertyType", _)));
    bad_type.push(Part::text("propertyType", "Castle"));
    let response = api.post_multipart("/properties", bad_type, Some(&token)).await;
    assert_eq!(response.status, 400);

    assert!(ctx.images().uploads().is_empty());
}

// ============================================================================
// Feed
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_feed_defaults_to_available_newest_first(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let api = ctx.api();

    let first = create_listing(api, &token, ListingSeed { title: "First", ..Default::default() }).await;
    ctx.clock().advance(Duration::minutes(1));
    create_listing(api, &token, ListingSeed { title: "Second", ..Default::default() }).await;
    ctx.clock().advance(Duration::minutes(1));
    create_listing(api, &token, ListingSeed { title: "Third", ..Default::default() }).await;

    let sold = api
        .put(&format!("/properties/{}", first), json!({ "status": "Sold" }), Some(&token))
        .await;
    assert_eq!(sold.status, 200);

    let feed = api.get("/properties/feed", None).await;
    assert_eq!(feed.status, 200);
    assert_eq!(titles(&feed), vec!["Third", "Second"]);
    assert_eq!(feed.get("data.total"), 2);
    assert_eq!(feed.get("data.items.0.owner.firstName"), "Asha");
    assert!(feed.get("data.items.0.owner.contactNumber").is_null());

    let sold_feed = api.get("/properties/feed?status=sold", None).await;
    assert_eq!(titles(&sold_feed), vec!["First"]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_feed_filters(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let api = ctx.api();

    create_listing(
        api,
        &token,
        ListingSeed {
            title: "Budget studio",
            price: 3_000_000,
            bedrooms: 1,
            ..Default::default()
        },
    )
    .await;
    create_listing(
        api,
        &token,
        ListingSeed {
            title: "Family villa",
            property_type: "Villa",
            price: 25_000_000,
            bedrooms: 4,
            city: "Pune",
            lat: PUNE.0,
            lng: PUNE.1,
        },
    )
    .await;
    create_listing(
        api,
        &token,
        ListingSeed {
            title: "Mid-range flat",
            price: 9_000_000,
            bedrooms: 2,
            ..Default::default()
        },
    )
    .await;

    let by_city = api.get("/properties/feed?city=pune", None).await;
    assert_eq!(titles(&by_city), vec!["Family villa"]);

    let by_type = api.get("/properties/feed?propertyType=villa", None).await;
    assert_eq!(titles(&by_type), vec!["Family villa"]);

    let by_price = api
        .get("/properties/feed?minPrice=5000000&maxPrice=10000000", None)
        .await;
    assert_eq!(titles(&by_price), vec!["Mid-range flat"]);

    let by_bedrooms = api
        .get("/properties/feed?bedrooms=2&sortBy=bedrooms&order=asc", None)
        .await;
    assert_eq!(titles(&by_bedrooms), vec!["Mid-range flat", "Family villa"]);

    let by_search = api.get("/properties/feed?search=STUDIO", None).await;
    assert_eq!(titles(&by_search), vec!["Budget studio"]);

    let by_description = api.get("/properties/feed?search=station", None).await;
    assert_eq!(by_description.get("data.total"), 3);

    let by_price_asc = api
        .get("/properties/feed?sortBy=price&order=asc", None)
        .await;
    assert_eq!(
        titles(&by_price_asc),
        vec!["Budget studio", "Mid-range flat", "Family villa"]
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_city_filter_matches_whole_name(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let api = ctx.api();

    create_listing(api, &token, ListingSeed { title: "Central", ..Default::default() }).await;
    create_listing(
        api,
        &token,
        ListingSeed {
            title: "Suburb",
            city: "Mumbai East",
            ..Default::default()
        },
    )
    .await;

    let response = api.get("/properties/feed?city=mumbai", None).await;
    assert_eq!(titles(&response), vec!["Central"]);

    let response = api.get("/properties/feed?city=MUMBAI%20EAST", None).await;
    assert_eq!(titles(&response), vec!["Suburb"]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_feed_geo_radius(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let api = ctx.api();

    create_listing(api, &token, ListingSeed { title: "Mumbai flat", ..Default::default() }).await;
    create_listing(
        api,
        &token,
        ListingSeed {
            title: "Pune flat",
            city: "Pune",
            lat: PUNE.0,
            lng: PUNE.1,
            ..Default::default()
        },
    )
    .await;

    let near_mumbai = api
        .get("/properties/feed?lat=19.07&lng=72.88&radius=50", None)
        .await;
    assert_eq!(titles(&near_mumbai), vec!["Mumbai flat"]);

    let wide = api
        .get("/properties/feed?lat=19.07&lng=72.88&radius=200", None)
        .await;
    assert_eq!(wide.get("data.total"), 2);

    // A partial triple is ignored rather than rejected.
    let partial = api.get("/properties/feed?lat=19.07&radius=5", None).await;
    assert_eq!(partial.status, 200);
    assert_eq!(partial.get("data.total"), 2);

    let bad_lat = api
        .get("/properties/feed?lat=91&lng=72.88&radius=5", None)
        .await;
    assert_eq!(bad_lat.status, 400);

    let bad_radius = api
        .get("/properties/feed?lat=19.07&lng=72.88&radius=0", None)
        .await;
    assert_eq!(bad_radius.status, 400);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_feed_pagination(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let api = ctx.api();
    for title in ["One", "Two", "Three"] {
        create_listing(api, &token, ListingSeed { title, ..Default::default() }).await;
        ctx.clock().advance(Duration::seconds(1));
    }

    let page_two = api.get("/properties/feed?page=2&limit=2", None).await;
    assert_eq!(titles(&page_two), vec!["One"]);
    assert_eq!(page_two.get("data.total"), 3);
    assert_eq!(page_two.get("data.totalPages"), 2);
    assert_eq!(page_two.get("data.currentPage"), 2);
    assert_eq!(page_two.get("data.pageSize"), 2);

    let clamped = api.get("/properties/feed?page=0&limit=500", None).await;
    assert_eq!(clamped.get("data.currentPage"), 1);
    assert_eq!(clamped.get("data.pageSize"), 50);

    let beyond = api.get("/properties/feed?page=9", None).await;
    assert_eq!(beyond.status, 200);
    assert!(titles(&beyond).is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_feed_rejects_malformed_parameters(ctx: &TestHarness) {
    let api = ctx.api();

    for query in [
        "minPrice=cheap",
        "bedrooms=two",
        "sortBy=title",
        "order=sideways",
        "status=Rented",
        "propertyType=Castle",
        "page=first",
    ] {
        let response = api.get(&format!("/properties/feed?{}", query), None).await;
        assert_eq!(response.status, 400, "{} should be rejected", query);
        assert_eq!(response.error_code(), "validation_error");
    }

    let empty = api.get("/properties/feed?city=&search=", None).await;
    assert_eq!(empty.status, 200);
    assert_eq!(empty.get("data.total"), 0);
}

// ============================================================================
// Fetch / update / delete
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_get_listing_counts_views(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let api = ctx.api();
    let id = create_listing(api, &token, ListingSeed::default()).await;
    let path = format!("/properties/{}", id);

    let first = api.get(&path, None).await;
    assert_eq!(first.status, 200);
    assert_eq!(first.get("data.viewCount"), 1);
    assert_eq!(first.get("data.owner.contactNumber"), "9876543210");

    let second = api.get(&path, None).await;
    assert_eq!(second.get("data.viewCount"), 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_get_listing_not_found(ctx: &TestHarness) {
    let api = ctx.api();

    let malformed = api.get("/properties/not-an-id", None).await;
    assert_eq!(malformed.status, 404);
    assert_eq!(malformed.error_code(), "not_found");

    let unknown = api
        .get("/properties/00000000-0000-4000-8000-000000000000", None)
        .await;
    assert_eq!(unknown.status, 404);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_update_listing_whitelist(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let api = ctx.api();
    let id = create_listing(api, &token, ListingSeed::default()).await;
    let path = format!("/properties/{}", id);
    api.get(&path, None).await;

    ctx.clock().advance(Duration::minutes(5));
    let response = api
        .put(
            &path,
            json!({
                "title": "Renovated 2BHK",
                "price": { "value": 13000000, "currency": "inr" },
                "status": "Under Offer",
                "viewCount": 999,
                "ownerId": "00000000-0000-4000-8000-000000000000",
            }),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, 200, "{:?}", response.body);
    assert_eq!(response.get("data.title"), "Renovated 2BHK");
    assert_eq!(response.get("data.status"), "Under Offer");
    assert_eq!(response.get("data.price.currency"), "INR");
    assert_eq!(response.get("data.viewCount"), 1);
    assert_ne!(response.get("data.updatedAt"), response.get("data.createdAt"));
    assert_ne!(
        response.get("data.ownerId"),
        "00000000-0000-4000-8000-000000000000"
    );

    let empty = api.put(&path, json!({ "viewCount": 5 }), Some(&token)).await;
    assert_eq!(empty.status, 400);

    let bad_title = api.put(&path, json!({ "title": "" }), Some(&token)).await;
    assert_eq!(bad_title.status, 400);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_only_owner_manages_listing(ctx: &TestHarness) {
    let owner = seller(ctx, "owner@example.com").await;
    let other = seller(ctx, "other@example.com").await;
    let api = ctx.api();
    let id = create_listing(api, &owner, ListingSeed::default()).await;
    let path = format!("/properties/{}", id);

    let update = api.put(&path, json!({ "title": "Mine now" }), Some(&other)).await;
    assert_eq!(update.status, 403);

    let delete = api.delete(&path, None, Some(&other)).await;
    assert_eq!(delete.status, 403);

    let anonymous = api.delete(&path, None, None).await;
    assert_eq!(anonymous.status, 401);

    let deleted = api.delete(&path, None, Some(&owner)).await;
    assert_eq!(deleted.status, 200);
    assert_eq!(api.get(&path, None).await.status, 404);
    assert_eq!(api.delete(&path, None, Some(&owner)).await.status, 404);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_my_listings(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let other = seller(ctx, "o@example.com").await;
    let api = ctx.api();

    create_listing(api, &token, ListingSeed { title: "Older", ..Default::default() }).await;
    ctx.clock().advance(Duration::minutes(1));
    create_listing(api, &token, ListingSeed { title: "Newer", ..Default::default() }).await;
    create_listing(api, &other, ListingSeed { title: "Not mine", ..Default::default() }).await;

    let response = api.get("/properties/my-listings", Some(&token)).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.get("data.count"), 2);
    assert_eq!(response.get("data.listings.0.title"), "Newer");
    assert_eq!(response.get("data.listings.1.title"), "Older");

    assert_eq!(api.get("/properties/my-listings", None).await.status, 401);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_admin_manages_any_listing(ctx: &TestHarness) {
    let owner = seller(ctx, "owner@example.com").await;
    let moderator = admin(ctx, "admin@example.com").await;
    let api = ctx.api();
    let id = create_listing(api, &owner, ListingSeed::default()).await;
    let path = format!("/properties/{}", id);

    let update = api
        .put(&path, json!({ "status": "Sold" }), Some(&moderator))
        .await;
    assert_eq!(update.status, 200, "{:?}", update.body);
    assert_eq!(update.get("data.status"), "Sold");

    let delete = api.delete(&path, None, Some(&moderator)).await;
    assert_eq!(delete.status, 200);
    assert_eq!(api.get(&path, None).await.status, 404);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_interleaved_updates_keep_both_edits(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;
    let api = ctx.api();
    let id = create_listing(api, &token, ListingSeed::default()).await;
    let path = format!("/properties/{}", id);
    let listing_id = ListingId::parse(&id).unwrap();

    let sold = api.put(&path, json!({ "status": "Sold" }), Some(&token)).await;
    assert_eq!(sold.status, 200);

    // A second writer that loaded the listing before the status change.
    ctx.store()
        .update_listing(
            listing_id,
            &ListingChanges {
                title: Some("New title".to_string()),
                ..Default::default()
            },
            ctx.clock().now(),
        )
        .await
        .unwrap()
        .unwrap();

    let response = api.get(&path, None).await;
    assert_eq!(response.get("data.title"), "New title");
    assert_eq!(response.get("data.status"), "Sold");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_create_rejects_non_multipart_body(ctx: &TestHarness) {
    let token = seller(ctx, "s@example.com").await;

    let response = ctx
        .api()
        .post("/properties", json!({ "title": "Sea facing 2BHK" }), Some(&token))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.get("success"), false);
    assert_eq!(response.error_code(), "validation_error");
}
