//! Integration tests for the favorites ledger.

mod common;

use chrono::Duration;
use common::{buyer, create_listing, seller, ListingSeed, TestHarness};
use serde_json::json;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn test_favorite_counter_tracks_add_and_remove(ctx: &TestHarness) {
    let owner = seller(ctx, "s@example.com").await;
    let fan = buyer(ctx, "b@example.com").await;
    let api = ctx.api();
    let id = create_listing(api, &owner, ListingSeed::default()).await;
    let favorite_path = format!("/favorites/{}", id);
    let listing_path = format!("/properties/{}", id);

    let added = api.post(&favorite_path, json!({}), Some(&fan)).await;
    assert_eq!(added.status, 201, "{:?}", added.body);
    assert_eq!(added.get("data.listingId"), id.as_str());
    assert_eq!(api.get(&listing_path, None).await.get("data.favoritesCount"), 1);

    let duplicate = api.post(&favorite_path, json!({}), Some(&fan)).await;
    assert_eq!(duplicate.status, 409);
    assert_eq!(duplicate.error_code(), "conflict");
    assert_eq!(api.get(&listing_path, None).await.get("data.favoritesCount"), 1);

    let removed = api.delete(&favorite_path, None, Some(&fan)).await;
    assert_eq!(removed.status, 200);
    assert_eq!(api.get(&listing_path, None).await.get("data.favoritesCount"), 0);

    let again = api.delete(&favorite_path, None, Some(&fan)).await;
    assert_eq!(again.status, 404);
    assert_eq!(again.error_code(), "not_found");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_favorite_missing_listing(ctx: &TestHarness) {
    let fan = buyer(ctx, "b@example.com").await;
    let api = ctx.api();

    let unknown = api
        .post("/favorites/00000000-0000-4000-8000-000000000000", json!({}), Some(&fan))
        .await;
    assert_eq!(unknown.status, 404);

    let malformed = api.post("/favorites/nope", json!({}), Some(&fan)).await;
    assert_eq!(malformed.status, 404);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_favorites_require_session(ctx: &TestHarness) {
    let api = ctx.api();
    assert_eq!(api.get("/favorites", None).await.status, 401);
    assert_eq!(
        api.post("/favorites/00000000-0000-4000-8000-000000000000", json!({}), None)
            .await
            .status,
        401
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_list_favorites_newest_first(ctx: &TestHarness) {
    let owner = seller(ctx, "s@example.com").await;
    let fan = buyer(ctx, "b@example.com").await;
    let other = buyer(ctx, "o@example.com").await;
    let api = ctx.api();

    let older = create_listing(api, &owner, ListingSeed { title: "Older pick", ..Default::default() }).await;
    let newer = create_listing(api, &owner, ListingSeed { title: "Newer pick", ..Default::default() }).await;

    api.post(&format!("/favorites/{}", older), json!({}), Some(&fan)).await;
    ctx.clock().advance(Duration::minutes(1));
    api.post(&format!("/favorites/{}", newer), json!({}), Some(&fan)).await;
    api.post(&format!("/favorites/{}", older), json!({}), Some(&other)).await;

    let response = api.get("/favorites", Some(&fan)).await;
    assert_eq!(response.status, 200);
    let items = response.get("data");
    assert_eq!(items.as_array().unwrap().len(), 2);
    assert_eq!(items[0]["listing"]["title"], "Newer pick");
    assert_eq!(items[1]["listing"]["title"], "Older pick");
    assert_eq!(items[1]["listing"]["favoritesCount"], 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_deleting_listing_drops_favorites(ctx: &TestHarness) {
    let owner = seller(ctx, "s@example.com").await;
    let fan = buyer(ctx, "b@example.com").await;
    let api = ctx.api();
    let id = create_listing(api, &owner, ListingSeed::default()).await;

    api.post(&format!("/favorites/{}", id), json!({}), Some(&fan)).await;
    api.delete(&format!("/properties/{}", id), None, Some(&owner)).await;

    let response = api.get("/favorites", Some(&fan)).await;
    assert_eq!(response.status, 200);
    assert!(response.get("data").as_array().unwrap().is_empty());
}
