//! Health endpoint tests.

mod common;

use common::TestHarness;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn test_health_ok(ctx: &TestHarness) {
    let response = ctx.api().get("/health", None).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.get("status"), "healthy");
    assert_eq!(response.get("database.status"), "ok");
}
