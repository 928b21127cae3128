//! Test fixtures: accounts and listings created through the public API.

use marketplace_core::common::AccountId;
use marketplace_core::domains::accounts::models::{NewAccount, OneTimeCode, Role};
use marketplace_core::domains::auth::password::hash_password;
use marketplace_core::kernel::{BaseAccountStore, BaseClock};
use serde_json::{json, Value};

use super::{ApiClient, Part, TestHarness};

pub const PASSWORD: &str = "Str0ng!pass";

pub fn registration(email: &str, intent: &str) -> Value {
    let mut body = json!({
        "firstName": "Asha",
        "lastName": "Rao",
        "email": email,
        "password": PASSWORD,
        "confirmPassword": PASSWORD,
        "contactNumber": "9876543210",
        "intent": intent,
    });
    if intent == "sell" {
        body["sellerType"] = json!("Owner");
    }
    body
}

/// Register, read the OTP from the mock mailer, verify. Returns the session token.
pub async fn register_and_verify(ctx: &TestHarness, email: &str, intent: &str) -> String {
    let api = ctx.api();
    let response = api.post("/auth/register", registration(email, intent), None).await;
    assert_eq!(response.status, 201, "register failed: {:?}", response.body);

    let code = ctx
        .email()
        .last_code_for(email)
        .expect("verification code was emailed");
    let response = api
        .post("/auth/verify-otp", json!({ "email": email, "code": code }), None)
        .await;
    assert_eq!(response.status, 200, "verify failed: {:?}", response.body);
    response.session_token().expect("session cookie set")
}

pub async fn seller(ctx: &TestHarness, email: &str) -> String {
    register_and_verify(ctx, email, "sell").await
}

pub async fn buyer(ctx: &TestHarness, email: &str) -> String {
    register_and_verify(ctx, email, "buy").await
}

/// Admins cannot self-register, so this one is seeded straight into the store
/// and then verified through the API like any other account.
pub async fn admin(ctx: &TestHarness, email: &str) -> String {
    let verification = OneTimeCode::issue(ctx.clock().now());
    ctx.store()
        .insert_account(NewAccount {
            id: AccountId::new(),
            first_name: "Nila".to_string(),
            last_name: "Iyer".to_string(),
            email: email.to_string(),
            password_hash: hash_password(PASSWORD).expect("hash password"),
            role: Role::Admin,
            contact_number: "9123456780".to_string(),
            verification: verification.clone(),
            created_at: ctx.clock().now(),
        })
        .await
        .expect("seed admin");

    let response = ctx
        .api()
        .post(
            "/auth/verify-otp",
            json!({ "email": email, "code": verification.code }),
            None,
        )
        .await;
    assert_eq!(response.status, 200, "verify failed: {:?}", response.body);
    response.session_token().expect("session cookie set")
}

/// Knobs for a listing fixture.
pub struct ListingSeed {
    pub title: &'static str,
    pub city: &'static str,
    pub property_type: &'static str,
    pub price: i64,
    pub bedrooms: i32,
    pub lat: f64,
    pub lng: f64,
}

impl Default for ListingSeed {
    fn default() -> Self {
        Self {
            title: "Sea facing 2BHK",
            city: "Mumbai",
            property_type: "Apartment",
            price: 12_500_000,
            bedrooms: 2,
            lat: 19.076,
            lng: 72.8777,
        }
    }
}

pub fn listing_form(seed: &ListingSeed) -> Vec<Part> {
    vec![
        Part::text("title", seed.title),
        Part::text("description", "Bright flat close to the station"),
        Part::text("propertyType", seed.property_type),
        Part::text("isResaleProperty", "false"),
        Part::text(
            "price",
            json!({ "value": seed.price, "isNegotiable": true }).to_string(),
        ),
        Part::text(
            "location",
            json!({
                "address": "12 Marine Drive",
                "city": seed.city,
                "state": "Maharashtra",
                "pincode": "400002",
                "coordinates": { "lat": seed.lat, "lng": seed.lng },
            })
            .to_string(),
        ),
        Part::text(
            "details",
            json!({
                "area": { "value": 950.0, "unit": "sqft" },
                "bedrooms": seed.bedrooms,
                "bathrooms": 2,
            })
            .to_string(),
        ),
        Part::text("amenities", json!(["Lift", "Parking"]).to_string()),
        Part::image("front.jpg", "image/jpeg"),
        Part::image("kitchen.png", "image/png"),
    ]
}

/// Create a listing as `token`'s owner and return its id.
pub async fn create_listing(api: &ApiClient, token: &str, seed: ListingSeed) -> String {
    let response = api
        .post_multipart("/properties", listing_form(&seed), Some(token))
        .await;
    assert_eq!(response.status, 201, "create failed: {:?}", response.body);
    response
        .get("data.id")
        .as_str()
        .expect("listing id")
        .to_string()
}
