use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header::SET_COOKIE, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::common::AppError;
use crate::domains::accounts::models::AccountView;
use crate::domains::auth::actions::{
    self, EmailInput, LoginInput, RegisterInput, ResetPasswordInput, SessionGrant,
    VerifyOtpInput, GENERIC_CODE_ACK,
};
use crate::server::app::AppState;
use crate::server::envelope::Reply;
use crate::server::middleware::{clear_session_cookie, session_cookie, Authenticated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/resend-otp", post(resend_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/check-auth", get(check_auth))
}

fn with_session(state: &AppState, grant: SessionGrant, message: &str) -> Response {
    let cookie = session_cookie(&grant.token, state.secure_cookies);
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Reply::data(grant).with_message(message),
    )
        .into_response()
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = body?;
    let ack = actions::register(input, &state.deps).await?;
    Ok(Reply::data(ack)
        .with_message("Registration successful. Check your email for a verification code.")
        .status(StatusCode::CREATED)
        .into_response())
}

async fn resend_otp(
    State(state): State<AppState>,
    body: Result<Json<EmailInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = body?;
    actions::resend_verification_code(input, &state.deps).await?;
    Ok(Reply::message(GENERIC_CODE_ACK).into_response())
}

async fn verify_otp(
    State(state): State<AppState>,
    body: Result<Json<VerifyOtpInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = body?;
    let grant = actions::verify_email(input, &state.deps).await?;
    Ok(with_session(&state, grant, "Email verified"))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = body?;
    let grant = actions::login(input, &state.deps).await?;
    Ok(with_session(&state, grant, "Logged in"))
}

async fn logout(State(state): State<AppState>) -> Response {
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie(state.secure_cookies))]),
        Reply::message("Logged out"),
    )
        .into_response()
}

async fn forgot_password(
    State(state): State<AppState>,
    body: Result<Json<EmailInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = body?;
    actions::forgot_password(input, &state.deps).await?;
    Ok(Reply::message(GENERIC_CODE_ACK).into_response())
}

async fn reset_password(
    State(state): State<AppState>,
    body: Result<Json<ResetPasswordInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = body?;
    let grant = actions::reset_password(input, &state.deps).await?;
    Ok(with_session(&state, grant, "Password has been reset"))
}

async fn check_auth(Authenticated(account): Authenticated) -> Reply<AccountView> {
    Reply::data(AccountView::from(&account))
}
