use axum::{extract::State, http::StatusCode, Json};
use shared_types::{
    normalize_email, AppError, AppJson, AuthResponse, LoginRequest, RegisterRequest, User,
};

use crate::auth::{password, AuthUser};
use crate::db::AppState;
use crate::error_convert::ValidateRequest;
use crate::repo::NewUser;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Create an account and return a token for it.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 403, description = "Registration disabled", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
        (status = 422, description = "Invalid input", body = AppError),
        (status = 429, description = "Too many attempts", body = AppError)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    if !state.flags.registration {
        return Err(AppError::forbidden("Registration is disabled"));
    }

    let payload = RegisterRequest {
        name: payload.name.trim().to_string(),
        email: normalize_email(&payload.email),
        password: payload.password,
    };
    payload.validate_request()?;

    let password_hash = password::hash_password(&payload.password)?;
    let user = state
        .users
        .create_user(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash,
        })
        .await?;

    let token = state.keys.issue(&user)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Exchange credentials for a token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
        (status = 429, description = "Too many attempts", body = AppError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&payload.email);
    let stored = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

    if !password::verify_password(&payload.password, &stored.password_hash) {
        tracing::info!(user_id = %stored.user.id, "Login rejected");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = state.keys.issue(&stored.user)?;
    Ok(Json(AuthResponse {
        token,
        user: stored.user,
    }))
}

/// The account behind the presented token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>, AppError> {
    state
        .users
        .find_by_id(user.id())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))
}
