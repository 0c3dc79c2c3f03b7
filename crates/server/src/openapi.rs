use axum::{middleware, routing::get, Router};
use shared_types::{
    AddSubtaskRequest, AppError, AppErrorKind, AuthResponse, CreateTodoRequest, LoginRequest,
    MessageResponse, RegisterRequest, Subtask, Todo, TodoStats, UpdateTodoRequest, User,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable};

use crate::auth::middleware::auth_middleware;
use crate::db::AppState;
use crate::health::{self, HealthResponse};
use crate::rate_limit::RateLimitState;
use crate::rest;
use crate::telemetry::OtelTraceLayer;

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        rest::todo::list_todos,
        rest::todo::create_todo,
        rest::todo::update_todo,
        rest::todo::delete_todo,
        rest::todo::due_reminders,
        rest::todo::todo_stats,
        rest::todo::add_subtask,
        rest::todo::toggle_subtask,
        rest::todo::delete_subtask,
        rest::auth::register,
        rest::auth::login,
        rest::auth::me,
        health::health_check,
    ),
    components(schemas(
        Todo,
        Subtask,
        CreateTodoRequest,
        UpdateTodoRequest,
        AddSubtaskRequest,
        MessageResponse,
        TodoStats,
        User,
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        AppError,
        AppErrorKind,
        HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "todos", description = "Todo management"),
        (name = "subtasks", description = "Checklist items inside a todo"),
        (name = "auth", description = "Account registration and login"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Todo API",
        description = "Personal todo lists with subtasks and reminders",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::new);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Build an Axum router that serves the REST API at `/api/*`, `/health`,
/// and the API docs at `/docs`. The permissive auth middleware wraps every
/// route; `rate_limit` applies to the account routes only. With the
/// `telemetry` flag on, each request also gets an OpenTelemetry span.
pub fn api_router(state: AppState, rate_limit: Option<RateLimitState>) -> Router {
    let api = match rate_limit {
        Some(limit) => rest::api_router_with_rate_limit(limit),
        None => rest::api_router(),
    };

    let mut router = api.route("/health", get(health::health_check));

    // Inside the auth layer so spans can see the caller's claims.
    if state.flags.telemetry {
        router = router.layer(OtelTraceLayer);
    }

    router
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
