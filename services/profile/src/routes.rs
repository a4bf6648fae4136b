//! Profile service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthenticatedUser, auth_middleware},
    models::{User, UserId},
    state::AppState,
};

/// Request for user registration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    #[serde(alias = "fullname")]
    pub full_name: String,
    pub phone_number: String,
    pub password: String,
}

/// Response for user registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

/// Request for user login
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

/// Response for user login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub jwt: String,
}

/// Response for profile lookup
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub full_name: String,
    pub phone_number: String,
}

/// Request for profile update; empty fields are left unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    #[serde(alias = "fullname")]
    pub full_name: String,
    pub phone_number: String,
}

/// Response for profile update
#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub user_id: UserId,
}

/// Create the router for the profile service
pub fn create_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/v1/profile", get(get_profile).put(update_profile))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "profile-service"
    }))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    let user = User::new(payload.full_name, payload.phone_number, payload.password);

    let result = state.user_module.register(user).await.map_err(|e| {
        error!("Failed to register user: {}", e);
        ApiError::InternalServerError(e.to_string())
    })?;

    if !result.valid {
        return Err(ApiError::BadRequest(result.messages.join(", ")));
    }

    Ok(Json(RegisterResponse {
        user_id: result.user.id,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let result = state
        .user_module
        .login(&payload.phone_number, &payload.password)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(LoginResponse {
        user_id: result.user.id,
        jwt: result.token,
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state
        .user_module
        .get_profile(user_id)
        .await
        .map_err(|e| ApiError::Forbidden(e.to_string()))?;

    Ok(Json(ProfileResponse {
        full_name: user.full_name,
        phone_number: user.phone_number,
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let changes = User {
        id: user_id,
        full_name: payload.full_name,
        phone_number: payload.phone_number,
        ..User::default()
    };

    let result = state
        .user_module
        .update_profile(&changes)
        .await
        .map_err(|e| ApiError::Forbidden(e.to_string()))?;

    if result.conflict {
        return Err(ApiError::Conflict(result.message));
    }

    Ok(Json(UpdateProfileResponse { user_id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hashing::{Argon2Hasher, HashConfig},
        jwt::{JwtConfig, Rs256TokenIssuer, TokenIssuer},
        modules::UserModule,
        repositories::InMemoryUserStore,
        validation::FieldValidator,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let token_issuer: Arc<dyn TokenIssuer> = Arc::new(Rs256TokenIssuer::new(JwtConfig {
            private_key: include_str!("../tests/fixtures/private_key.pem").to_string(),
            public_key: include_str!("../tests/fixtures/public_key.pem").to_string(),
        }));
        let hasher = Argon2Hasher::new(HashConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        });
        let user_module = UserModule::new(
            Arc::new(FieldValidator),
            Arc::new(hasher),
            token_issuer.clone(),
            Arc::new(InMemoryUserStore::new()),
        );

        create_router(AppState {
            user_module,
            token_issuer,
        })
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn register_and_login(app: &Router, full_name: &str, phone_number: &str) -> String {
        let (status, _) = send(
            app,
            Method::POST,
            "/register",
            None,
            Some(json!({
                "full_name": full_name,
                "phone_number": phone_number,
                "password": "Abcde3#",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            app,
            Method::POST,
            "/login",
            None,
            Some(json!({"phone_number": phone_number, "password": "Abcde3#"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["jwt"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(&app(), Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_returns_user_id() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/register",
            None,
            Some(json!({
                "fullname": "John Doe",
                "phone_number": "62812345678",
                "password": "Abcde3#",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"user_id": 1}));
    }

    #[tokio::test]
    async fn test_register_invalid_input_joins_messages() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/register",
            None,
            Some(json!({
                "full_name": "John Doe",
                "phone_number": "123456",
                "password": "Abcde3#",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "phone number must be 10-13 digits, phone number must start with 62"
        );
    }

    #[tokio::test]
    async fn test_login_failure_message_is_generic() {
        let app = app();
        register_and_login(&app, "John Doe", "62812345678").await;

        let (status, wrong_password) = send(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"phone_number": "62812345678", "password": "Wrong3#"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, unknown_phone) = send(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"phone_number": "62899999999", "password": "Abcde3#"})),
        )
        .await;
        assert_eq!(wrong_password, unknown_phone);
    }

    #[tokio::test]
    async fn test_profile_requires_token() {
        let app = app();

        let (status, body) = send(&app, Method::GET, "/v1/profile", None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "not authenticated");

        let (status, body) = send(&app, Method::GET, "/v1/profile", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "not authenticated");
    }

    #[tokio::test]
    async fn test_profile_roundtrip() {
        let app = app();
        let token = register_and_login(&app, "John Doe", "62812345678").await;

        let (status, body) = send(&app, Method::GET, "/v1/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"full_name": "John Doe", "phone_number": "62812345678"})
        );

        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/profile",
            Some(&token),
            Some(json!({"phone_number": "62887654321"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"user_id": 1}));

        let (_, body) = send(&app, Method::GET, "/v1/profile", Some(&token), None).await;
        assert_eq!(
            body,
            json!({"full_name": "John Doe", "phone_number": "62887654321"})
        );
    }

    #[tokio::test]
    async fn test_update_profile_conflict() {
        let app = app();
        let token = register_and_login(&app, "John Doe", "62812345678").await;
        register_and_login(&app, "Jane Doe", "62887654321").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/profile",
            Some(&token),
            Some(json!({"phone_number": "62887654321"})),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "phone number already exist");
    }
}
