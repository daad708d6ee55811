use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(HealthResponse { status: "ok" })))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    req: RefreshRequest,
    token_service: Arc<dyn TokenService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = token_service
        .refresh(&req.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?
        .ok_or_else(|| reject::custom(ApiErrorCode::InvalidToken))?;

    Ok(warp::reply::json(&ApiResponse::ok(pair)))
}

pub async fn current_user(
    principal: Option<Principal>,
    user_resolver: Arc<dyn UserResolver<User = UserProfile>>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = resolve_current_user(user_resolver.as_ref(), principal.as_ref())
        .await
        .ok_or_else(|| reject::custom(ApiErrorCode::Unauthenticated))?;

    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}
