use super::handler;
use crate::gate::with_principal;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health = warp::get()
        .and(warp::path("health"))
        .and(warp::path::end())
        .and_then(handler::health);

    let refresh = warp::post()
        .and(warp::path("token"))
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.token_service.clone()))
        .and_then(handler::refresh_token);

    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(with_principal(server.gate.clone()))
        .and(with(server.user_resolver.clone()))
        .and_then(handler::current_user);

    health.or(refresh).or(me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}
