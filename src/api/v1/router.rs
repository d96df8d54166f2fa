use super::error::*;
use super::handler;
use crate::domain_model::UserId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

/// Set by the authenticating gateway in front of this service.
pub const ACTOR_HEADER: &str = "x-user-id";

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let list_friends = warp::path!("friends")
        .and(warp::get())
        .and(with_actor())
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_friends);

    let add_friends = warp::path!("friends" / "add")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_actor())
        .and(with(server.user_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and(with(server.notifier.clone()))
        .and_then(handler::add_friends);

    let delete_friends = warp::path!("friends" / "delete")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_actor())
        .and(with(server.user_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::delete_friends);

    let block_friends = warp::path!("friends" / "block")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_actor())
        .and(with(server.user_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::block_friends);

    list_friends
        .or(add_friends)
        .or(delete_friends)
        .or(block_friends)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_actor() -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(ACTOR_HEADER).and_then(|value: Option<String>| async move {
        value
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .ok_or_else(|| reject::custom(ApiErrorCode::InvalidActor))
    })
}
