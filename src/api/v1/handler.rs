use super::error::*;
use crate::application_port::{RelationshipService, UserService};
use crate::domain_model::{EdgeOutcome, UserId};
use crate::domain_port::{FriendNotification, FriendNotifier};
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

/// Targets of a friend mutation, by id and/or by username.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FriendTargets {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub usernames: Vec<String>,
}

/// Validates the request and turns it into user ids: ids must parse,
/// usernames are resolved (unknown ones are dropped), and the actor may not
/// appear among the targets.
async fn resolve_targets(
    actor: UserId,
    body: FriendTargets,
    user_service: &dyn UserService,
    self_message: &str,
) -> Result<Vec<UserId>, ApiErrorCode> {
    if body.ids.is_empty() && body.usernames.is_empty() {
        return Err(ApiErrorCode::InvalidArgument(
            "Specify at least one ID or Username.".to_owned(),
        ));
    }

    let mut targets = body
        .ids
        .iter()
        .map(|id| {
            id.parse::<UserId>()
                .map_err(|_| ApiErrorCode::InvalidArgument(format!("Invalid user ID: {id}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let resolved = user_service
        .resolve_usernames(&body.usernames)
        .await
        .map_err(ApiErrorCode::from)?;
    targets.extend(resolved);

    if targets.contains(&actor) {
        return Err(ApiErrorCode::InvalidArgument(self_message.to_owned()));
    }

    Ok(targets)
}

fn notifications_for(actor: UserId, outcomes: &[(UserId, EdgeOutcome)]) -> Vec<FriendNotification> {
    outcomes
        .iter()
        .filter_map(|(target, outcome)| match outcome {
            EdgeOutcome::Invited => Some(FriendNotification::InviteReceived {
                from: actor,
                to: *target,
            }),
            EdgeOutcome::Accepted => Some(FriendNotification::InviteAccepted {
                by: actor,
                to: *target,
            }),
            _ => None,
        })
        .collect()
}

pub async fn add_friends(
    body: FriendTargets,
    actor: UserId,
    user_service: Arc<dyn UserService>,
    relationship_service: Arc<dyn RelationshipService>,
    notifier: Arc<dyn FriendNotifier>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let targets = resolve_targets(actor, body, &*user_service, "Cannot add self as friend.")
        .await
        .map_err(reject::custom)?;

    let outcomes = relationship_service
        .add_friends(actor, &targets)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    // Only after commit: a rolled back batch must not notify anyone.
    let notifications = notifications_for(actor, &outcomes);
    if !notifications.is_empty() {
        notifier.notify(notifications).await;
    }

    Ok(warp::reply::json(&ApiResponse::ok(())))
}

pub async fn delete_friends(
    body: FriendTargets,
    actor: UserId,
    user_service: Arc<dyn UserService>,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let targets = resolve_targets(actor, body, &*user_service, "Cannot delete self.")
        .await
        .map_err(reject::custom)?;

    relationship_service
        .delete_friends(actor, &targets)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(())))
}

pub async fn block_friends(
    body: FriendTargets,
    actor: UserId,
    user_service: Arc<dyn UserService>,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let targets = resolve_targets(actor, body, &*user_service, "Cannot block self.")
        .await
        .map_err(reject::custom)?;

    relationship_service
        .block_friends(actor, &targets)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(())))
}

pub async fn list_friends(
    actor: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let friends = relationship_service
        .list_friends(actor)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(friends)))
}
