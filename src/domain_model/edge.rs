use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a directed edge, seen from its source.
///
/// The numeric codes are persisted in `user_edge.state` and must not change.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i8)]
pub enum EdgeState {
    Accepted = 0,
    /// The destination sent the source a request that is still pending.
    Invited = 1,
    OutgoingRequest = 2,
    /// The source blocked the destination. Has no mirror edge.
    Blocked = 3,
}

impl EdgeState {
    pub fn code(self) -> i8 {
        self as i8
    }
}

impl TryFrom<i8> for EdgeState {
    type Error = String;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(EdgeState::Accepted),
            1 => Ok(EdgeState::Invited),
            2 => Ok(EdgeState::OutgoingRequest),
            3 => Ok(EdgeState::Blocked),
            other => Err(format!("unknown edge state: {other}")),
        }
    }
}

impl fmt::Display for EdgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeState::Accepted => "accepted",
            EdgeState::Invited => "invited",
            EdgeState::OutgoingRequest => "outgoing_request",
            EdgeState::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// One row of `user_edge`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source_id: UserId,
    pub destination_id: UserId,
    pub state: EdgeState,
    /// Creation timestamp in microseconds; rows sharing the current
    /// mutation's position were written by the current transaction.
    pub position: i64,
    pub update_time: DateTime<Utc>,
}

pub fn position_of(now: DateTime<Utc>) -> i64 {
    now.timestamp_micros()
}

/// What a single per-id unit of a batch did.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOutcome {
    /// A new pending pair was created.
    Invited,
    /// A pending invite from the target was accepted.
    Accepted,
    /// A block issued by the actor was lifted; nothing else happened.
    Unblocked,
    Blocked,
    Deleted,
    /// Nothing changed.
    NoOp,
}
