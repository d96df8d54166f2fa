use crate::domain_model::{EdgeState, User};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Friend {
    pub user: User,
    pub state: EdgeState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FriendsList {
    pub friends: Vec<Friend>,
}

impl FriendsList {
    pub fn len(&self) -> usize {
        self.friends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.friends.is_empty()
    }

    pub fn state_of(&self, user_id: crate::domain_model::UserId) -> Option<EdgeState> {
        self.friends
            .iter()
            .find(|f| f.user.id == user_id)
            .map(|f| f.state)
    }
}
