// Identity Lookup Port (external collaborator)

use crate::domain::UserId;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Contact details for notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContact {
    pub email: String,
    pub display_name: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `None` when the user is unknown
    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<UserContact>>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockUserDirectory {
        users: Mutex<HashMap<UserId, UserContact>>,
    }

    impl MockUserDirectory {
        pub fn with_user(self, id: &str, email: &str, display_name: &str) -> Self {
            self.users.lock().unwrap().insert(
                id.to_string(),
                UserContact {
                    email: email.to_string(),
                    display_name: display_name.to_string(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl UserDirectory for MockUserDirectory {
        async fn get_user_by_id(&self, id: &UserId) -> Result<Option<UserContact>> {
            Ok(self.users.lock().unwrap().get(id).cloned())
        }
    }
}
