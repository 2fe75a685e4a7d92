use serde::{Deserialize, Serialize};

/// A user banned across every chat the service moderates.
/// The record existing is what makes the user banned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GloballyBannedUser {
    pub user_id: i64,
    pub name: String,
    pub reason: Option<String>,
}

/// Per-chat switch for global ban enforcement.
/// Chats without a stored setting are enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEnforcementSetting {
    pub chat_id: String,
    pub enforced: bool,
}

impl ChatEnforcementSetting {
    pub fn new(chat_id: impl Into<String>, enforced: bool) -> Self {
        Self {
            chat_id: chat_id.into(),
            enforced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banned_user_serializes_as_flat_object() {
        let user = GloballyBannedUser {
            user_id: 42,
            name: "Alice".into(),
            reason: None,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "user_id": 42, "name": "Alice", "reason": null })
        );
    }
}
