//! Database row types, kept apart from the warden-types value objects so the
//! storage layer has no serde surface.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannedUserRow {
    pub user_id: i64,
    pub name: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettingRow {
    pub chat_id: String,
    pub enforced: bool,
}
