use serde::{Deserialize, Serialize};

// -- Bans --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BanRequest {
    pub name: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BanStatusResponse {
    pub user_id: i64,
    pub banned: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BanCountResponse {
    pub count: usize,
}

// -- Chat enforcement --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SetEnforcementRequest {
    pub enforced: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnforcementResponse {
    pub chat_id: String,
    pub enforced: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MigrateChatRequest {
    pub new_chat_id: String,
}
