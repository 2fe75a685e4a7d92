use std::sync::Arc;

use warden_registry::{BanRegistry, ChatPolicyRegistry};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub bans: BanRegistry,
    pub chats: ChatPolicyRegistry,
    pub admin_token: String,
}
