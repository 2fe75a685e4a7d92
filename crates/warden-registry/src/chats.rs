use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use warden_db::Database;
use warden_db::models::ChatSettingRow;
use warden_db::queries;
use warden_types::models::ChatEnforcementSetting;

use crate::Result;
use crate::index::{SnapshotIndex, acquire};

/// Per-chat global ban enforcement.
///
/// Enforcement is on unless a chat explicitly turned it off, so the index only
/// holds the opted-out chats. It is patched in place after each commit rather
/// than rebuilt: every mutation moves exactly one chat in or out of it.
pub struct ChatPolicyRegistry {
    db: Arc<Database>,
    write_lock: Mutex<()>,
    opted_out: SnapshotIndex<String>,
}

impl ChatPolicyRegistry {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let ids = db.opted_out_chat_ids()?;
        info!("Loaded {} chats with global bans disabled", ids.len());

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
            opted_out: SnapshotIndex::from_keys(ids),
        })
    }

    pub fn enable(&self, chat_id: &str) -> Result<()> {
        self.set_enforced(chat_id, true)
    }

    pub fn disable(&self, chat_id: &str) -> Result<()> {
        self.set_enforced(chat_id, false)
    }

    fn set_enforced(&self, chat_id: &str, enforced: bool) -> Result<()> {
        let _guard = acquire(&self.write_lock);

        self.db.write(|tx| {
            let mut setting = queries::find_chat_setting(tx, chat_id)?.unwrap_or_else(|| {
                ChatSettingRow {
                    chat_id: chat_id.to_owned(),
                    enforced,
                }
            });
            setting.enforced = enforced;
            queries::upsert_chat_setting(tx, &setting)
        })?;

        if enforced {
            self.opted_out.remove(chat_id);
        } else {
            self.opted_out.insert(chat_id.to_owned());
        }
        debug!(chat_id, enforced, opted_out = self.opted_out.len(), "chat enforcement set");
        Ok(())
    }

    /// Hot-path check: true unless the chat opted out.
    pub fn is_enforced(&self, chat_id: &str) -> bool {
        !self.opted_out.contains(chat_id)
    }

    /// Carry a chat's setting over to its new identity.
    ///
    /// A setting already stored under `new_chat_id` is replaced. Nothing
    /// happens when `old_chat_id` has no setting.
    pub fn migrate_chat(&self, old_chat_id: &str, new_chat_id: &str) -> Result<()> {
        if old_chat_id == new_chat_id {
            return Ok(());
        }

        let _guard = acquire(&self.write_lock);

        let moved = self.db.write(|tx| {
            let Some(setting) = queries::find_chat_setting(tx, old_chat_id)? else {
                return Ok(None);
            };
            if queries::find_chat_setting(tx, new_chat_id)?.is_some() {
                warn!(old_chat_id, new_chat_id, "overwriting existing setting of migrated chat");
            }
            queries::rekey_chat_setting(tx, old_chat_id, new_chat_id)?;
            Ok(Some(setting.enforced))
        })?;

        let Some(enforced) = moved else {
            return Ok(());
        };

        self.opted_out.remove(old_chat_id);
        if enforced {
            self.opted_out.remove(new_chat_id);
        } else {
            self.opted_out.insert(new_chat_id.to_owned());
        }
        debug!(old_chat_id, new_chat_id, enforced, "chat setting migrated");
        Ok(())
    }

    /// Stored setting for a chat, straight from the store. `None` means the
    /// chat never touched the setting and is enforced.
    pub fn setting(&self, chat_id: &str) -> Result<Option<ChatEnforcementSetting>> {
        Ok(self.db.chat_setting(chat_id)?.map(to_model))
    }

    pub fn settings(&self) -> Result<Vec<ChatEnforcementSetting>> {
        Ok(self.db.chat_settings()?.into_iter().map(to_model).collect())
    }

    pub fn opted_out_count(&self) -> usize {
        self.opted_out.len()
    }

    /// Rebuild the opted-out index from the store under the mutation lock.
    pub fn reload(&self) -> Result<()> {
        let _guard = acquire(&self.write_lock);
        let ids = self.db.opted_out_chat_ids()?;
        self.opted_out.replace(ids);
        Ok(())
    }
}

fn to_model(row: ChatSettingRow) -> ChatEnforcementSetting {
    ChatEnforcementSetting::new(row.chat_id, row.enforced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ChatPolicyRegistry {
        ChatPolicyRegistry::new(Arc::new(Database::open_in_memory().unwrap())).unwrap()
    }

    #[test]
    fn untouched_chats_are_enforced() {
        let chats = registry();
        assert!(chats.is_enforced("-1001234"));
        assert!(chats.setting("-1001234").unwrap().is_none());
    }

    #[test]
    fn disable_then_enable_restores_enforcement() {
        let chats = registry();

        chats.disable("chat-1").unwrap();
        assert!(!chats.is_enforced("chat-1"));
        assert_eq!(chats.opted_out_count(), 1);

        chats.enable("chat-1").unwrap();
        assert!(chats.is_enforced("chat-1"));
        assert_eq!(chats.opted_out_count(), 0);

        // The record stays, now with enforcement on
        let setting = chats.setting("chat-1").unwrap().unwrap();
        assert!(setting.enforced);
    }

    #[test]
    fn enable_on_fresh_chat_stores_explicit_true() {
        let chats = registry();
        chats.enable("chat-9").unwrap();

        assert!(chats.is_enforced("chat-9"));
        assert_eq!(
            chats.settings().unwrap(),
            vec![ChatEnforcementSetting::new("chat-9", true)]
        );
    }

    #[test]
    fn migrate_carries_disabled_setting_and_index_entry() {
        let chats = registry();
        chats.disable("chat-1").unwrap();

        chats.migrate_chat("chat-1", "chat-2").unwrap();

        let moved = chats.setting("chat-2").unwrap().unwrap();
        assert!(!moved.enforced);
        assert!(chats.setting("chat-1").unwrap().is_none());
        assert!(!chats.is_enforced("chat-2"));
        assert!(chats.is_enforced("chat-1"));
        assert_eq!(chats.opted_out_count(), 1);
    }

    #[test]
    fn migrate_enforced_setting_over_disabled_target() {
        let chats = registry();
        chats.enable("old").unwrap();
        chats.disable("new").unwrap();

        chats.migrate_chat("old", "new").unwrap();

        assert!(chats.is_enforced("new"));
        assert!(chats.setting("new").unwrap().unwrap().enforced);
        assert_eq!(chats.settings().unwrap().len(), 1);
    }

    #[test]
    fn migrate_without_setting_is_a_noop() {
        let chats = registry();
        chats.disable("other").unwrap();

        chats.migrate_chat("missing", "other").unwrap();

        assert!(!chats.is_enforced("other"));
        assert!(chats.setting("missing").unwrap().is_none());
    }

    #[test]
    fn migrate_onto_itself_keeps_setting() {
        let chats = registry();
        chats.disable("same").unwrap();

        chats.migrate_chat("same", "same").unwrap();

        assert!(!chats.is_enforced("same"));
        assert!(chats.setting("same").unwrap().is_some());
    }

    #[test]
    fn index_is_loaded_from_existing_settings() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        {
            let chats = ChatPolicyRegistry::new(db.clone()).unwrap();
            chats.disable("a").unwrap();
            chats.disable("b").unwrap();
            chats.enable("b").unwrap();
        }

        let reopened = ChatPolicyRegistry::new(db).unwrap();
        assert!(!reopened.is_enforced("a"));
        assert!(reopened.is_enforced("b"));
        assert_eq!(reopened.opted_out_count(), 1);
    }
}
