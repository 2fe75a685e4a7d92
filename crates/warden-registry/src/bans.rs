use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use warden_db::Database;
use warden_db::models::BannedUserRow;
use warden_db::queries;
use warden_types::models::GloballyBannedUser;

use crate::Result;
use crate::index::{SnapshotIndex, acquire};

/// Globally banned users with an in-memory id index.
///
/// Every mutation that can change who is banned re-reads the full id list
/// from the store once its transaction has committed.
pub struct BanRegistry {
    db: Arc<Database>,
    write_lock: Mutex<()>,
    banned: SnapshotIndex<i64>,
}

impl BanRegistry {
    /// Build the registry and load the index from the store.
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let ids = db.banned_user_ids()?;
        info!("Loaded {} globally banned users", ids.len());

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
            banned: SnapshotIndex::from_keys(ids),
        })
    }

    /// Ban `user_id` everywhere. Banning an already banned user overwrites
    /// the stored name and reason.
    pub fn ban(&self, user_id: i64, name: &str, reason: Option<&str>) -> Result<()> {
        let _guard = acquire(&self.write_lock);

        self.db.write(|tx| {
            let user = match queries::find_banned_user(tx, user_id)? {
                Some(mut existing) => {
                    existing.name = name.to_owned();
                    existing.reason = reason.map(str::to_owned);
                    existing
                }
                None => BannedUserRow {
                    user_id,
                    name: name.to_owned(),
                    reason: reason.map(str::to_owned),
                },
            };
            queries::upsert_banned_user(tx, &user)
        })?;

        self.rebuild_index()?;
        debug!(user_id, banned = self.banned.len(), "user globally banned");
        Ok(())
    }

    /// Replace name and reason of an existing ban. Returns `false`, without
    /// writing anything, when the user is not banned.
    pub fn update_reason(&self, user_id: i64, name: &str, reason: Option<&str>) -> Result<bool> {
        let _guard = acquire(&self.write_lock);

        let updated = self.db.write(|tx| {
            let Some(mut user) = queries::find_banned_user(tx, user_id)? else {
                return Ok(false);
            };
            user.name = name.to_owned();
            user.reason = reason.map(str::to_owned);
            queries::upsert_banned_user(tx, &user)?;
            Ok(true)
        })?;

        // The set of banned ids is unchanged, so the index stays as is.
        if updated {
            debug!(user_id, "global ban reason updated");
        }
        Ok(updated)
    }

    /// Lift the ban on `user_id`. Unbanning a user who is not banned is a no-op.
    pub fn unban(&self, user_id: i64) -> Result<()> {
        let _guard = acquire(&self.write_lock);

        let removed = self.db.write(|tx| queries::delete_banned_user(tx, user_id))?;

        self.rebuild_index()?;
        debug!(user_id, removed, banned = self.banned.len(), "global ban lifted");
        Ok(())
    }

    /// Hot-path check against the index. Never touches the store.
    pub fn is_banned(&self, user_id: i64) -> bool {
        self.banned.contains(&user_id)
    }

    /// Number of banned users according to the index.
    pub fn count(&self) -> usize {
        self.banned.len()
    }

    /// Full record straight from the store, bypassing the index.
    pub fn record(&self, user_id: i64) -> Result<Option<GloballyBannedUser>> {
        Ok(self.db.banned_user(user_id)?.map(to_model))
    }

    pub fn list(&self) -> Result<Vec<GloballyBannedUser>> {
        Ok(self.db.banned_users()?.into_iter().map(to_model).collect())
    }

    /// Rebuild the index from the store under the mutation lock.
    pub fn reload(&self) -> Result<()> {
        let _guard = acquire(&self.write_lock);
        self.rebuild_index()
    }

    // Caller holds `write_lock`.
    fn rebuild_index(&self) -> Result<()> {
        let ids = self.db.banned_user_ids()?;
        self.banned.replace(ids);
        Ok(())
    }
}

fn to_model(row: BannedUserRow) -> GloballyBannedUser {
    GloballyBannedUser {
        user_id: row.user_id,
        name: row.name,
        reason: row.reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BanRegistry {
        BanRegistry::new(Arc::new(Database::open_in_memory().unwrap())).unwrap()
    }

    #[test]
    fn ban_update_unban_scenario() {
        let bans = registry();

        bans.ban(42, "Alice", None).unwrap();
        assert!(bans.is_banned(42));
        assert_eq!(bans.record(42).unwrap().unwrap().reason, None);

        assert!(bans.update_reason(42, "Alice", Some("spam")).unwrap());
        assert_eq!(
            bans.record(42).unwrap().unwrap().reason.as_deref(),
            Some("spam")
        );

        bans.unban(42).unwrap();
        assert!(!bans.is_banned(42));
        assert!(bans.record(42).unwrap().is_none());
    }

    #[test]
    fn banning_twice_keeps_one_record_with_latest_details() {
        let bans = registry();

        bans.ban(7, "Bob", Some("flood")).unwrap();
        bans.ban(7, "Robert", None).unwrap();

        let all = bans.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Robert");
        assert_eq!(all[0].reason, None);
        assert_eq!(bans.count(), 1);
    }

    #[test]
    fn update_reason_never_creates_a_ban() {
        let bans = registry();

        assert!(!bans.update_reason(99, "Ghost", Some("spam")).unwrap());
        assert!(bans.record(99).unwrap().is_none());
        assert!(bans.list().unwrap().is_empty());
        assert!(!bans.is_banned(99));
    }

    #[test]
    fn unban_of_unknown_user_is_a_noop() {
        let bans = registry();
        bans.ban(1, "Carol", None).unwrap();

        bans.unban(2).unwrap();

        assert_eq!(bans.count(), 1);
        assert!(bans.is_banned(1));
    }

    #[test]
    fn count_tracks_bans_minus_unbans() {
        let bans = registry();
        for id in 1..=5 {
            bans.ban(id, "user", None).unwrap();
        }
        bans.ban(3, "user again", None).unwrap();
        bans.unban(2).unwrap();
        bans.unban(4).unwrap();

        assert_eq!(bans.count(), 3);
        let ids: Vec<i64> = bans.list().unwrap().iter().map(|u| u.user_id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn index_is_loaded_from_existing_records() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        BanRegistry::new(db.clone()).unwrap().ban(10, "Dave", None).unwrap();

        let reopened = BanRegistry::new(db).unwrap();
        assert!(reopened.is_banned(10));
        assert_eq!(reopened.count(), 1);
    }

    #[test]
    fn reload_picks_up_writes_made_behind_the_registry() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let bans = BanRegistry::new(db.clone()).unwrap();

        db.write(|tx| {
            queries::upsert_banned_user(
                tx,
                &BannedUserRow {
                    user_id: 5,
                    name: "Eve".into(),
                    reason: None,
                },
            )
        })
        .unwrap();
        assert!(!bans.is_banned(5));

        bans.reload().unwrap();
        assert!(bans.is_banned(5));
    }
}
