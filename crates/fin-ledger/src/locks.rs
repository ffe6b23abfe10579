use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};

use fin_types::AccountId;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Keyed mutual exclusion: one async mutex per account, created on demand.
///
/// The map holds only weak references. A slot lives as long as some caller
/// holds or waits on its guard; afterwards the entry is dead and is pruned
/// once the map grows past `prune_threshold`. After a prune the next one
/// waits until the map holds twice the surviving slots.
pub struct AccountLocks {
    slots: StdMutex<Slots>,
    prune_threshold: usize,
}

struct Slots {
    map: HashMap<AccountId, Weak<Mutex<()>>>,
    prune_at: usize,
}

/// Exclusive access to one account for as long as the guard is alive.
pub struct AccountGuard {
    _guard: OwnedMutexGuard<()>,
}

impl AccountLocks {
    pub fn new(prune_threshold: usize) -> Self {
        let prune_threshold = prune_threshold.max(1);
        Self {
            slots: StdMutex::new(Slots {
                map: HashMap::new(),
                prune_at: prune_threshold,
            }),
            prune_threshold,
        }
    }

    /// Wait for exclusive access to `account`.
    ///
    /// Cancel-safe: dropping the returned future before it resolves leaves
    /// the lock untouched.
    pub async fn acquire(&self, account: &AccountId) -> AccountGuard {
        let slot = self.slot(account);
        let guard = slot.lock_owned().await;
        debug!(account = %account, "account lock acquired");
        AccountGuard { _guard: guard }
    }

    /// Number of entries currently in the map, live or dead.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, account: &AccountId) -> Arc<Mutex<()>> {
        // Entries are weak handles; a poisoned map is still consistent.
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(live) = slots.map.get(account).and_then(Weak::upgrade) {
            return live;
        }

        if slots.map.len() >= slots.prune_at {
            let before = slots.map.len();
            slots.map.retain(|_, slot| slot.strong_count() > 0);
            slots.prune_at = self.prune_threshold.max(slots.map.len() * 2);
            debug!(
                pruned = before - slots.map.len(),
                next = slots.prune_at,
                "pruned idle account locks"
            );
        }

        let fresh = Arc::new(Mutex::new(()));
        slots.map.insert(account.clone(), Arc::downgrade(&fresh));
        fresh
    }
}

impl Default for AccountLocks {
    fn default() -> Self {
        Self::new(crate::config::LedgerConfig::default().lock_prune_threshold)
    }
}

impl std::fmt::Debug for AccountLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountLocks")
            .field("slots", &self.len())
            .field("prune_threshold", &self.prune_threshold)
            .finish()
    }
}
