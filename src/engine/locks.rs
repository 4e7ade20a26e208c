use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::TableUid;

/// Блокировки "один писатель на стол".
///
/// Реплей чувствителен к порядку, поэтому команды одного стола выполняются
/// строго по очереди. Разные столы друг другу не мешают.
#[derive(Debug, Default)]
pub struct TableLocks {
    locks: Mutex<HashMap<TableUid, Arc<AsyncMutex<()>>>>,
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Дождаться своей очереди на стол. Блокировка держится, пока жив guard.
    pub async fn acquire(&self, table_uid: TableUid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Запись, на которую ссылается только карта, никто не держит и не ждёт.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(table_uid).or_default().clone()
        };
        lock.lock_owned().await
    }
}
