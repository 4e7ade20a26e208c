use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{HandUid, TableUid};

/// Простая генерация ID на основе монотонных счётчиков.
/// Это удобно для in-memory журнала, локальных тестов и демо-CLI.
///
/// В проде ID столов выдаёт журнал событий (`EventLog::next_uid`),
/// а ID раздач – подсистема раздач.
#[derive(Debug)]
pub struct IdGenerator {
    table_counter: AtomicU64,
    hand_counter: AtomicU64,
}

impl IdGenerator {
    /// Создать генератор с начальным значением 1 для всех сущностей.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Генератор, который начинает с `first` (удобно, чтобы ID столов
    /// и раздач в тестах не пересекались).
    pub fn starting_at(first: u64) -> Self {
        Self {
            table_counter: AtomicU64::new(first),
            hand_counter: AtomicU64::new(first),
        }
    }

    #[inline]
    pub fn next_table_uid(&self) -> TableUid {
        self.table_counter.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn next_hand_uid(&self) -> HandUid {
        self.hand_counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
