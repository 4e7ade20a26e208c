// src/infra/event_log.rs

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::events::{CodecError, StoredEvent, TableEvent};
use crate::domain::TableUid;
use crate::infra::ids::IdGenerator;

/// Ошибки журнала событий.
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("Стол {0} не найден")]
    TableNotFound(TableUid),

    /// Кто-то успел дописать в журнал стола раньше нас.
    #[error("Конфликт версий стола {table_uid}: ожидалась {expected}, в журнале {actual}")]
    ConcurrencyConflict {
        table_uid: TableUid,
        expected: u64,
        actual: u64,
    },

    /// Запись журнала не читается – журнал повреждён.
    #[error("Повреждённая запись журнала: {0}")]
    Codec(#[from] CodecError),

    #[error("Журнал событий недоступен: {0}")]
    Unavailable(String),
}

impl EventLogError {
    /// Имеет ли смысл повторить вызов.
    pub fn is_transient(&self) -> bool {
        matches!(self, EventLogError::Unavailable(_))
    }
}

/// Журнал событий столов (append-only, отдельный поток на каждый стол).
///
/// Это единственная граница надёжности: всё остальное (read-модель,
/// интеграционные события) выводится из него.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Выдать новый ID стола.
    async fn next_uid(&self) -> Result<TableUid, EventLogError>;

    /// Все события стола по порядку. Пустой журнал = `TableNotFound`.
    async fn get_events(&self, table_uid: TableUid) -> Result<Vec<TableEvent>, EventLogError>;

    /// Атомарно дописать события, если в журнале сейчас ровно
    /// `expected_version` событий. Пустой список – ничего не делает.
    async fn append_events(
        &self,
        table_uid: TableUid,
        expected_version: u64,
        events: &[TableEvent],
    ) -> Result<(), EventLogError>;
}

/// Простая in-memory реализация для тестов и локального запуска.
///
/// События хранятся в сериализованном виде (`StoredEvent`), поэтому
/// запись и чтение проходят через тот же кодек, что и в настоящем хранилище.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    ids: IdGenerator,
    streams: RwLock<HashMap<TableUid, Vec<StoredEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Сырые записи журнала стола (для тестов и отладки).
    pub async fn stored_events(&self, table_uid: TableUid) -> Vec<StoredEvent> {
        self.streams
            .read()
            .await
            .get(&table_uid)
            .cloned()
            .unwrap_or_default()
    }

    /// Дописать сырую запись в обход кодека. Нужна, чтобы проверять реакцию
    /// на повреждённый журнал.
    pub async fn push_raw(&self, table_uid: TableUid, stored: StoredEvent) {
        self.streams
            .write()
            .await
            .entry(table_uid)
            .or_default()
            .push(stored);
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn next_uid(&self) -> Result<TableUid, EventLogError> {
        Ok(self.ids.next_table_uid())
    }

    async fn get_events(&self, table_uid: TableUid) -> Result<Vec<TableEvent>, EventLogError> {
        let streams = self.streams.read().await;
        let stream = streams
            .get(&table_uid)
            .filter(|s| !s.is_empty())
            .ok_or(EventLogError::TableNotFound(table_uid))?;

        let events = stream
            .iter()
            .map(StoredEvent::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    async fn append_events(
        &self,
        table_uid: TableUid,
        expected_version: u64,
        events: &[TableEvent],
    ) -> Result<(), EventLogError> {
        if events.is_empty() {
            return Ok(());
        }

        // Кодируем до захвата блокировки: при ошибке журнал не трогаем.
        let encoded = events
            .iter()
            .map(StoredEvent::encode)
            .collect::<Result<Vec<_>, _>>()?;

        let mut streams = self.streams.write().await;
        let stream = streams.entry(table_uid).or_default();

        let actual = stream.len() as u64;
        if actual != expected_version {
            return Err(EventLogError::ConcurrencyConflict {
                table_uid,
                expected: expected_version,
                actual,
            });
        }

        stream.extend(encoded);
        Ok(())
    }
}
