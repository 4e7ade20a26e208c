use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::config::EngineConfig;
use crate::domain::table::Table;
use crate::engine::dispatcher::{DispatchContext, EventDispatcher};
use crate::engine::errors::EngineError;
use crate::engine::io::call_with_retry;
use crate::domain::events::TableEvent;
use crate::domain::TableUid;
use crate::infra::event_log::{EventLog, EventLogError};
use crate::infra::storage::TableStorage;

/// Итог фиксации.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Сколько событий дописано в журнал.
    pub appended_events: usize,
    /// Сколько побочных действий (проекция, публикация) так и не удалось
    /// выполнить после всех повторов. Журнал при этом уже записан.
    pub side_effect_failures: usize,
}

/// Unit of work: копит изменённые агрегаты и фиксирует их.
///
/// Для каждого стола: забрать новые события, дописать в журнал
/// (с проверкой версии), обновить read-модель, разослать события.
/// Это не единая транзакция: граница надёжности – только запись в журнал.
pub struct UnitOfWork {
    event_log: Arc<dyn EventLog>,
    storage: Arc<dyn TableStorage>,
    dispatcher: Arc<EventDispatcher>,
    config: Arc<EngineConfig>,
    dirty: Vec<Table>,
}

impl UnitOfWork {
    pub fn new(
        event_log: Arc<dyn EventLog>,
        storage: Arc<dyn TableStorage>,
        dispatcher: Arc<EventDispatcher>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            event_log,
            storage,
            dispatcher,
            config,
            dirty: Vec::new(),
        }
    }

    /// Отметить стол изменённым. Повторная регистрация того же стола
    /// заменяет предыдущую.
    pub fn register(&mut self, table: Table) {
        match self.dirty.iter_mut().find(|t| t.uid() == table.uid()) {
            Some(slot) => *slot = table,
            None => self.dirty.push(table),
        }
    }

    pub async fn commit(mut self) -> Result<CommitReport, EngineError> {
        let mut report = CommitReport::default();
        let config = self.config.as_ref();

        for mut table in std::mem::take(&mut self.dirty) {
            let table_uid = table.uid();
            let expected_version = table.version();
            let events = table.pull_events();

            if events.is_empty() {
                debug!(table_uid, "нет новых событий, пропускаем");
                continue;
            }

            self.append(table_uid, expected_version, &events).await?;
            report.appended_events += events.len();
            debug!(table_uid, count = events.len(), expected_version, "события записаны в журнал");

            // Дальше – только производные действия: их ошибки журнал не откатывают.
            let storage = self.storage.as_ref();
            let snapshot = &table;
            if let Err(e) = call_with_retry(config, "save_view", || storage.save_view(snapshot)).await {
                error!(table_uid, error = %e, "не удалось обновить read-модель стола");
                report.side_effect_failures += 1;
            }

            let ctx = DispatchContext {
                table_uid,
                occurred_at: Utc::now(),
                positions: table.positions().copied(),
            };
            let dispatcher = self.dispatcher.as_ref();
            for event in &events {
                let ctx = &ctx;
                if let Err(e) =
                    call_with_retry(config, "dispatch", || dispatcher.dispatch(event, ctx)).await
                {
                    error!(table_uid, tag = event.tag(), error = %e, "не удалось опубликовать событие");
                    report.side_effect_failures += 1;
                }
            }
        }

        Ok(report)
    }

    /// Дописать события с повторами.
    ///
    /// Если первая попытка дошла до журнала, но ответ потерялся (таймаут),
    /// повтор упрётся в конфликт версий. Тогда перечитываем поток: если его
    /// хвост – ровно наши события, запись уже сделана.
    async fn append(
        &self,
        table_uid: TableUid,
        expected_version: u64,
        events: &[TableEvent],
    ) -> Result<(), EngineError> {
        let config = self.config.as_ref();
        let log = self.event_log.as_ref();
        let mut attempts = 0u32;

        let result = call_with_retry(config, "append_events", || {
            attempts += 1;
            log.append_events(table_uid, expected_version, events)
        })
        .await;

        let conflict = matches!(
            result,
            Err(EngineError::EventLog(EventLogError::ConcurrencyConflict { .. }))
        );
        if conflict && attempts > 1 && self.already_appended(table_uid, expected_version, events).await? {
            warn!(table_uid, expected_version, "повтор записи: события уже в журнале");
            return Ok(());
        }
        result
    }

    async fn already_appended(
        &self,
        table_uid: TableUid,
        expected_version: u64,
        events: &[TableEvent],
    ) -> Result<bool, EngineError> {
        let log = self.event_log.as_ref();
        let stored = call_with_retry(self.config.as_ref(), "get_events", || log.get_events(table_uid)).await?;

        let appended_end = expected_version as usize + events.len();
        Ok(stored.len() == appended_end && stored[expected_version as usize..] == *events)
    }
}
