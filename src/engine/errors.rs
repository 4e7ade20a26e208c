use thiserror::Error;

use crate::domain::errors::{ErrorKind, ReplayError, TableError};
use crate::domain::TableUid;
use crate::infra::event_log::EventLogError;
use crate::infra::hand_service::HandServiceError;
use crate::infra::messaging::PublishError;
use crate::infra::storage::StorageError;

/// Ошибки слоя оркестрации (обработчики команд, unit of work).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Доменная ошибка агрегата: повторять бессмысленно.
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Стол {0} не найден")]
    TableNotFound(TableUid),

    #[error("Некорректные правила стола: {0}")]
    InvalidRules(String),

    /// Журнал стола не восстанавливается – хранилище повреждено.
    #[error("Журнал стола {table_uid} повреждён: {source}")]
    Replay {
        table_uid: TableUid,
        #[source]
        source: ReplayError,
    },

    #[error(transparent)]
    EventLog(EventLogError),

    #[error(transparent)]
    Storage(StorageError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    HandService(#[from] HandServiceError),

    #[error("Таймаут I/O-вызова {0}")]
    Timeout(&'static str),
}

impl From<EventLogError> for EngineError {
    fn from(e: EventLogError) -> Self {
        match e {
            EventLogError::TableNotFound(uid) => EngineError::TableNotFound(uid),
            other => EngineError::EventLog(other),
        }
    }
}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::TableNotFound(uid) => EngineError::TableNotFound(uid),
            other => EngineError::Storage(other),
        }
    }
}

impl EngineError {
    /// Временная ли ошибка (имеет ли смысл повтор с задержкой).
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::EventLog(e) => e.is_transient(),
            EngineError::Storage(e) => e.is_transient(),
            EngineError::Publish(e) => e.is_transient(),
            EngineError::HandService(e) => e.is_transient(),
            EngineError::Timeout(_) => true,
            EngineError::Table(_)
            | EngineError::TableNotFound(_)
            | EngineError::InvalidRules(_)
            | EngineError::Replay { .. } => false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Table(e) => e.kind(),
            EngineError::TableNotFound(_) => ErrorKind::NotFound,
            EngineError::InvalidRules(_) => ErrorKind::BadRequest,
            EngineError::EventLog(EventLogError::ConcurrencyConflict { .. }) => ErrorKind::Conflict,
            EngineError::HandService(HandServiceError::HandNotFound(_)) => ErrorKind::NotFound,
            EngineError::HandService(HandServiceError::Rejected(_)) => ErrorKind::BadRequest,
            EngineError::Replay { .. } | EngineError::EventLog(EventLogError::Codec(_)) => {
                ErrorKind::Fatal
            }
            other if other.is_transient() => ErrorKind::Unavailable,
            _ => ErrorKind::Fatal,
        }
    }
}
