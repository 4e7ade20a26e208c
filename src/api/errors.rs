use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::errors::ErrorKind;
use crate::engine::EngineError;

/// Ошибки внешнего API (то, что отдаём клиенту).
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiError {
    /// Команда противоречит правилам или входные данные некорректны.
    #[error("Некорректный запрос: {0}")]
    BadRequest(String),

    #[error("Не найдено: {0}")]
    NotFound(String),

    /// Команда не может быть выполнена в текущем состоянии стола.
    #[error("Конфликт: {0}")]
    Conflict(String),

    /// Временная недоступность, можно повторить позже.
    #[error("Сервис недоступен: {0}")]
    Unavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::BadRequest => ApiError::BadRequest(message),
            ErrorKind::NotFound => ApiError::NotFound(message),
            ErrorKind::Conflict => ApiError::Conflict(message),
            ErrorKind::Unavailable => ApiError::Unavailable(message),
            ErrorKind::Fatal => ApiError::Internal(message),
        }
    }
}
