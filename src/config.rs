//! Конфигурация оркестрации: повторы, таймауты I/O, префикс топиков.
//!
//! Переменные окружения:
//! - `POKER_TABLE_RETRY_MAX_ATTEMPTS` (по умолчанию 3)
//! - `POKER_TABLE_RETRY_BASE_DELAY_MS` (50)
//! - `POKER_TABLE_RETRY_MAX_DELAY_MS` (2000)
//! - `POKER_TABLE_IO_TIMEOUT_MS` (5000)
//! - `POKER_TABLE_TOPIC_PREFIX` (пусто)

use std::time::Duration;

use thiserror::Error;

use crate::infra::retry::RetryPolicy;

pub const ENV_RETRY_MAX_ATTEMPTS: &str = "POKER_TABLE_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_BASE_DELAY_MS: &str = "POKER_TABLE_RETRY_BASE_DELAY_MS";
pub const ENV_RETRY_MAX_DELAY_MS: &str = "POKER_TABLE_RETRY_MAX_DELAY_MS";
pub const ENV_IO_TIMEOUT_MS: &str = "POKER_TABLE_IO_TIMEOUT_MS";
pub const ENV_TOPIC_PREFIX: &str = "POKER_TABLE_TOPIC_PREFIX";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}: ожидается целое число, получено {value:?}")]
    NotANumber { name: &'static str, value: String },

    #[error("{name}: значение должно быть больше нуля")]
    MustBePositive { name: &'static str },
}

/// Настройки слоя оркестрации.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Повторы для временных ошибок I/O.
    pub retry: RetryPolicy,
    /// Таймаут одного I/O-вызова (журнал, read-модель, брокер, раздачи).
    pub io_timeout: Duration,
    /// Префикс топиков брокера, например "staging.".
    pub topic_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            io_timeout: Duration::from_secs(5),
            topic_prefix: String::new(),
        }
    }
}

impl EngineConfig {
    /// Прочитать настройки из переменных окружения процесса.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Прочитать настройки через произвольный источник `name -> value`.
    /// Отсутствующие значения берутся из `Default`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(n) = parse_u64(&lookup, ENV_RETRY_MAX_ATTEMPTS)? {
            if n == 0 {
                return Err(ConfigError::MustBePositive {
                    name: ENV_RETRY_MAX_ATTEMPTS,
                });
            }
            cfg.retry.max_attempts = n.min(u32::MAX as u64) as u32;
        }
        if let Some(ms) = parse_u64(&lookup, ENV_RETRY_BASE_DELAY_MS)? {
            cfg.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&lookup, ENV_RETRY_MAX_DELAY_MS)? {
            cfg.retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&lookup, ENV_IO_TIMEOUT_MS)? {
            if ms == 0 {
                return Err(ConfigError::MustBePositive {
                    name: ENV_IO_TIMEOUT_MS,
                });
            }
            cfg.io_timeout = Duration::from_millis(ms);
        }
        if let Some(prefix) = lookup(ENV_TOPIC_PREFIX) {
            cfg.topic_prefix = prefix;
        }

        Ok(cfg)
    }

    /// Полное имя топика с префиксом окружения.
    pub fn topic(&self, name: &str) -> String {
        format!("{}{}", self.topic_prefix, name)
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { name, value: raw }),
    }
}
