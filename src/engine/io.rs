// src/engine/io.rs

use std::future::Future;

use tracing::warn;

use crate::config::EngineConfig;
use crate::engine::errors::EngineError;

/// Один I/O-вызов с таймаутом, без повторов.
///
/// Для неидемпотентных вызовов (старт раздачи, действие игрока):
/// повтор мог бы запустить раздачу дважды.
pub async fn call_once<T, E, Fut>(
    config: &EngineConfig,
    what: &'static str,
    fut: Fut,
) -> Result<T, EngineError>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<EngineError>,
{
    match tokio::time::timeout(config.io_timeout, fut).await {
        Ok(res) => res.map_err(Into::into),
        Err(_) => Err(EngineError::Timeout(what)),
    }
}

/// I/O-вызов с таймаутом и повторами временных ошибок по `config.retry`.
pub async fn call_with_retry<T, E, F, Fut>(
    config: &EngineConfig,
    what: &'static str,
    mut op: F,
) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<EngineError>,
{
    let mut attempt = 0u32;
    loop {
        match call_once(config, what, op()).await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt + 1 < config.retry.max_attempts => {
                let delay = config.retry.delay_for(attempt);
                warn!(what, attempt, ?delay, error = %e, "I/O-вызов не удался, повторяем");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
