//! Политика повторов для I/O на границе оркестрации
//! (журнал событий, read-модель, брокер, подсистема раздач).

use std::time::Duration;

/// Настройки повторов с экспоненциальной задержкой.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Сколько всего попыток (1 = без повторов).
    pub max_attempts: u32,
    /// Задержка перед первым повтором.
    pub base_delay: Duration,
    /// Потолок задержки.
    pub max_delay: Duration,
    /// Множитель экспоненциальной задержки.
    pub backoff_multiplier: f64,
    /// Случайно укорачивать задержку (до 50%), чтобы повторы разных столов
    /// не шли синхронно.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Одна попытка, без повторов.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Быстрые повторы без задержек – для тестов.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Задержка перед повтором номер `attempt` (с нуля).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis((self.base_delay.as_millis() as f64 * multiplier) as u64)
            .min(self.max_delay);

        if self.jitter {
            apply_jitter(delay)
        } else {
            delay
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn apply_jitter(delay: Duration) -> Duration {
    use rand::Rng;

    let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
    delay.mul_f64(factor)
}

// На wasm rand нет: задержка без разброса.
#[cfg(target_arch = "wasm32")]
fn apply_jitter(delay: Duration) -> Duration {
    delay
}
