//! Интеграционные события и порт публикации в брокер.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::chips::Chips;
use crate::domain::positions::Positions;
use crate::domain::rules::Rules;
use crate::domain::{HandUid, Seat, TableUid};

/// Имена топиков (без префикса окружения).
pub mod topics {
    pub const TABLE_CREATED: &str = "table-created";
    pub const PLAYER_SAT_DOWN: &str = "player-sat-down";
    pub const PLAYER_STOOD_UP: &str = "player-stood-up";
    pub const PLAYER_SAT_OUT: &str = "player-sat-out";
    pub const PLAYER_SAT_IN: &str = "player-sat-in";
    pub const PLAYER_CHIPS_DEBITED: &str = "player-chips-debited";
    pub const PLAYER_CHIPS_CREDITED: &str = "player-chips-credited";
    pub const BUTTON_ROTATED: &str = "button-rotated";
    pub const HAND_STARTED: &str = "hand-started";
    pub const HAND_FINISHED: &str = "hand-finished";
}

/// Данные интеграционного события: поля доменного события
/// (для сдвига кнопки – ещё и итоговые позиции).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegrationPayload {
    TableCreated { rules: Rules },
    PlayerSatDown { nickname: String, seat: Seat, stack: Chips },
    PlayerStoodUp { nickname: String },
    PlayerSatOut { nickname: String },
    PlayerSatIn { nickname: String },
    PlayerChipsDebited { nickname: String, amount: Chips },
    PlayerChipsCredited { nickname: String, amount: Chips },
    ButtonRotated { positions: Option<Positions> },
    HandStarted { hand_uid: HandUid },
    HandFinished { hand_uid: HandUid },
}

/// Сообщение для других сервисов (подсистема раздач, realtime-транспорт).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntegrationEvent {
    pub table_uid: TableUid,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: IntegrationPayload,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Не удалось сериализовать сообщение для {topic}: {reason}")]
    Encode { topic: String, reason: String },

    #[error("Брокер недоступен: {0}")]
    Unavailable(String),
}

impl PublishError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PublishError::Unavailable(_))
    }
}

/// Публикация сообщения в именованный топик брокера.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, event: &IntegrationEvent) -> Result<(), PublishError>;
}

/// Опубликованное сообщение в том виде, в каком оно ушло бы в брокер.
#[derive(Clone, Debug, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    /// Ключ партиционирования: все сообщения стола попадают в одну партицию.
    pub key: String,
    pub body: serde_json::Value,
}

/// In-memory брокер: складывает сообщения в список.
#[derive(Debug, Default)]
pub struct InMemoryPublisher {
    messages: Mutex<Vec<PublishedMessage>>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn topics(&self) -> Vec<String> {
        self.messages
            .lock()
            .await
            .iter()
            .map(|m| m.topic.clone())
            .collect()
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn publish(&self, topic: &str, event: &IntegrationEvent) -> Result<(), PublishError> {
        let body = serde_json::to_value(event).map_err(|e| PublishError::Encode {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;

        self.messages.lock().await.push(PublishedMessage {
            topic: topic.to_string(),
            key: event.table_uid.to_string(),
            body,
        });
        Ok(())
    }
}
