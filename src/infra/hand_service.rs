//! Порт к внешней подсистеме раздач (Hand).
//!
//! Ставки, карты, банк и шоудаун живут там. Ядро стола передаёт только
//! идентификаторы и снимок мест/стеков и никогда не интерпретирует действия.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::api::commands::PlayerActionType;
use crate::domain::chips::Chips;
use crate::domain::positions::Positions;
use crate::domain::rules::Rules;
use crate::domain::table::Table;
use crate::domain::{HandUid, Seat, TableUid};
use crate::infra::ids::IdGenerator;

/// Снимок места, который уходит в подсистему раздач при старте.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatSnapshot {
    pub nickname: String,
    pub seat: Seat,
    pub stack: Chips,
    pub is_waiting_for_big_blind: bool,
}

impl SeatSnapshot {
    /// Снимок всех активных игроков стола в порядке мест.
    pub fn of_table(table: &Table) -> Vec<SeatSnapshot> {
        table
            .players()
            .filter(|p| p.is_active())
            .map(|p| SeatSnapshot {
                nickname: p.nickname.clone(),
                seat: p.seat,
                stack: p.stack,
                is_waiting_for_big_blind: p.is_waiting_for_big_blind,
            })
            .collect()
    }
}

/// Действие, принятое подсистемой раздач.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmittedAction {
    pub nickname: String,
    pub action: PlayerActionType,
    pub amount: Chips,
}

/// Состояние раздачи в том виде, в каком его отдаёт подсистема раздач.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandState {
    pub hand_uid: HandUid,
    pub table_uid: TableUid,
    pub rules: Rules,
    pub seats: Vec<SeatSnapshot>,
    pub positions: Option<Positions>,
    pub actions: Vec<SubmittedAction>,
}

#[derive(Debug, Error)]
pub enum HandServiceError {
    #[error("Раздача {0} не найдена")]
    HandNotFound(HandUid),

    #[error("Подсистема раздач отклонила запрос: {0}")]
    Rejected(String),

    #[error("Подсистема раздач недоступна: {0}")]
    Unavailable(String),
}

impl HandServiceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, HandServiceError::Unavailable(_))
    }
}

#[async_trait]
pub trait HandService: Send + Sync {
    /// Запустить раздачу и вернуть её ID.
    async fn start(
        &self,
        table_uid: TableUid,
        rules: &Rules,
        seats: Vec<SeatSnapshot>,
        positions: Option<Positions>,
    ) -> Result<HandUid, HandServiceError>;

    /// Передать действие игрока в раздачу.
    async fn submit_player_action(
        &self,
        hand_uid: HandUid,
        nickname: &str,
        action: PlayerActionType,
        amount: Chips,
    ) -> Result<(), HandServiceError>;

    async fn get(&self, hand_uid: HandUid) -> Result<HandState, HandServiceError>;
}

/// In-memory подсистема раздач: только запоминает старты и действия.
/// Для тестов и демо-CLI.
#[derive(Debug, Default)]
pub struct InMemoryHandService {
    ids: IdGenerator,
    hands: RwLock<HashMap<HandUid, HandState>>,
}

impl InMemoryHandService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Генерировать ID раздач начиная с `first`.
    pub fn starting_at(first: HandUid) -> Self {
        Self {
            ids: IdGenerator::starting_at(first),
            hands: RwLock::default(),
        }
    }
}

#[async_trait]
impl HandService for InMemoryHandService {
    async fn start(
        &self,
        table_uid: TableUid,
        rules: &Rules,
        seats: Vec<SeatSnapshot>,
        positions: Option<Positions>,
    ) -> Result<HandUid, HandServiceError> {
        if seats.len() < 2 {
            return Err(HandServiceError::Rejected(format!(
                "для раздачи нужно минимум 2 игрока, передано {}",
                seats.len()
            )));
        }

        let hand_uid = self.ids.next_hand_uid();
        let state = HandState {
            hand_uid,
            table_uid,
            rules: rules.clone(),
            seats,
            positions,
            actions: Vec::new(),
        };
        self.hands.write().await.insert(hand_uid, state);
        Ok(hand_uid)
    }

    async fn submit_player_action(
        &self,
        hand_uid: HandUid,
        nickname: &str,
        action: PlayerActionType,
        amount: Chips,
    ) -> Result<(), HandServiceError> {
        let mut hands = self.hands.write().await;
        let hand = hands
            .get_mut(&hand_uid)
            .ok_or(HandServiceError::HandNotFound(hand_uid))?;

        if !hand.seats.iter().any(|s| s.nickname == nickname) {
            return Err(HandServiceError::Rejected(format!(
                "игрок {} не участвует в раздаче {}",
                nickname, hand_uid
            )));
        }

        hand.actions.push(SubmittedAction {
            nickname: nickname.to_string(),
            action,
            amount,
        });
        Ok(())
    }

    async fn get(&self, hand_uid: HandUid) -> Result<HandState, HandServiceError> {
        self.hands
            .read()
            .await
            .get(&hand_uid)
            .cloned()
            .ok_or(HandServiceError::HandNotFound(hand_uid))
    }
}
