use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::Seat;

/// Игрок, сидящий за конкретным столом.
///
/// Создаётся при посадке, удаляется при вставании, всё остальное время
/// меняется на месте.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    /// Ник игрока, уникален в пределах стола.
    pub nickname: String,
    /// Место игрока (1..=max_seat).
    pub seat: Seat,
    /// Текущий стек за столом.
    pub stack: Chips,
    /// Игрок взял паузу (sit out) и не участвует в раздачах.
    pub is_sitting_out: bool,
    /// Игрок сел во время раздачи и ждёт, пока до него дойдёт большой блайнд.
    pub is_waiting_for_big_blind: bool,
}

impl Player {
    pub fn new(nickname: impl Into<String>, seat: Seat, stack: Chips) -> Self {
        Self {
            nickname: nickname.into(),
            seat,
            stack,
            is_sitting_out: false,
            is_waiting_for_big_blind: false,
        }
    }

    /// Активный = сидит за столом и не на паузе.
    pub fn is_active(&self) -> bool {
        !self.is_sitting_out
    }

    /// Может ли игрок получить кнопку или малый блайнд.
    pub fn is_ready_to_play(&self) -> bool {
        self.is_active() && !self.is_waiting_for_big_blind
    }
}
