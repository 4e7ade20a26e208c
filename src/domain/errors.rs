use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::chips::Chips;
use crate::domain::{HandUid, Seat};

/// Класс ошибки: по нему внешний слой решает, что отдать клиенту.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorKind {
    /// Неизвестный стол/игрок/место.
    NotFound,
    /// Операция противоречит текущему состоянию стола.
    Conflict,
    /// Некорректные входные данные.
    BadRequest,
    /// Временная недоступность инфраструктуры: можно повторить позже.
    Unavailable,
    /// Нарушен внутренний инвариант (битый журнал и т.п.).
    Fatal,
}

/// Ошибки агрегата стола.
///
/// Все они детерминированы: при ошибке состояние стола не меняется
/// и новых событий не появляется.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Место {0} не существует за столом")]
    SeatNotFound(Seat),

    #[error("Место {0} уже занято")]
    SeatOccupied(Seat),

    #[error("Игрок {0} уже сидит за столом")]
    PlayerAlreadySeated(String),

    #[error("Игрок {0} не найден за столом")]
    PlayerNotFound(String),

    #[error("Игрок {0} уже на паузе")]
    PlayerAlreadySittingOut(String),

    #[error("Игрок {0} уже в игре")]
    PlayerAlreadySittingIn(String),

    #[error("Недостаточно фишек: стек {stack}, запрошено {requested}")]
    InsufficientChips { stack: Chips, requested: Chips },

    #[error("Предыдущая раздача ещё не завершена")]
    PreviousHandNotFinished,

    #[error("Недостаточно активных игроков для раздачи")]
    NotEnoughPlayers,

    #[error("Раздача уже идёт")]
    HandAlreadyInProgress,

    #[error("Раздача не активна")]
    NoHandInProgress,

    #[error("Раздача {given} не совпадает с текущей {current}")]
    HandMismatch { current: HandUid, given: HandUid },

    #[error("Нет подходящих мест при обходе стола")]
    NoEligibleSeats,
}

impl TableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::SeatNotFound(_) | TableError::PlayerNotFound(_) => ErrorKind::NotFound,
            TableError::SeatOccupied(_)
            | TableError::PlayerAlreadySeated(_)
            | TableError::PlayerAlreadySittingOut(_)
            | TableError::PlayerAlreadySittingIn(_)
            | TableError::PreviousHandNotFinished
            | TableError::NotEnoughPlayers
            | TableError::HandAlreadyInProgress
            | TableError::NoHandInProgress
            | TableError::HandMismatch { .. } => ErrorKind::Conflict,
            TableError::InsufficientChips { .. } => ErrorKind::BadRequest,
            TableError::NoEligibleSeats => ErrorKind::Fatal,
        }
    }
}

/// Ошибки восстановления стола из журнала событий.
///
/// Любая из них означает, что журнал повреждён: это не доменная ошибка
/// и повторять операцию бессмысленно.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Журнал стола пуст")]
    EmptyHistory,

    #[error("Первое событие журнала должно быть TableCreated, получено {0}")]
    MissingTableCreated(&'static str),

    #[error("Повторное TableCreated на позиции {0}")]
    DuplicateTableCreated(usize),

    #[error("Событие #{index} ({tag}) не применяется к столу: {source}")]
    Corrupted {
        index: usize,
        tag: &'static str,
        #[source]
        source: TableError,
    },
}
