use serde::{Deserialize, Serialize};

use crate::domain::chips::{Chips, Money};
use crate::domain::positions::Positions;
use crate::domain::rules::Game;
use crate::domain::{HandUid, Seat, TableUid};

/// DTO игрока за столом.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerView {
    pub nickname: String,
    pub seat: Seat,
    pub stack: Chips,
    pub is_sitting_out: bool,
    pub is_waiting_for_big_blind: bool,
}

/// Подробное представление стола (экран стола во фронте).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDetailView {
    pub table_uid: TableUid,
    pub game: Game,
    pub max_seat: Seat,
    /// 100 больших блайндов в деньгах.
    pub stake: Money,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub chip_cost: Money,
    /// Текущая раздача, если идёт.
    pub current_hand_uid: Option<HandUid>,
    /// Кнопка/блайнды последнего сдвига (None до первой раздачи).
    pub positions: Option<Positions>,
    /// Игроки в порядке мест.
    pub players: Vec<PlayerView>,
}

/// Строка лобби.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableListView {
    pub table_uid: TableUid,
    pub game: Game,
    pub max_seat: Seat,
    pub stake: Money,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub players_count: usize,
}

impl From<&TableDetailView> for TableListView {
    fn from(view: &TableDetailView) -> Self {
        Self {
            table_uid: view.table_uid,
            game: view.game,
            max_seat: view.max_seat,
            stake: view.stake,
            small_blind: view.small_blind,
            big_blind: view.big_blind,
            players_count: view.players.len(),
        }
    }
}

/// Ответ API на команду: эхо результата.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandResponse {
    /// Создан новый стол.
    TableCreated(TableDetailView),

    /// Обновлённое состояние стола после команды.
    TableState(TableDetailView),

    /// Запущена новая раздача.
    HandStarted {
        hand_uid: HandUid,
        table: TableDetailView,
    },

    /// Действие игрока передано в подсистему раздач.
    ActionSubmitted { hand_uid: HandUid, nickname: String },
}
