use serde::{Deserialize, Serialize};

use crate::domain::chips::{Chips, Money};
use crate::domain::rules::{Game, Rules};
use crate::domain::{HandUid, Seat, TableUid};

/// Команда верхнего уровня.
///
/// Каждая команда (кроме `SubmitPlayerAction`) вызывает ровно одну операцию
/// агрегата стола. Эти же команды Linera экспонирует как операции
/// (`TableOperation`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Command {
    /// Создать новый кеш-стол.
    CreateTable(CreateTableCommand),

    /// Посадить игрока за стол.
    SitDown(SitDownCommand),

    /// Поднять игрока из-за стола.
    StandUp(PlayerCommand),

    /// Игрок берёт паузу.
    SitOut(PlayerCommand),

    /// Игрок возвращается с паузы.
    SitIn(PlayerCommand),

    /// Списать фишки со стека.
    DebitChips(ChipsCommand),

    /// Добавить фишки в стек.
    CreditChips(ChipsCommand),

    /// Сдвинуть кнопку и блайнды перед новой раздачей.
    RotateButton(TableRef),

    /// Запустить новую раздачу в подсистеме раздач и запомнить её ID.
    StartHand(TableRef),

    /// Отметить раздачу завершённой.
    FinishHand(FinishHandCommand),

    /// Действие игрока в текущей раздаче (пробрасывается в подсистему раздач).
    SubmitPlayerAction(PlayerActionCommand),
}

/// Команда создания стола.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTableCommand {
    pub game: Game,
    /// Количество мест (2–10).
    pub max_seat: Seat,
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// Стоимость одной фишки.
    pub chip_cost: Money,
}

impl CreateTableCommand {
    pub fn rules(&self) -> Rules {
        Rules::new(
            self.game,
            self.max_seat,
            self.small_blind,
            self.big_blind,
            self.chip_cost,
        )
    }
}

/// Ссылка на стол для команд без параметров.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableRef {
    pub table_uid: TableUid,
}

/// Посадить игрока в конкретное место.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SitDownCommand {
    pub table_uid: TableUid,
    pub nickname: String,
    pub seat: Seat,
    pub stack: Chips,
}

/// Команда над игроком по нику.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerCommand {
    pub table_uid: TableUid,
    pub nickname: String,
}

/// Списать/добавить фишки игроку.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChipsCommand {
    pub table_uid: TableUid,
    pub nickname: String,
    pub amount: Chips,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinishHandCommand {
    pub table_uid: TableUid,
    pub hand_uid: HandUid,
}

/// Тип действия игрока. Ядро стола его не интерпретирует.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerActionType {
    Fold,
    Check,
    Call,
    /// Bet на новой улице (когда ещё нет текущей ставки).
    Bet,
    /// Raise существующей ставки.
    Raise,
    /// All-in – поставить весь стек.
    AllIn,
}

/// Действие игрока в раздаче.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerActionCommand {
    pub table_uid: TableUid,
    pub nickname: String,
    pub action: PlayerActionType,
    /// Размер ставки (для Fold/Check/Call – 0).
    pub amount: Chips,
}
