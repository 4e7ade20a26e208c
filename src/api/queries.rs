use serde::{Deserialize, Serialize};

use crate::domain::chips::Money;
use crate::domain::rules::Game;
use crate::domain::{HandUid, TableUid};
use crate::infra::hand_service::HandState;

use super::dto::{TableDetailView, TableListView};

/// Запросы "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Query {
    /// Получить состояние стола.
    GetTable { table_uid: TableUid },

    /// Получить список столов (для лобби).
    ListTables(ListFilter),

    /// Получить состояние раздачи из подсистемы раздач.
    GetHand { hand_uid: HandUid },
}

/// Результат запроса "только чтение".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueryResponse {
    Table(TableDetailView),
    Tables(Vec<TableListView>),
    Hand(HandState),
}

/// Фильтр лобби. Пустой фильтр пропускает все столы.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListFilter {
    /// Только столы, за которыми кто-то сидит.
    pub has_players_only: bool,
    /// Только перечисленные игры (None – любые).
    pub games: Option<Vec<Game>>,
    /// Нижняя граница стейка включительно.
    pub min_stake: Option<Money>,
    /// Верхняя граница стейка включительно.
    pub max_stake: Option<Money>,
}

impl ListFilter {
    pub fn matches(&self, view: &TableListView) -> bool {
        if self.has_players_only && view.players_count == 0 {
            return false;
        }
        if let Some(games) = &self.games {
            if !games.contains(&view.game) {
                return false;
            }
        }
        if let Some(min) = self.min_stake {
            if view.stake.cents < min.cents {
                return false;
            }
        }
        if let Some(max) = self.max_stake {
            if view.stake.cents > max.cents {
                return false;
            }
        }
        true
    }
}
