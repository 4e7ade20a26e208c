use crate::api::dto::{PlayerView, TableDetailView};
use crate::domain::player::Player;
use crate::domain::table::Table;

/// Маппинг игрока в DTO.
pub fn map_player_to_view(player: &Player) -> PlayerView {
    PlayerView {
        nickname: player.nickname.clone(),
        seat: player.seat,
        stack: player.stack,
        is_sitting_out: player.is_sitting_out,
        is_waiting_for_big_blind: player.is_waiting_for_big_blind,
    }
}

/// Утилита: маппинг агрегата `Table` -> `TableDetailView`.
///
/// Используется и read-моделью (`TableStorage::save_view`), и обработчиками
/// команд для эха результата.
pub fn map_table_to_view(table: &Table) -> TableDetailView {
    let rules = table.rules();

    TableDetailView {
        table_uid: table.uid(),
        game: rules.game,
        max_seat: rules.max_seat,
        stake: rules.stake(),
        small_blind: rules.small_blind,
        big_blind: rules.big_blind,
        chip_cost: rules.chip_cost,
        current_hand_uid: table.current_hand_uid().ok(),
        positions: table.positions().copied(),
        players: table.players().map(map_player_to_view).collect(),
    }
}
