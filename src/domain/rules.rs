// src/domain/rules.rs

use serde::{Deserialize, Serialize};

use crate::domain::chips::{Chips, Money};
use crate::domain::Seat;

/// Максимально допустимое количество мест за кеш-столом.
pub const MAX_TABLE_SEATS: Seat = 10;

/// Разновидность игры за столом.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Game {
    /// No-Limit Texas Hold'em.
    Holdem,
    /// Pot-Limit Omaha.
    Omaha,
}

/// Неизменяемые правила стола. Задаются при создании и больше не меняются.
/// Пример: Holdem, 6-max, SB = 5, BB = 10, одна фишка = 1 USD.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rules {
    pub game: Game,
    /// Количество мест (места нумеруются 1..=max_seat).
    pub max_seat: Seat,
    /// Малый блайнд в фишках.
    pub small_blind: Chips,
    /// Большой блайнд в фишках.
    pub big_blind: Chips,
    /// Стоимость одной фишки в деньгах.
    pub chip_cost: Money,
}

impl Rules {
    pub fn new(
        game: Game,
        max_seat: Seat,
        small_blind: Chips,
        big_blind: Chips,
        chip_cost: Money,
    ) -> Self {
        Self {
            game,
            max_seat,
            small_blind,
            big_blind,
            chip_cost,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_seat < 2 || self.max_seat > MAX_TABLE_SEATS {
            return Err(format!(
                "Rules: max_seat = {}, ожидается 2..={}",
                self.max_seat, MAX_TABLE_SEATS
            ));
        }
        if self.small_blind.is_zero() {
            return Err("Rules: small_blind = 0".into());
        }
        if self.big_blind < self.small_blind {
            return Err(format!(
                "Rules: big_blind ({}) < small_blind ({})",
                self.big_blind, self.small_blind
            ));
        }
        if self.chip_cost.cents == 0 {
            return Err("Rules: chip_cost = 0".into());
        }
        Ok(())
    }

    /// Стейк стола для лобби: 100 больших блайндов в деньгах.
    pub fn stake(&self) -> Money {
        self.chip_cost.for_chips(self.big_blind) * 100
    }
}
