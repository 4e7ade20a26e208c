//! Позиции за столом (кнопка, малый и большой блайнды) и алгоритм их сдвига.
//!
//! Места нумеруются 1..=max_seat, обход идёт по часовой стрелке:
//! после max_seat снова идёт место 1.

use serde::{Deserialize, Serialize};

use crate::domain::errors::TableError;
use crate::domain::player::Player;
use crate::domain::Seat;

/// Позиции на текущую раздачу.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Positions {
    /// Малый блайнд. Может отсутствовать (если игрок на BB ушёл из-за стола).
    pub small_blind: Option<Seat>,
    pub big_blind: Seat,
    /// Кнопка. Может стоять на пустом месте (dead button).
    pub button: Seat,
}

/// Игрок на месте `seat`, если место существует и занято.
pub fn player_at(seats: &[Option<Player>], seat: Seat) -> Option<&Player> {
    if seat == 0 {
        return None;
    }
    seats.get(seat as usize - 1).and_then(|s| s.as_ref())
}

/// Сидит ли на месте активный игрок.
pub fn is_seat_active(seats: &[Option<Player>], seat: Seat) -> bool {
    player_at(seats, seat).map(Player::is_active).unwrap_or(false)
}

/// Следующее место по часовой стрелке после `from`, на котором сидит игрок,
/// удовлетворяющий `pred`.
///
/// Само `from` проверяется последним, после полного круга.
/// Если за круг ничего не нашлось – `TableError::NoEligibleSeats`.
pub fn next_seat_clockwise(
    seats: &[Option<Player>],
    from: Seat,
    pred: impl Fn(&Player) -> bool,
) -> Result<Seat, TableError> {
    let max = seats.len();
    if max == 0 {
        return Err(TableError::NoEligibleSeats);
    }

    let mut seat = from as usize;
    for _ in 0..max {
        seat = seat % max + 1;
        if let Some(p) = player_at(seats, seat as Seat) {
            if pred(p) {
                return Ok(seat as Seat);
            }
        }
    }

    Err(TableError::NoEligibleSeats)
}

/// Посчитать позиции на следующую раздачу.
///
/// `previous` – позиции прошлой раздачи (None до первого сдвига кнопки).
/// Функция ничего не меняет: снятие флага "ждёт BB" с игрока на большом
/// блайнде делает агрегат.
pub fn next_positions(
    seats: &[Option<Player>],
    previous: Option<&Positions>,
) -> Result<Positions, TableError> {
    let max_seat = seats.len() as Seat;

    // 1. Кнопка.
    let dead_button = previous
        .and_then(|p| p.small_blind)
        .filter(|&sb| !is_seat_active(seats, sb));

    let button = match dead_button {
        // Игрок с малого блайнда ушёл: кнопка встаёт на его место.
        Some(seat) => seat,
        None => {
            let from = previous.map(|p| p.button).unwrap_or(max_seat);
            next_seat_clockwise(seats, from, Player::is_ready_to_play)?
        }
    };

    // 2. Малый блайнд.
    let big_blind_left = previous
        .map(|p| !is_seat_active(seats, p.big_blind))
        .unwrap_or(false);

    let ready_count = seats
        .iter()
        .flatten()
        .filter(|p| p.is_ready_to_play())
        .count();
    let heads_up = ready_count == 2;

    let small_blind = if big_blind_left {
        None
    } else if heads_up && dead_button.is_none() {
        // Хедз-ап: малый блайнд ставит кнопка. Но если следующим сидит
        // новичок, который ждёт BB, малого блайнда в этой раздаче нет.
        let next = next_seat_clockwise(seats, button, Player::is_active)?;
        let next_is_waiting = player_at(seats, next)
            .map(|p| p.is_waiting_for_big_blind)
            .unwrap_or(false);

        if next_is_waiting {
            None
        } else {
            Some(button)
        }
    } else {
        Some(next_seat_clockwise(seats, button, Player::is_ready_to_play)?)
    };

    // 3. Большой блайнд: подходят и те, кто ждёт BB.
    let big_blind = next_seat_clockwise(seats, small_blind.unwrap_or(button), Player::is_active)?;

    Ok(Positions {
        small_blind,
        big_blind,
        button,
    })
}
