use serde::Serialize;

use crate::domain::chips::Chips;
use crate::domain::errors::{ReplayError, TableError};
use crate::domain::events::*;
use crate::domain::player::Player;
use crate::domain::positions::{self, Positions};
use crate::domain::rules::Rules;
use crate::domain::{HandUid, Seat, TableUid};

/// Агрегат кеш-стола.
///
/// Хранит, кто где сидит, сколько у кого фишек и где сейчас кнопка/блайнды.
/// Каждая мутирующая операция проверяет инварианты, меняет состояние на месте
/// и добавляет ровно одно событие в буфер `pending`.
///
/// Сам агрегат ничего не сохраняет: буфер забирает снаружи unit of work
/// через `pull_events`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Table {
    uid: TableUid,
    rules: Rules,
    /// None – кнопка ещё ни разу не сдвигалась.
    positions: Option<Positions>,
    /// Места за столом: индекс = seat - 1, длина = max_seat.
    seats: Vec<Option<Player>>,
    /// ID текущей раздачи (Some ⇔ раздача идёт).
    current_hand_uid: Option<HandUid>,
    /// Сколько событий журнала уже применено к агрегату.
    version: u64,
    /// Новые, ещё не сохранённые события.
    #[serde(skip)]
    pending: Vec<TableEvent>,
}

impl Table {
    fn empty(uid: TableUid, rules: Rules) -> Self {
        let seats = vec![None; rules.max_seat as usize];
        Self {
            uid,
            rules,
            positions: None,
            seats,
            current_hand_uid: None,
            version: 0,
            pending: Vec::new(),
        }
    }

    /// Создать новый пустой стол. В буфере окажется `TableCreated`.
    pub fn from_scratch(uid: TableUid, rules: Rules) -> Self {
        let mut table = Self::empty(uid, rules.clone());
        table.record(TableCreated { rules });
        table
    }

    /// Восстановить стол из полного журнала.
    ///
    /// Первое событие обязано быть `TableCreated`, остальные применяются
    /// по порядку через соответствующие операции. Любая ошибка здесь означает
    /// битый журнал. После восстановления буфер новых событий пуст.
    pub fn from_events<I>(uid: TableUid, events: I) -> Result<Self, ReplayError>
    where
        I: IntoIterator<Item = TableEvent>,
    {
        let mut events = events.into_iter();

        let rules = match events.next() {
            Some(TableEvent::TableCreated(e)) => e.rules,
            Some(other) => return Err(ReplayError::MissingTableCreated(other.tag())),
            None => return Err(ReplayError::EmptyHistory),
        };

        let mut table = Self::empty(uid, rules);
        let mut applied = 1u64;

        for (offset, event) in events.enumerate() {
            table.replay(offset + 1, event)?;
            applied += 1;
        }

        table.pending.clear();
        table.version = applied;
        Ok(table)
    }

    fn replay(&mut self, index: usize, event: TableEvent) -> Result<(), ReplayError> {
        let tag = event.tag();
        let result = match event {
            TableEvent::TableCreated(_) => return Err(ReplayError::DuplicateTableCreated(index)),
            TableEvent::PlayerSatDown(e) => self.sit_player_down(&e.nickname, e.seat, e.stack),
            TableEvent::PlayerStoodUp(e) => self.stand_player_up(&e.nickname),
            TableEvent::PlayerSatOut(e) => self.sit_player_out(&e.nickname),
            TableEvent::PlayerSatIn(e) => self.sit_player_in(&e.nickname),
            TableEvent::PlayerChipsDebited(e) => self.debit_player_chips(&e.nickname, e.amount),
            TableEvent::PlayerChipsCredited(e) => self.credit_player_chips(&e.nickname, e.amount),
            TableEvent::ButtonRotated(_) => self.rotate_button(),
            TableEvent::CurrentHandStarted(e) => self.start_current_hand(e.hand_uid),
            TableEvent::CurrentHandFinished(e) => self.finish_current_hand(e.hand_uid),
        };

        result.map_err(|source| ReplayError::Corrupted { index, tag, source })
    }

    fn record(&mut self, event: impl Into<TableEvent>) {
        self.pending.push(event.into());
    }

    /// Забрать накопленные новые события. Повторный вызов вернёт пустой список.
    pub fn pull_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.pending)
    }

    //
    // ---------- чтение ----------
    //

    pub fn uid(&self) -> TableUid {
        self.uid
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn max_seat(&self) -> Seat {
        self.rules.max_seat
    }

    pub fn positions(&self) -> Option<&Positions> {
        self.positions.as_ref()
    }

    /// Количество событий журнала, из которых собран агрегат.
    /// Используется как ожидаемая версия при дозаписи.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Игроки в порядке мест.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.seats.iter().flatten()
    }

    pub fn player(&self, nickname: &str) -> Option<&Player> {
        self.players().find(|p| p.nickname == nickname)
    }

    pub fn player_at(&self, seat: Seat) -> Option<&Player> {
        positions::player_at(&self.seats, seat)
    }

    pub fn seated_count(&self) -> usize {
        self.players().count()
    }

    pub fn active_count(&self) -> usize {
        self.players().filter(|p| p.is_active()).count()
    }

    pub fn is_hand_in_progress(&self) -> bool {
        self.current_hand_uid.is_some()
    }

    pub fn has_enough_players_for_hand(&self) -> bool {
        self.active_count() >= 2
    }

    pub fn current_hand_uid(&self) -> Result<HandUid, TableError> {
        self.current_hand_uid.ok_or(TableError::NoHandInProgress)
    }

    fn player_mut(&mut self, nickname: &str) -> Result<&mut Player, TableError> {
        self.seats
            .iter_mut()
            .flatten()
            .find(|p| p.nickname == nickname)
            .ok_or_else(|| TableError::PlayerNotFound(nickname.to_string()))
    }

    //
    // ---------- рассадка ----------
    //

    /// Посадить игрока на место. Если раздача идёт, игрок ждёт большой блайнд.
    pub fn sit_player_down(
        &mut self,
        nickname: &str,
        seat: Seat,
        stack: Chips,
    ) -> Result<(), TableError> {
        if seat == 0 || seat > self.max_seat() {
            return Err(TableError::SeatNotFound(seat));
        }
        if self.player_at(seat).is_some() {
            return Err(TableError::SeatOccupied(seat));
        }
        if self.player(nickname).is_some() {
            return Err(TableError::PlayerAlreadySeated(nickname.to_string()));
        }

        let mut player = Player::new(nickname, seat, stack);
        player.is_waiting_for_big_blind = self.is_hand_in_progress();
        self.seats[seat as usize - 1] = Some(player);

        self.record(PlayerSatDown {
            nickname: nickname.to_string(),
            seat,
            stack,
        });
        Ok(())
    }

    /// Поднять игрока из-за стола. Во время раздачи тоже разрешено.
    pub fn stand_player_up(&mut self, nickname: &str) -> Result<(), TableError> {
        let seat = self.player_mut(nickname)?.seat;
        self.seats[seat as usize - 1] = None;

        self.record(PlayerStoodUp {
            nickname: nickname.to_string(),
        });
        Ok(())
    }

    pub fn sit_player_out(&mut self, nickname: &str) -> Result<(), TableError> {
        let player = self.player_mut(nickname)?;
        if player.is_sitting_out {
            return Err(TableError::PlayerAlreadySittingOut(nickname.to_string()));
        }
        player.is_sitting_out = true;
        player.is_waiting_for_big_blind = false;

        self.record(PlayerSatOut {
            nickname: nickname.to_string(),
        });
        Ok(())
    }

    pub fn sit_player_in(&mut self, nickname: &str) -> Result<(), TableError> {
        let hand_in_progress = self.is_hand_in_progress();
        let player = self.player_mut(nickname)?;
        if !player.is_sitting_out {
            return Err(TableError::PlayerAlreadySittingIn(nickname.to_string()));
        }
        player.is_sitting_out = false;
        player.is_waiting_for_big_blind = hand_in_progress;

        self.record(PlayerSatIn {
            nickname: nickname.to_string(),
        });
        Ok(())
    }

    //
    // ---------- фишки ----------
    //

    pub fn debit_player_chips(&mut self, nickname: &str, amount: Chips) -> Result<(), TableError> {
        let player = self.player_mut(nickname)?;
        player.stack = player
            .stack
            .checked_sub(amount)
            .ok_or(TableError::InsufficientChips {
                stack: player.stack,
                requested: amount,
            })?;

        self.record(PlayerChipsDebited {
            nickname: nickname.to_string(),
            amount,
        });
        Ok(())
    }

    pub fn credit_player_chips(&mut self, nickname: &str, amount: Chips) -> Result<(), TableError> {
        let player = self.player_mut(nickname)?;
        player.stack += amount;

        self.record(PlayerChipsCredited {
            nickname: nickname.to_string(),
            amount,
        });
        Ok(())
    }

    //
    // ---------- кнопка и раздачи ----------
    //

    /// Сдвинуть кнопку и блайнды перед новой раздачей.
    ///
    /// Правила (dead button, пропуск малого блайнда, хедз-ап) – в
    /// `positions::next_positions`. Игрок, попавший на большой блайнд,
    /// перестаёт ждать BB.
    pub fn rotate_button(&mut self) -> Result<(), TableError> {
        if self.is_hand_in_progress() {
            return Err(TableError::PreviousHandNotFinished);
        }
        if !self.has_enough_players_for_hand() {
            return Err(TableError::NotEnoughPlayers);
        }

        let next = positions::next_positions(&self.seats, self.positions.as_ref())?;

        if let Some(p) = self.seats[next.big_blind as usize - 1].as_mut() {
            p.is_waiting_for_big_blind = false;
        }
        self.positions = Some(next);

        self.record(ButtonRotated {});
        Ok(())
    }

    pub fn start_current_hand(&mut self, hand_uid: HandUid) -> Result<(), TableError> {
        if self.is_hand_in_progress() {
            return Err(TableError::HandAlreadyInProgress);
        }
        self.current_hand_uid = Some(hand_uid);

        self.record(CurrentHandStarted { hand_uid });
        Ok(())
    }

    pub fn finish_current_hand(&mut self, hand_uid: HandUid) -> Result<(), TableError> {
        let current = self.current_hand_uid()?;
        if current != hand_uid {
            return Err(TableError::HandMismatch {
                current,
                given: hand_uid,
            });
        }
        self.current_hand_uid = None;

        self.record(CurrentHandFinished { hand_uid });
        Ok(())
    }
}
