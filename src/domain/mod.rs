//! Доменная модель кеш-стола: правила, места, игроки, позиции (кнопка/блайнды),
//! доменные события и сам агрегат `Table`.

pub mod chips;
pub mod errors;
pub mod events;
pub mod player;
pub mod positions;
pub mod rules;
pub mod table;

/// Идентификатор стола. Выдаётся журналом событий один раз при создании.
pub type TableUid = u64;

/// Идентификатор раздачи. Выдаётся внешней подсистемой раздач (Hand).
pub type HandUid = u64;

/// Номер места за столом: 1..=max_seat, по кругу.
pub type Seat = u8;

// Удобные реэкспорты, чтобы в других модулях писать crate::domain::Table и т.п.
pub use chips::*;
pub use errors::*;
pub use events::*;
pub use player::*;
pub use positions::*;
pub use rules::*;
pub use table::*;
