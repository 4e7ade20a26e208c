//! Инфраструктурный слой вокруг агрегата стола:
//! - генерация ID;
//! - журнал событий (порт + in-memory реализация);
//! - read-модель столов;
//! - подсистема раздач и брокер сообщений (порты + in-memory реализации);
//! - маппинги domain -> DTO;
//! - политика повторов I/O.

pub mod event_log;
pub mod hand_service;
pub mod ids;
pub mod mapping;
pub mod messaging;
pub mod retry;
pub mod storage;

pub use event_log::*;
pub use hand_service::*;
pub use ids::*;
pub use mapping::*;
pub use messaging::*;
pub use retry::*;
pub use storage::*;
