//! Оркестрация стола: обработчики команд, unit of work, диспетчер событий.
//!
//! Агрегат `Table` синхронный и чистый. Весь I/O (журнал, read-модель,
//! брокер, подсистема раздач) живёт здесь, под таймаутом и повторами.

pub mod dispatcher;
pub mod errors;
pub mod handlers;
pub mod io;
pub mod locks;
pub mod unit_of_work;

pub use dispatcher::{DispatchContext, EventDispatcher, Translator};
pub use errors::EngineError;
pub use handlers::{TableCommandHandler, TableQueryHandler};
pub use locks::TableLocks;
pub use unit_of_work::{CommitReport, UnitOfWork};
