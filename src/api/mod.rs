//! Внешний API стола.
//!
//! - команды (commands.rs) – всё, что меняет стол;
//! - запросы (queries.rs) – только чтение;
//! - DTO (dto.rs) – read-модель для фронта;
//! - ошибки (errors.rs) – то, что видит клиент.

pub mod commands;
pub mod dto;
pub mod errors;
pub mod queries;

pub use commands::*;
pub use dto::*;
pub use errors::*;
pub use queries::*;
