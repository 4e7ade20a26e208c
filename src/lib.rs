//! Ядро кеш-стола покера на Linera: рассадка, кнопка и блайнды, журнал событий.
//!
//! Здесь описываем ABI (Operation / Message / Query / Response), чтобы
//! командный интерфейс стола можно было разместить как приложение Linera.

pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infra;
pub mod telemetry;

use linera_sdk::linera_base_types::{ContractAbi, ServiceAbi};
use serde::{Deserialize, Serialize};

use crate::api::{Command, Query, QueryResponse};

/// Операции, которые принимает приложение: одна операция = одна команда.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TableOperation {
    Command(Command),
}

/// Сообщения между приложениями Linera. Пока не нужны.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TableMessage {}

/// Запросы к сервису (read-only).
pub type TableQuery = Query;

pub type TableQueryResponse = QueryResponse;

/// ABI для контракта и сервиса.
#[derive(Clone, Debug)]
pub struct TableAbi;

impl ContractAbi for TableAbi {
    type Operation = TableOperation;
    type Response = ();
}

impl ServiceAbi for TableAbi {
    type Query = TableQuery;
    type QueryResponse = TableQueryResponse;
}
