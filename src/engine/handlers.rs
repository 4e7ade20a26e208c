// src/engine/handlers.rs

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::commands::*;
use crate::api::dto::{CommandResponse, TableDetailView};
use crate::api::queries::{Query, QueryResponse};
use crate::config::EngineConfig;
use crate::domain::errors::TableError;
use crate::domain::table::Table;
use crate::domain::TableUid;
use crate::engine::dispatcher::EventDispatcher;
use crate::engine::errors::EngineError;
use crate::engine::io::{call_once, call_with_retry};
use crate::engine::locks::TableLocks;
use crate::engine::unit_of_work::UnitOfWork;
use crate::infra::event_log::EventLog;
use crate::infra::hand_service::{HandService, SeatSnapshot};
use crate::infra::mapping::map_table_to_view;
use crate::infra::messaging::Publisher;
use crate::infra::storage::TableStorage;

/// Обработчик команд над столами.
///
/// Каждая команда: загрузить стол (новый или из журнала), вызвать ровно одну
/// операцию агрегата, зафиксировать через unit of work и вернуть эхо.
/// Команды одного стола сериализуются через `TableLocks`.
pub struct TableCommandHandler {
    event_log: Arc<dyn EventLog>,
    storage: Arc<dyn TableStorage>,
    hands: Arc<dyn HandService>,
    dispatcher: Arc<EventDispatcher>,
    config: Arc<EngineConfig>,
    locks: TableLocks,
}

impl TableCommandHandler {
    /// Собрать обработчик со стандартным диспетчером событий.
    pub fn new(
        event_log: Arc<dyn EventLog>,
        storage: Arc<dyn TableStorage>,
        hands: Arc<dyn HandService>,
        publisher: Arc<dyn Publisher>,
        config: EngineConfig,
    ) -> Self {
        let dispatcher =
            EventDispatcher::with_default_translators(publisher, config.topic_prefix.clone());
        Self::with_dispatcher(event_log, storage, hands, Arc::new(dispatcher), config)
    }

    /// Собрать обработчик с заранее настроенным диспетчером.
    pub fn with_dispatcher(
        event_log: Arc<dyn EventLog>,
        storage: Arc<dyn TableStorage>,
        hands: Arc<dyn HandService>,
        dispatcher: Arc<EventDispatcher>,
        config: EngineConfig,
    ) -> Self {
        Self {
            event_log,
            storage,
            hands,
            dispatcher,
            config: Arc::new(config),
            locks: TableLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(
            self.event_log.clone(),
            self.storage.clone(),
            self.dispatcher.clone(),
            self.config.clone(),
        )
    }

    /// Единая точка входа для `api::Command`.
    pub async fn handle(&self, command: Command) -> Result<CommandResponse, EngineError> {
        match command {
            Command::CreateTable(c) => self.create_table(c).await,
            Command::SitDown(c) => self.sit_down(c).await,
            Command::StandUp(c) => self.stand_up(c).await,
            Command::SitOut(c) => self.sit_out(c).await,
            Command::SitIn(c) => self.sit_in(c).await,
            Command::DebitChips(c) => self.debit_chips(c).await,
            Command::CreditChips(c) => self.credit_chips(c).await,
            Command::RotateButton(c) => self.rotate_button(c).await,
            Command::StartHand(c) => self.start_hand(c).await,
            Command::FinishHand(c) => self.finish_hand(c).await,
            Command::SubmitPlayerAction(c) => self.submit_player_action(c).await,
        }
    }

    /// Восстановить стол из журнала.
    async fn load(&self, table_uid: TableUid) -> Result<Table, EngineError> {
        let log = self.event_log.as_ref();
        let events = call_with_retry(&self.config, "get_events", || log.get_events(table_uid)).await?;

        Table::from_events(table_uid, events)
            .map_err(|source| EngineError::Replay { table_uid, source })
    }

    /// Загрузить стол, применить одну операцию, зафиксировать.
    async fn mutate<F>(&self, table_uid: TableUid, op: F) -> Result<TableDetailView, EngineError>
    where
        F: FnOnce(&mut Table) -> Result<(), TableError>,
    {
        let _guard = self.locks.acquire(table_uid).await;

        let mut table = self.load(table_uid).await?;
        op(&mut table)?;
        let view = map_table_to_view(&table);

        let mut uow = self.unit_of_work();
        uow.register(table);
        uow.commit().await?;

        Ok(view)
    }

    #[instrument(skip_all)]
    pub async fn create_table(&self, cmd: CreateTableCommand) -> Result<CommandResponse, EngineError> {
        let rules = cmd.rules();
        rules.validate().map_err(EngineError::InvalidRules)?;

        let log = self.event_log.as_ref();
        let table_uid = call_with_retry(&self.config, "next_uid", || log.next_uid()).await?;
        let _guard = self.locks.acquire(table_uid).await;

        let table = Table::from_scratch(table_uid, rules);
        let view = map_table_to_view(&table);

        let mut uow = self.unit_of_work();
        uow.register(table);
        uow.commit().await?;

        info!(table_uid, game = ?view.game, max_seat = view.max_seat, "стол создан");
        Ok(CommandResponse::TableCreated(view))
    }

    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn sit_down(&self, cmd: SitDownCommand) -> Result<CommandResponse, EngineError> {
        let view = self
            .mutate(cmd.table_uid, |t| t.sit_player_down(&cmd.nickname, cmd.seat, cmd.stack))
            .await?;
        info!(nickname = %cmd.nickname, seat = cmd.seat, stack = %cmd.stack, "игрок сел за стол");
        Ok(CommandResponse::TableState(view))
    }

    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn stand_up(&self, cmd: PlayerCommand) -> Result<CommandResponse, EngineError> {
        let view = self
            .mutate(cmd.table_uid, |t| t.stand_player_up(&cmd.nickname))
            .await?;
        info!(nickname = %cmd.nickname, "игрок встал из-за стола");
        Ok(CommandResponse::TableState(view))
    }

    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn sit_out(&self, cmd: PlayerCommand) -> Result<CommandResponse, EngineError> {
        let view = self
            .mutate(cmd.table_uid, |t| t.sit_player_out(&cmd.nickname))
            .await?;
        info!(nickname = %cmd.nickname, "игрок взял паузу");
        Ok(CommandResponse::TableState(view))
    }

    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn sit_in(&self, cmd: PlayerCommand) -> Result<CommandResponse, EngineError> {
        let view = self
            .mutate(cmd.table_uid, |t| t.sit_player_in(&cmd.nickname))
            .await?;
        info!(nickname = %cmd.nickname, "игрок вернулся с паузы");
        Ok(CommandResponse::TableState(view))
    }

    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn debit_chips(&self, cmd: ChipsCommand) -> Result<CommandResponse, EngineError> {
        let view = self
            .mutate(cmd.table_uid, |t| t.debit_player_chips(&cmd.nickname, cmd.amount))
            .await?;
        info!(nickname = %cmd.nickname, amount = %cmd.amount, "фишки списаны");
        Ok(CommandResponse::TableState(view))
    }

    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn credit_chips(&self, cmd: ChipsCommand) -> Result<CommandResponse, EngineError> {
        let view = self
            .mutate(cmd.table_uid, |t| t.credit_player_chips(&cmd.nickname, cmd.amount))
            .await?;
        info!(nickname = %cmd.nickname, amount = %cmd.amount, "фишки начислены");
        Ok(CommandResponse::TableState(view))
    }

    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn rotate_button(&self, cmd: TableRef) -> Result<CommandResponse, EngineError> {
        let view = self.mutate(cmd.table_uid, |t| t.rotate_button()).await?;
        info!(positions = ?view.positions, "кнопка сдвинута");
        Ok(CommandResponse::TableState(view))
    }

    /// Запустить раздачу в подсистеме раздач и запомнить её ID за столом.
    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn start_hand(&self, cmd: TableRef) -> Result<CommandResponse, EngineError> {
        let table_uid = cmd.table_uid;
        let _guard = self.locks.acquire(table_uid).await;

        let mut table = self.load(table_uid).await?;
        // Проверяем до обращения к подсистеме раздач, чтобы не плодить
        // раздачи-сироты.
        if table.is_hand_in_progress() {
            return Err(TableError::HandAlreadyInProgress.into());
        }
        if !table.has_enough_players_for_hand() {
            return Err(TableError::NotEnoughPlayers.into());
        }

        let seats = SeatSnapshot::of_table(&table);
        let positions = table.positions().copied();
        let hand_uid = call_once(
            &self.config,
            "hand_service.start",
            self.hands.start(table_uid, table.rules(), seats, positions),
        )
        .await?;

        table.start_current_hand(hand_uid)?;
        let view = map_table_to_view(&table);

        let mut uow = self.unit_of_work();
        uow.register(table);
        if let Err(e) = uow.commit().await {
            warn!(hand_uid, error = %e, "раздача запущена, но за столом не записана");
            return Err(e);
        }

        info!(hand_uid, "раздача запущена");
        Ok(CommandResponse::HandStarted {
            hand_uid,
            table: view,
        })
    }

    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn finish_hand(&self, cmd: FinishHandCommand) -> Result<CommandResponse, EngineError> {
        let view = self
            .mutate(cmd.table_uid, |t| t.finish_current_hand(cmd.hand_uid))
            .await?;
        info!(hand_uid = cmd.hand_uid, "раздача завершена");
        Ok(CommandResponse::TableState(view))
    }

    /// Передать действие игрока в текущую раздачу. Стол не меняется.
    #[instrument(skip_all, fields(table_uid = cmd.table_uid))]
    pub async fn submit_player_action(
        &self,
        cmd: PlayerActionCommand,
    ) -> Result<CommandResponse, EngineError> {
        let table = self.load(cmd.table_uid).await?;
        let hand_uid = table.current_hand_uid()?;
        if table.player(&cmd.nickname).is_none() {
            return Err(TableError::PlayerNotFound(cmd.nickname).into());
        }

        call_once(
            &self.config,
            "hand_service.submit_player_action",
            self.hands
                .submit_player_action(hand_uid, &cmd.nickname, cmd.action, cmd.amount),
        )
        .await?;

        info!(hand_uid, nickname = %cmd.nickname, action = ?cmd.action, "действие передано в раздачу");
        Ok(CommandResponse::ActionSubmitted {
            hand_uid,
            nickname: cmd.nickname,
        })
    }
}

/// Обработчик запросов "только чтение": read-модель + подсистема раздач.
pub struct TableQueryHandler {
    storage: Arc<dyn TableStorage>,
    hands: Arc<dyn HandService>,
    config: Arc<EngineConfig>,
}

impl TableQueryHandler {
    pub fn new(
        storage: Arc<dyn TableStorage>,
        hands: Arc<dyn HandService>,
        config: EngineConfig,
    ) -> Self {
        Self {
            storage,
            hands,
            config: Arc::new(config),
        }
    }

    pub async fn handle(&self, query: Query) -> Result<QueryResponse, EngineError> {
        let storage = self.storage.as_ref();
        let hands = self.hands.as_ref();

        match query {
            Query::GetTable { table_uid } => {
                let view = call_with_retry(&self.config, "get_detail_view", || {
                    storage.get_detail_view(table_uid)
                })
                .await?;
                Ok(QueryResponse::Table(view))
            }
            Query::ListTables(filter) => {
                let filter = &filter;
                let views = call_with_retry(&self.config, "get_list_views", || {
                    storage.get_list_views(filter)
                })
                .await?;
                Ok(QueryResponse::Tables(views))
            }
            Query::GetHand { hand_uid } => {
                let hand =
                    call_with_retry(&self.config, "hand_service.get", || hands.get(hand_uid)).await?;
                Ok(QueryResponse::Hand(hand))
            }
        }
    }
}
