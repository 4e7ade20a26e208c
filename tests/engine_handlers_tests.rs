// tests/engine_handlers_tests.rs
//
// Оркестрация поверх in-memory инфраструктуры: обработчики команд,
// unit of work, диспетчер событий, повторы и таймауты.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use poker_table::api::*;
use poker_table::config::{ConfigError, EngineConfig, ENV_IO_TIMEOUT_MS, ENV_RETRY_MAX_ATTEMPTS, ENV_TOPIC_PREFIX};
use poker_table::domain::{
    chips::{Chips, Currency, Money},
    errors::{ErrorKind, TableError},
    events::*,
    positions::Positions,
    rules::{Game, Rules},
    table::Table,
    HandUid, Seat, TableUid,
};
use poker_table::engine::{
    DispatchContext, EngineError, EventDispatcher, TableCommandHandler, TableQueryHandler,
    UnitOfWork,
};
use poker_table::infra::*;

//
// ---------- фейки ----------
//

/// Журнал, который первые `failures` чтений отвечает "недоступен".
struct FlakyEventLog {
    inner: InMemoryEventLog,
    failures: AtomicU32,
}

#[async_trait]
impl EventLog for FlakyEventLog {
    async fn next_uid(&self) -> Result<TableUid, EventLogError> {
        self.inner.next_uid().await
    }

    async fn get_events(&self, table_uid: TableUid) -> Result<Vec<TableEvent>, EventLogError> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(EventLogError::Unavailable("сеть моргнула".into()));
        }
        self.inner.get_events(table_uid).await
    }

    async fn append_events(
        &self,
        table_uid: TableUid,
        expected_version: u64,
        events: &[TableEvent],
    ) -> Result<(), EventLogError> {
        self.inner
            .append_events(table_uid, expected_version, events)
            .await
    }
}

/// Журнал, у которого подтверждение записи может опоздать (`slow_acks`
/// раз запись проходит, но ответ приходит через 200 мс), а запись может
/// быть недоступна вовсе (`down`).
#[derive(Default)]
struct LaggingEventLog {
    inner: InMemoryEventLog,
    slow_acks: AtomicU32,
    down: AtomicBool,
}

#[async_trait]
impl EventLog for LaggingEventLog {
    async fn next_uid(&self) -> Result<TableUid, EventLogError> {
        self.inner.next_uid().await
    }

    async fn get_events(&self, table_uid: TableUid) -> Result<Vec<TableEvent>, EventLogError> {
        self.inner.get_events(table_uid).await
    }

    async fn append_events(
        &self,
        table_uid: TableUid,
        expected_version: u64,
        events: &[TableEvent],
    ) -> Result<(), EventLogError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(EventLogError::Unavailable("запись отключена".into()));
        }
        let result = self
            .inner
            .append_events(table_uid, expected_version, events)
            .await;
        if result.is_ok()
            && self
                .slow_acks
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        result
    }
}

/// Read-модель, которая всегда недоступна.
#[derive(Default)]
struct BrokenStorage {
    calls: AtomicU32,
}

#[async_trait]
impl TableStorage for BrokenStorage {
    async fn save_view(&self, _table: &Table) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Unavailable("диск отвалился".into()))
    }

    async fn get_detail_view(&self, _table_uid: TableUid) -> Result<TableDetailView, StorageError> {
        Err(StorageError::Unavailable("диск отвалился".into()))
    }

    async fn get_list_views(&self, _filter: &ListFilter) -> Result<Vec<TableListView>, StorageError> {
        Err(StorageError::Unavailable("диск отвалился".into()))
    }
}

/// Брокер, который всегда недоступен.
struct BrokenPublisher;

#[async_trait]
impl Publisher for BrokenPublisher {
    async fn publish(&self, _topic: &str, _event: &IntegrationEvent) -> Result<(), PublishError> {
        Err(PublishError::Unavailable("брокер лежит".into()))
    }
}

/// Подсистема раздач, которая отвечает слишком долго.
struct SlowHandService;

#[async_trait]
impl HandService for SlowHandService {
    async fn start(
        &self,
        _table_uid: TableUid,
        _rules: &Rules,
        _seats: Vec<SeatSnapshot>,
        _positions: Option<Positions>,
    ) -> Result<HandUid, HandServiceError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(1)
    }

    async fn submit_player_action(
        &self,
        hand_uid: HandUid,
        _nickname: &str,
        _action: PlayerActionType,
        _amount: Chips,
    ) -> Result<(), HandServiceError> {
        Err(HandServiceError::HandNotFound(hand_uid))
    }

    async fn get(&self, hand_uid: HandUid) -> Result<HandState, HandServiceError> {
        Err(HandServiceError::HandNotFound(hand_uid))
    }
}

//
// ---------- helpers ----------
//

fn test_config() -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy::immediate(3),
        ..EngineConfig::default()
    }
}

struct Harness {
    log: Arc<InMemoryEventLog>,
    storage: Arc<InMemoryTableStorage>,
    hands: Arc<InMemoryHandService>,
    publisher: Arc<InMemoryPublisher>,
    commands: TableCommandHandler,
    queries: TableQueryHandler,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(test_config())
    }

    fn with_config(config: EngineConfig) -> Self {
        let log = Arc::new(InMemoryEventLog::new());
        let storage = Arc::new(InMemoryTableStorage::new());
        let hands = Arc::new(InMemoryHandService::starting_at(500));
        let publisher = Arc::new(InMemoryPublisher::new());

        let commands = TableCommandHandler::new(
            log.clone(),
            storage.clone(),
            hands.clone(),
            publisher.clone(),
            config.clone(),
        );
        let queries = TableQueryHandler::new(storage.clone(), hands.clone(), config);

        Self {
            log,
            storage,
            hands,
            publisher,
            commands,
            queries,
        }
    }

    async fn create_table(&self, big_blind: u64) -> TableUid {
        match self
            .commands
            .handle(Command::CreateTable(create_command(6, big_blind)))
            .await
            .unwrap()
        {
            CommandResponse::TableCreated(view) => view.table_uid,
            other => panic!("ожидали TableCreated, получили {:?}", other),
        }
    }

    async fn sit_down(&self, table_uid: TableUid, nickname: &str, seat: Seat) -> TableDetailView {
        state(
            self.commands
                .handle(Command::SitDown(SitDownCommand {
                    table_uid,
                    nickname: nickname.into(),
                    seat,
                    stack: Chips::new(1_000),
                }))
                .await
                .unwrap(),
        )
    }

    async fn rotate(&self, table_uid: TableUid) -> Positions {
        let view = state(
            self.commands
                .handle(Command::RotateButton(TableRef { table_uid }))
                .await
                .unwrap(),
        );
        view.positions.unwrap()
    }

    async fn start_hand(&self, table_uid: TableUid) -> HandUid {
        match self
            .commands
            .handle(Command::StartHand(TableRef { table_uid }))
            .await
            .unwrap()
        {
            CommandResponse::HandStarted { hand_uid, table } => {
                assert_eq!(table.current_hand_uid, Some(hand_uid));
                hand_uid
            }
            other => panic!("ожидали HandStarted, получили {:?}", other),
        }
    }
}

fn create_command(max_seat: Seat, big_blind: u64) -> CreateTableCommand {
    CreateTableCommand {
        game: Game::Holdem,
        max_seat,
        small_blind: Chips::new(big_blind / 2),
        big_blind: Chips::new(big_blind),
        chip_cost: Money::units(1, Currency::Usd),
    }
}

fn state(response: CommandResponse) -> TableDetailView {
    match response {
        CommandResponse::TableState(view) => view,
        other => panic!("ожидали TableState, получили {:?}", other),
    }
}

fn positions(button: Seat, small_blind: Option<Seat>, big_blind: Seat) -> Positions {
    Positions {
        small_blind,
        big_blind,
        button,
    }
}

//
// ---------- обработчики команд ----------
//

#[tokio::test]
async fn create_table_persists_and_projects() {
    let h = Harness::new();

    let table_uid = h.create_table(10).await;

    let stored = h.log.stored_events(table_uid).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].tag, "TableCreated");

    let view = h.storage.get_detail_view(table_uid).await.unwrap();
    assert_eq!(view.max_seat, 6);
    assert_eq!(view.stake, Money::units(1_000, Currency::Usd));
    assert!(view.players.is_empty());

    assert_eq!(h.publisher.topics().await, vec!["table-created".to_string()]);
}

#[tokio::test]
async fn create_table_rejects_invalid_rules() {
    let h = Harness::new();

    let err = h
        .commands
        .handle(Command::CreateTable(create_command(11, 10)))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidRules(_)));
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(h.publisher.published().await.is_empty());
}

#[tokio::test]
async fn dead_button_flow_end_to_end() {
    let h = Harness::new();
    let table_uid = h.create_table(10).await;
    h.sit_down(table_uid, "Alice", 2).await;
    h.sit_down(table_uid, "Bobby", 4).await;
    h.sit_down(table_uid, "Charlie", 6).await;

    assert_eq!(h.rotate(table_uid).await, positions(2, Some(4), 6));
    let hand_uid = h.start_hand(table_uid).await;
    assert_eq!(hand_uid, 500);

    let hand = h.hands.get(hand_uid).await.unwrap();
    assert_eq!(hand.table_uid, table_uid);
    assert_eq!(hand.seats.len(), 3);
    assert_eq!(hand.positions, Some(positions(2, Some(4), 6)));

    let response = h
        .commands
        .handle(Command::SubmitPlayerAction(PlayerActionCommand {
            table_uid,
            nickname: "Alice".into(),
            action: PlayerActionType::Raise,
            amount: Chips::new(30),
        }))
        .await
        .unwrap();
    assert_eq!(
        response,
        CommandResponse::ActionSubmitted {
            hand_uid,
            nickname: "Alice".into()
        }
    );

    h.commands
        .handle(Command::StandUp(PlayerCommand {
            table_uid,
            nickname: "Bobby".into(),
        }))
        .await
        .unwrap();
    h.commands
        .handle(Command::FinishHand(FinishHandCommand { table_uid, hand_uid }))
        .await
        .unwrap();

    assert_eq!(h.rotate(table_uid).await, positions(4, Some(6), 2));

    match h.queries.handle(Query::GetTable { table_uid }).await.unwrap() {
        QueryResponse::Table(view) => {
            assert_eq!(view.positions, Some(positions(4, Some(6), 2)));
            assert_eq!(view.players.len(), 2);
            assert_eq!(view.current_hand_uid, None);
        }
        other => panic!("ожидали Table, получили {:?}", other),
    }

    match h.queries.handle(Query::GetHand { hand_uid }).await.unwrap() {
        QueryResponse::Hand(hand) => {
            assert_eq!(hand.actions.len(), 1);
            assert_eq!(hand.actions[0].action, PlayerActionType::Raise);
        }
        other => panic!("ожидали Hand, получили {:?}", other),
    }
}

#[tokio::test]
async fn heads_up_flow_end_to_end() {
    let h = Harness::new();
    let table_uid = h.create_table(10).await;
    h.sit_down(table_uid, "Alice", 2).await;
    h.sit_down(table_uid, "Bobby", 4).await;

    assert_eq!(h.rotate(table_uid).await, positions(2, Some(2), 4));
    let hand_uid = h.start_hand(table_uid).await;
    h.commands
        .handle(Command::FinishHand(FinishHandCommand { table_uid, hand_uid }))
        .await
        .unwrap();

    assert_eq!(h.rotate(table_uid).await, positions(4, Some(4), 2));
}

#[tokio::test]
async fn unknown_table_is_not_found() {
    let h = Harness::new();

    let err = h
        .commands
        .handle(Command::RotateButton(TableRef { table_uid: 404 }))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::TableNotFound(404)));
    assert!(matches!(ApiError::from(err), ApiError::NotFound(_)));
}

#[tokio::test]
async fn domain_error_appends_nothing() {
    let h = Harness::new();
    let table_uid = h.create_table(10).await;
    h.sit_down(table_uid, "Alice", 2).await;

    let err = h
        .commands
        .handle(Command::DebitChips(ChipsCommand {
            table_uid,
            nickname: "Alice".into(),
            amount: Chips::new(5_000),
        }))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Table(TableError::InsufficientChips { .. })
    ));
    assert!(matches!(ApiError::from(err), ApiError::BadRequest(_)));
    assert_eq!(h.log.stored_events(table_uid).await.len(), 2);

    let view = h.storage.get_detail_view(table_uid).await.unwrap();
    assert_eq!(view.players[0].stack, Chips::new(1_000));
}

#[tokio::test]
async fn start_hand_twice_is_a_conflict() {
    let h = Harness::new();
    let table_uid = h.create_table(10).await;
    h.sit_down(table_uid, "Alice", 2).await;
    h.sit_down(table_uid, "Bobby", 4).await;
    h.rotate(table_uid).await;
    let first = h.start_hand(table_uid).await;

    let err = h
        .commands
        .handle(Command::StartHand(TableRef { table_uid }))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Table(TableError::HandAlreadyInProgress)
    ));
    assert!(matches!(ApiError::from(err), ApiError::Conflict(_)));
    // Подсистему раздач второй раз не дёргали.
    assert!(h.hands.get(first + 1).await.is_err());
}

#[tokio::test]
async fn submit_action_without_hand_is_rejected() {
    let h = Harness::new();
    let table_uid = h.create_table(10).await;
    h.sit_down(table_uid, "Alice", 2).await;

    let err = h
        .commands
        .handle(Command::SubmitPlayerAction(PlayerActionCommand {
            table_uid,
            nickname: "Alice".into(),
            action: PlayerActionType::Check,
            amount: Chips::ZERO,
        }))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Table(TableError::NoHandInProgress)
    ));
}

#[tokio::test]
async fn integration_events_follow_domain_events() {
    let h = Harness::new();
    let table_uid = h.create_table(10).await;
    h.sit_down(table_uid, "Alice", 2).await;
    h.sit_down(table_uid, "Bobby", 4).await;
    h.rotate(table_uid).await;

    let published = h.publisher.published().await;
    let topics: Vec<&str> = published.iter().map(|m| m.topic.as_str()).collect();
    assert_eq!(
        topics,
        vec!["table-created", "player-sat-down", "player-sat-down", "button-rotated"]
    );

    let rotated = &published[3];
    assert_eq!(rotated.key, table_uid.to_string());
    assert_eq!(rotated.body["type"], "button_rotated");
    assert_eq!(rotated.body["table_uid"], table_uid);
    assert_eq!(rotated.body["positions"]["button"], 2);
    assert_eq!(rotated.body["positions"]["big_blind"], 4);
}

#[tokio::test]
async fn topic_prefix_is_applied() {
    let h = Harness::with_config(EngineConfig {
        topic_prefix: "staging.".into(),
        ..test_config()
    });

    h.create_table(10).await;

    assert_eq!(
        h.publisher.topics().await,
        vec![h.commands.config().topic("table-created")]
    );
    assert_eq!(h.publisher.topics().await, vec!["staging.table-created".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commands_on_one_table_are_serialized() {
    let h = Arc::new(Harness::new());
    let table_uid = h.create_table(10).await;

    let mut tasks = Vec::new();
    for seat in 1..=6u8 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            h.commands
                .handle(Command::SitDown(SitDownCommand {
                    table_uid,
                    nickname: format!("player-{seat}"),
                    seat,
                    stack: Chips::new(100),
                }))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(h.log.stored_events(table_uid).await.len(), 7);
    let view = h.storage.get_detail_view(table_uid).await.unwrap();
    assert_eq!(view.players.len(), 6);
}

//
// ---------- unit of work ----------
//

fn dispatcher(publisher: Arc<dyn Publisher>) -> Arc<EventDispatcher> {
    Arc::new(EventDispatcher::with_default_translators(publisher, ""))
}

fn rules() -> Rules {
    create_command(6, 10).rules()
}

#[tokio::test]
async fn stale_version_is_a_concurrency_conflict() {
    let log = Arc::new(InMemoryEventLog::new());
    let storage = Arc::new(InMemoryTableStorage::new());
    let publisher = Arc::new(InMemoryPublisher::new());
    let config = Arc::new(test_config());

    let mut created = Table::from_scratch(1, rules());
    log.append_events(1, 0, &created.pull_events()).await.unwrap();

    // Два "процесса" читают одну и ту же версию.
    let mut first = Table::from_events(1, log.get_events(1).await.unwrap()).unwrap();
    let mut second = first.clone();
    first.sit_player_down("Alice", 2, Chips::new(100)).unwrap();
    second.sit_player_down("Bobby", 2, Chips::new(100)).unwrap();

    let mut uow = UnitOfWork::new(log.clone(), storage.clone(), dispatcher(publisher.clone()), config.clone());
    uow.register(first);
    let report = uow.commit().await.unwrap();
    assert_eq!(report.appended_events, 1);
    assert_eq!(report.side_effect_failures, 0);

    let mut uow = UnitOfWork::new(log.clone(), storage, dispatcher(publisher.clone()), config);
    uow.register(second);
    let err = uow.commit().await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::EventLog(EventLogError::ConcurrencyConflict {
            expected: 1,
            actual: 2,
            ..
        })
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(log.stored_events(1).await.len(), 2);
    // Проигравший ничего не опубликовал.
    assert_eq!(publisher.published().await.len(), 1);
}

#[tokio::test]
async fn side_effect_failures_do_not_fail_the_commit() {
    let log = Arc::new(InMemoryEventLog::new());
    let storage = Arc::new(BrokenStorage::default());
    let config = Arc::new(test_config());

    let mut table = Table::from_scratch(1, rules());
    table.sit_player_down("Alice", 2, Chips::new(100)).unwrap();

    let mut uow = UnitOfWork::new(log.clone(), storage.clone(), dispatcher(Arc::new(BrokenPublisher)), config);
    uow.register(table);
    let report = uow.commit().await.unwrap();

    assert_eq!(report.appended_events, 2);
    // Одна проекция и два события.
    assert_eq!(report.side_effect_failures, 3);
    assert_eq!(storage.calls.load(Ordering::SeqCst), 3);
    assert_eq!(log.stored_events(1).await.len(), 2);
}

#[tokio::test]
async fn commit_skips_tables_without_new_events() {
    let log = Arc::new(InMemoryEventLog::new());
    let publisher = Arc::new(InMemoryPublisher::new());

    let mut created = Table::from_scratch(1, rules());
    log.append_events(1, 0, &created.pull_events()).await.unwrap();
    let unchanged = Table::from_events(1, log.get_events(1).await.unwrap()).unwrap();

    let mut uow = UnitOfWork::new(
        log.clone(),
        Arc::new(InMemoryTableStorage::new()),
        dispatcher(publisher.clone()),
        Arc::new(test_config()),
    );
    uow.register(unchanged);

    let report = uow.commit().await.unwrap();

    assert_eq!(report.appended_events, 0);
    assert!(publisher.published().await.is_empty());
}

#[tokio::test]
async fn transient_log_failures_are_retried() {
    let log = Arc::new(FlakyEventLog {
        inner: InMemoryEventLog::new(),
        failures: AtomicU32::new(0),
    });
    let commands = TableCommandHandler::new(
        log.clone(),
        Arc::new(InMemoryTableStorage::new()),
        Arc::new(InMemoryHandService::new()),
        Arc::new(InMemoryPublisher::new()),
        test_config(),
    );

    let table_uid = match commands
        .handle(Command::CreateTable(create_command(6, 10)))
        .await
        .unwrap()
    {
        CommandResponse::TableCreated(view) => view.table_uid,
        other => panic!("ожидали TableCreated, получили {:?}", other),
    };

    log.failures.store(2, Ordering::SeqCst);
    let sit = SitDownCommand {
        table_uid,
        nickname: "Alice".into(),
        seat: 1,
        stack: Chips::new(100),
    };
    commands.handle(Command::SitDown(sit.clone())).await.unwrap();

    // Больше отказов, чем попыток: ошибка доходит до клиента.
    log.failures.store(5, Ordering::SeqCst);
    let err = commands
        .handle(Command::SitDown(SitDownCommand {
            nickname: "Bobby".into(),
            seat: 2,
            ..sit
        }))
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(matches!(ApiError::from(err), ApiError::Unavailable(_)));
}

#[tokio::test]
async fn slow_hand_service_times_out() {
    let config = EngineConfig {
        io_timeout: Duration::from_millis(20),
        ..test_config()
    };
    let log = Arc::new(InMemoryEventLog::new());
    let commands = TableCommandHandler::new(
        log.clone(),
        Arc::new(InMemoryTableStorage::new()),
        Arc::new(SlowHandService),
        Arc::new(InMemoryPublisher::new()),
        config,
    );

    let mut table = Table::from_scratch(1, rules());
    table.sit_player_down("Alice", 2, Chips::new(100)).unwrap();
    table.sit_player_down("Bobby", 4, Chips::new(100)).unwrap();
    table.rotate_button().unwrap();
    log.append_events(1, 0, &table.pull_events()).await.unwrap();

    let err = commands
        .handle(Command::StartHand(TableRef { table_uid: 1 }))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Timeout("hand_service.start")));
    // Раздача не записана за столом.
    assert_eq!(log.stored_events(1).await.len(), 4);
}

#[tokio::test]
async fn lost_append_acknowledgement_still_projects_and_publishes() {
    let config = EngineConfig {
        io_timeout: Duration::from_millis(50),
        ..test_config()
    };
    let log = Arc::new(LaggingEventLog {
        slow_acks: AtomicU32::new(1),
        ..LaggingEventLog::default()
    });
    let storage = Arc::new(InMemoryTableStorage::new());
    let publisher = Arc::new(InMemoryPublisher::new());
    let commands = TableCommandHandler::new(
        log.clone(),
        storage.clone(),
        Arc::new(InMemoryHandService::new()),
        publisher.clone(),
        config,
    );

    let table_uid = match commands
        .handle(Command::CreateTable(create_command(6, 10)))
        .await
        .unwrap()
    {
        CommandResponse::TableCreated(view) => view.table_uid,
        other => panic!("ожидали TableCreated, получили {:?}", other),
    };

    // Первая запись дошла, повтор не задублировал её.
    assert_eq!(log.inner.stored_events(table_uid).await.len(), 1);
    assert!(storage.get_detail_view(table_uid).await.is_ok());
    assert_eq!(publisher.topics().await, vec!["table-created".to_string()]);
}

#[tokio::test]
async fn failed_append_after_hand_start_keeps_table_without_hand() {
    let log = Arc::new(LaggingEventLog::default());
    let storage = Arc::new(InMemoryTableStorage::new());
    let hands = Arc::new(InMemoryHandService::starting_at(700));
    let commands = TableCommandHandler::new(
        log.clone(),
        storage.clone(),
        hands.clone(),
        Arc::new(InMemoryPublisher::new()),
        test_config(),
    );

    let mut table = Table::from_scratch(1, rules());
    table.sit_player_down("Alice", 2, Chips::new(100)).unwrap();
    table.sit_player_down("Bobby", 4, Chips::new(100)).unwrap();
    table.rotate_button().unwrap();
    log.inner.append_events(1, 0, &table.pull_events()).await.unwrap();

    log.down.store(true, Ordering::SeqCst);
    let err = commands
        .handle(Command::StartHand(TableRef { table_uid: 1 }))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unavailable);
    // Раздача в подсистеме раздач есть, но за столом не записана.
    assert_eq!(hands.get(700).await.unwrap().table_uid, 1);
    assert_eq!(log.inner.stored_events(1).await.len(), 4);
    let restored = Table::from_events(1, log.get_events(1).await.unwrap()).unwrap();
    assert!(!restored.is_hand_in_progress());
}

#[tokio::test]
async fn unreadable_log_entry_is_an_internal_error() {
    let h = Harness::new();
    let table_uid = h.create_table(10).await;
    h.log
        .push_raw(
            table_uid,
            StoredEvent {
                tag: "PlayerTeleported".into(),
                payload: serde_json::json!({ "nickname": "Alice" }),
            },
        )
        .await;

    let err = h
        .commands
        .handle(Command::RotateButton(TableRef { table_uid }))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::EventLog(EventLogError::Codec(CodecError::UnknownTag(_)))
    ));
    assert_eq!(err.kind(), ErrorKind::Fatal);
    assert!(matches!(ApiError::from(err), ApiError::Internal(_)));
}

//
// ---------- диспетчер ----------
//

#[tokio::test]
async fn unregistered_event_kind_is_dropped() {
    let publisher = Arc::new(InMemoryPublisher::new());
    let mut dispatcher = EventDispatcher::with_default_translators(publisher.clone(), "");
    assert!(dispatcher.unregister(EventKind::PlayerChipsDebited).is_some());
    assert!(dispatcher.translator(EventKind::PlayerChipsDebited).is_none());

    let ctx = DispatchContext {
        table_uid: 1,
        occurred_at: Utc::now(),
        positions: None,
    };
    let debited: TableEvent = PlayerChipsDebited {
        nickname: "Alice".into(),
        amount: Chips::new(5),
    }
    .into();
    let credited: TableEvent = PlayerChipsCredited {
        nickname: "Alice".into(),
        amount: Chips::new(5),
    }
    .into();

    assert!(!dispatcher.dispatch(&debited, &ctx).await.unwrap());
    assert!(dispatcher.dispatch(&credited, &ctx).await.unwrap());

    assert_eq!(publisher.topics().await, vec!["player-chips-credited".to_string()]);
}

#[tokio::test]
async fn empty_dispatcher_publishes_nothing() {
    let publisher = Arc::new(InMemoryPublisher::new());
    let dispatcher = EventDispatcher::new(publisher.clone(), "");
    let ctx = DispatchContext {
        table_uid: 1,
        occurred_at: Utc::now(),
        positions: None,
    };

    let published = dispatcher
        .dispatch(&ButtonRotated::default().into(), &ctx)
        .await
        .unwrap();

    assert!(!published);
    assert!(publisher.published().await.is_empty());
}

//
// ---------- запросы и лобби ----------
//

#[tokio::test]
async fn lobby_filters_and_sorts_by_stake() {
    let h = Harness::new();
    let cheap = h.create_table(2).await;
    let expensive = h.create_table(100).await;
    let middle = h.create_table(10).await;
    h.sit_down(middle, "Alice", 1).await;

    let all = match h
        .queries
        .handle(Query::ListTables(ListFilter::default()))
        .await
        .unwrap()
    {
        QueryResponse::Tables(t) => t,
        other => panic!("ожидали Tables, получили {:?}", other),
    };
    let uids: Vec<TableUid> = all.iter().map(|t| t.table_uid).collect();
    assert_eq!(uids, vec![cheap, middle, expensive]);

    let with_players = match h
        .queries
        .handle(Query::ListTables(ListFilter {
            has_players_only: true,
            ..ListFilter::default()
        }))
        .await
        .unwrap()
    {
        QueryResponse::Tables(t) => t,
        other => panic!("ожидали Tables, получили {:?}", other),
    };
    assert_eq!(with_players.len(), 1);
    assert_eq!(with_players[0].table_uid, middle);
    assert_eq!(with_players[0].players_count, 1);

    let capped = match h
        .queries
        .handle(Query::ListTables(ListFilter {
            max_stake: Some(Money::units(1_000, Currency::Usd)),
            games: Some(vec![Game::Holdem]),
            ..ListFilter::default()
        }))
        .await
        .unwrap()
    {
        QueryResponse::Tables(t) => t,
        other => panic!("ожидали Tables, получили {:?}", other),
    };
    let uids: Vec<TableUid> = capped.iter().map(|t| t.table_uid).collect();
    assert_eq!(uids, vec![cheap, middle]);
}

#[tokio::test]
async fn unknown_hand_is_not_found() {
    let h = Harness::new();

    let err = h
        .queries
        .handle(Query::GetHand { hand_uid: 9 })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

//
// ---------- конфигурация ----------
//

#[test]
fn config_reads_overrides_from_lookup() {
    let cfg = EngineConfig::from_lookup(|name| match name {
        ENV_RETRY_MAX_ATTEMPTS => Some("5".into()),
        ENV_IO_TIMEOUT_MS => Some("250".into()),
        ENV_TOPIC_PREFIX => Some("prod.".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(cfg.retry.max_attempts, 5);
    assert_eq!(cfg.io_timeout, Duration::from_millis(250));
    assert_eq!(cfg.topic("hand-started"), "prod.hand-started");
    assert_eq!(cfg.retry.base_delay, EngineConfig::default().retry.base_delay);
}

#[test]
fn config_rejects_bad_values() {
    let err = EngineConfig::from_lookup(|name| {
        (name == ENV_IO_TIMEOUT_MS).then(|| "soon".to_string())
    })
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::NotANumber {
            name: ENV_IO_TIMEOUT_MS,
            value: "soon".into()
        }
    );

    let err = EngineConfig::from_lookup(|name| {
        (name == ENV_RETRY_MAX_ATTEMPTS).then(|| "0".to_string())
    })
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::MustBePositive {
            name: ENV_RETRY_MAX_ATTEMPTS
        }
    );
}
