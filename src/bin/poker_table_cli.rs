// src/bin/poker_table_cli.rs

use std::error::Error;
use std::sync::Arc;

use poker_table::api::{
    ChipsCommand, Command, CommandResponse, CreateTableCommand, FinishHandCommand, PlayerCommand,
    Query, QueryResponse, SitDownCommand, TableDetailView, TableRef,
};
use poker_table::config::EngineConfig;
use poker_table::domain::chips::{Chips, Currency, Money};
use poker_table::domain::rules::Game;
use poker_table::domain::{Seat, TableUid};
use poker_table::engine::{TableCommandHandler, TableQueryHandler};
use poker_table::infra::{
    InMemoryEventLog, InMemoryHandService, InMemoryPublisher, InMemoryTableStorage,
};
use poker_table::telemetry::{init_logging, LogFormat};

fn main() -> CliResult<()> {
    // .env необязателен.
    let _ = dotenvy::dotenv();
    init_logging(LogFormat::from_env())?;

    let config = EngineConfig::from_env()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

struct Demo {
    commands: TableCommandHandler,
    queries: TableQueryHandler,
    publisher: Arc<InMemoryPublisher>,
}

async fn run(config: EngineConfig) -> CliResult<()> {
    println!("poker_table_cli: рассадка и сдвиг кнопки на in-memory инфраструктуре");

    let storage = Arc::new(InMemoryTableStorage::new());
    let hands = Arc::new(InMemoryHandService::starting_at(1000));
    let publisher = Arc::new(InMemoryPublisher::new());

    let demo = Demo {
        commands: TableCommandHandler::new(
            Arc::new(InMemoryEventLog::new()),
            storage.clone(),
            hands.clone(),
            publisher.clone(),
            config.clone(),
        ),
        queries: TableQueryHandler::new(storage, hands, config),
        publisher,
    };

    heads_up(&demo).await?;
    dead_button(&demo).await?;

    println!();
    println!("================ BROKER =================");
    for message in demo.publisher.published().await {
        println!("[{}] key={} {}", message.topic, message.key, message.body);
    }

    if let QueryResponse::Tables(tables) = demo.queries.handle(Query::ListTables(Default::default())).await? {
        println!();
        println!("================ LOBBY =================");
        for t in tables {
            println!(
                "стол {}: {:?}, {} мест, стейк {}, игроков {}",
                t.table_uid, t.game, t.max_seat, t.stake, t.players_count
            );
        }
    }

    println!("[CLI] Готово.");
    Ok(())
}

/// Alice@2, Bobby@4: кнопка сама является малым блайндом.
async fn heads_up(demo: &Demo) -> CliResult<()> {
    println!();
    println!("================ HEADS-UP =================");

    let table_uid = create_table(demo).await?;
    sit_down(demo, table_uid, "Alice", 2).await?;
    sit_down(demo, table_uid, "Bobby", 4).await?;

    play_hand(demo, table_uid).await?;
    play_hand(demo, table_uid).await?;
    Ok(())
}

/// Alice@2, Bobby@4, Charlie@6: Bobby уходит посреди раздачи, кнопка
/// остаётся на его пустом месте.
async fn dead_button(demo: &Demo) -> CliResult<()> {
    println!();
    println!("================ DEAD BUTTON =================");

    let table_uid = create_table(demo).await?;
    sit_down(demo, table_uid, "Alice", 2).await?;
    sit_down(demo, table_uid, "Bobby", 4).await?;
    sit_down(demo, table_uid, "Charlie", 6).await?;

    rotate(demo, table_uid).await?;
    let hand_uid = start_hand(demo, table_uid).await?;

    demo.commands
        .handle(Command::DebitChips(ChipsCommand {
            table_uid,
            nickname: "Charlie".into(),
            amount: Chips::new(10),
        }))
        .await?;
    demo.commands
        .handle(Command::StandUp(PlayerCommand {
            table_uid,
            nickname: "Bobby".into(),
        }))
        .await?;
    demo.commands
        .handle(Command::CreditChips(ChipsCommand {
            table_uid,
            nickname: "Alice".into(),
            amount: Chips::new(10),
        }))
        .await?;

    finish_hand(demo, table_uid, hand_uid).await?;
    rotate(demo, table_uid).await?;
    Ok(())
}

async fn create_table(demo: &Demo) -> CliResult<TableUid> {
    let response = demo
        .commands
        .handle(Command::CreateTable(CreateTableCommand {
            game: Game::Holdem,
            max_seat: 6,
            small_blind: Chips::new(5),
            big_blind: Chips::new(10),
            chip_cost: Money::units(1, Currency::Usd),
        }))
        .await?;

    match table_view(&response) {
        Some(view) => {
            println!("[CLI] стол {} создан, стейк {}", view.table_uid, view.stake);
            Ok(view.table_uid)
        }
        None => Err(format!("неожиданный ответ на создание стола: {:?}", response).into()),
    }
}

async fn sit_down(demo: &Demo, table_uid: TableUid, nickname: &str, seat: Seat) -> CliResult<()> {
    demo.commands
        .handle(Command::SitDown(SitDownCommand {
            table_uid,
            nickname: nickname.to_string(),
            seat,
            stack: Chips::new(1_000),
        }))
        .await?;
    println!("[CLI] {} сел на место {}", nickname, seat);
    Ok(())
}

async fn rotate(demo: &Demo, table_uid: TableUid) -> CliResult<()> {
    let response = demo
        .commands
        .handle(Command::RotateButton(TableRef { table_uid }))
        .await?;
    if let Some(view) = table_view(&response) {
        print_table(view);
    }
    Ok(())
}

async fn start_hand(demo: &Demo, table_uid: TableUid) -> CliResult<u64> {
    match demo
        .commands
        .handle(Command::StartHand(TableRef { table_uid }))
        .await?
    {
        CommandResponse::HandStarted { hand_uid, .. } => {
            println!("[CLI] раздача {} запущена", hand_uid);
            Ok(hand_uid)
        }
        other => Err(format!("неожиданный ответ на старт раздачи: {:?}", other).into()),
    }
}

async fn finish_hand(demo: &Demo, table_uid: TableUid, hand_uid: u64) -> CliResult<()> {
    demo.commands
        .handle(Command::FinishHand(FinishHandCommand { table_uid, hand_uid }))
        .await?;
    println!("[CLI] раздача {} завершена", hand_uid);
    Ok(())
}

async fn play_hand(demo: &Demo, table_uid: TableUid) -> CliResult<()> {
    rotate(demo, table_uid).await?;
    let hand_uid = start_hand(demo, table_uid).await?;
    finish_hand(demo, table_uid, hand_uid).await
}

fn table_view(response: &CommandResponse) -> Option<&TableDetailView> {
    match response {
        CommandResponse::TableCreated(view) | CommandResponse::TableState(view) => Some(view),
        CommandResponse::HandStarted { table, .. } => Some(table),
        CommandResponse::ActionSubmitted { .. } => None,
    }
}

fn print_table(view: &TableDetailView) {
    match view.positions {
        Some(p) => println!(
            "[CLI] стол {}: кнопка {}, SB {}, BB {}",
            view.table_uid,
            p.button,
            p.small_blind.map_or_else(|| "-".to_string(), |s| s.to_string()),
            p.big_blind
        ),
        None => println!("[CLI] стол {}: кнопка ещё не сдвигалась", view.table_uid),
    }
    for p in &view.players {
        println!(
            "    место {}: {} стек={} пауза={} ждёт BB={}",
            p.seat, p.nickname, p.stack, p.is_sitting_out, p.is_waiting_for_big_blind
        );
    }
}
