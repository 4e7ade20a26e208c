//! Доменные события стола и их хранимое представление.
//!
//! Журнал стола – это упорядоченная последовательность `TableEvent`.
//! Порядок важен: агрегат восстанавливается повторным применением событий.
//!
//! Для хранения событие превращается в `StoredEvent` (строковый тег + JSON).
//! Обратное преобразование идёт через явную таблицу `EVENT_CODECS`
//! "тег → функция декодирования", без какого-либо вывода типа по имени.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::chips::Chips;
use crate::domain::rules::Rules;
use crate::domain::{HandUid, Seat};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableCreated {
    pub rules: Rules,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSatDown {
    pub nickname: String,
    pub seat: Seat,
    pub stack: Chips,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerStoodUp {
    pub nickname: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSatOut {
    pub nickname: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSatIn {
    pub nickname: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerChipsDebited {
    pub nickname: String,
    pub amount: Chips,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerChipsCredited {
    pub nickname: String,
    pub amount: Chips,
}

/// Кнопка сдвинута. Позиции не хранятся: при реплее они пересчитываются
/// тем же алгоритмом из состояния стола.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonRotated {}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentHandStarted {
    pub hand_uid: HandUid,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentHandFinished {
    pub hand_uid: HandUid,
}

/// Событие в журнале стола.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TableEvent {
    TableCreated(TableCreated),
    PlayerSatDown(PlayerSatDown),
    PlayerStoodUp(PlayerStoodUp),
    PlayerSatOut(PlayerSatOut),
    PlayerSatIn(PlayerSatIn),
    PlayerChipsDebited(PlayerChipsDebited),
    PlayerChipsCredited(PlayerChipsCredited),
    ButtonRotated(ButtonRotated),
    CurrentHandStarted(CurrentHandStarted),
    CurrentHandFinished(CurrentHandFinished),
}

/// Вид события без данных – ключ для реестров (кодеки, трансляторы).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventKind {
    TableCreated,
    PlayerSatDown,
    PlayerStoodUp,
    PlayerSatOut,
    PlayerSatIn,
    PlayerChipsDebited,
    PlayerChipsCredited,
    ButtonRotated,
    CurrentHandStarted,
    CurrentHandFinished,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::TableCreated,
        EventKind::PlayerSatDown,
        EventKind::PlayerStoodUp,
        EventKind::PlayerSatOut,
        EventKind::PlayerSatIn,
        EventKind::PlayerChipsDebited,
        EventKind::PlayerChipsCredited,
        EventKind::ButtonRotated,
        EventKind::CurrentHandStarted,
        EventKind::CurrentHandFinished,
    ];

    /// Тег, под которым событие лежит в журнале. Менять нельзя:
    /// по нему читаются уже записанные события.
    pub fn tag(self) -> &'static str {
        match self {
            EventKind::TableCreated => "TableCreated",
            EventKind::PlayerSatDown => "PlayerSatDown",
            EventKind::PlayerStoodUp => "PlayerStoodUp",
            EventKind::PlayerSatOut => "PlayerSatOut",
            EventKind::PlayerSatIn => "PlayerSatIn",
            EventKind::PlayerChipsDebited => "PlayerChipsDebited",
            EventKind::PlayerChipsCredited => "PlayerChipsCredited",
            EventKind::ButtonRotated => "ButtonRotated",
            EventKind::CurrentHandStarted => "CurrentHandStarted",
            EventKind::CurrentHandFinished => "CurrentHandFinished",
        }
    }
}

impl TableEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TableEvent::TableCreated(_) => EventKind::TableCreated,
            TableEvent::PlayerSatDown(_) => EventKind::PlayerSatDown,
            TableEvent::PlayerStoodUp(_) => EventKind::PlayerStoodUp,
            TableEvent::PlayerSatOut(_) => EventKind::PlayerSatOut,
            TableEvent::PlayerSatIn(_) => EventKind::PlayerSatIn,
            TableEvent::PlayerChipsDebited(_) => EventKind::PlayerChipsDebited,
            TableEvent::PlayerChipsCredited(_) => EventKind::PlayerChipsCredited,
            TableEvent::ButtonRotated(_) => EventKind::ButtonRotated,
            TableEvent::CurrentHandStarted(_) => EventKind::CurrentHandStarted,
            TableEvent::CurrentHandFinished(_) => EventKind::CurrentHandFinished,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.kind().tag()
    }
}

macro_rules! impl_into_table_event {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for TableEvent {
                fn from(e: $variant) -> Self {
                    TableEvent::$variant(e)
                }
            }
        )*
    };
}

impl_into_table_event!(
    TableCreated,
    PlayerSatDown,
    PlayerStoodUp,
    PlayerSatOut,
    PlayerSatIn,
    PlayerChipsDebited,
    PlayerChipsCredited,
    ButtonRotated,
    CurrentHandStarted,
    CurrentHandFinished,
);

//
// ---------- хранимое представление ----------
//

/// Ошибки кодека событий. `UnknownTag` при чтении журнала – фатальная
/// ситуация (журнал записан версией, которой мы не знаем, или повреждён).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Неизвестный тег события: {0}")]
    UnknownTag(String),

    #[error("Не удалось (де)сериализовать событие {tag}: {source}")]
    Payload {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Событие в том виде, в каком оно лежит в журнале.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredEvent {
    pub tag: String,
    pub payload: serde_json::Value,
}

/// Функция декодирования payload конкретного события.
pub type DecodeFn = fn(serde_json::Value) -> Result<TableEvent, serde_json::Error>;

fn decode_as<E>(payload: serde_json::Value) -> Result<TableEvent, serde_json::Error>
where
    E: DeserializeOwned + Into<TableEvent>,
{
    serde_json::from_value::<E>(payload).map(Into::into)
}

/// Реестр "тег → декодер". Единственное место, где тег связывается с типом.
pub const EVENT_CODECS: &[(&str, DecodeFn)] = &[
    ("TableCreated", decode_as::<TableCreated>),
    ("PlayerSatDown", decode_as::<PlayerSatDown>),
    ("PlayerStoodUp", decode_as::<PlayerStoodUp>),
    ("PlayerSatOut", decode_as::<PlayerSatOut>),
    ("PlayerSatIn", decode_as::<PlayerSatIn>),
    ("PlayerChipsDebited", decode_as::<PlayerChipsDebited>),
    ("PlayerChipsCredited", decode_as::<PlayerChipsCredited>),
    ("ButtonRotated", decode_as::<ButtonRotated>),
    ("CurrentHandStarted", decode_as::<CurrentHandStarted>),
    ("CurrentHandFinished", decode_as::<CurrentHandFinished>),
];

impl StoredEvent {
    /// Упаковать доменное событие для записи в журнал.
    pub fn encode(event: &TableEvent) -> Result<Self, CodecError> {
        let tag = event.tag();
        let payload = match event {
            TableEvent::TableCreated(e) => serde_json::to_value(e),
            TableEvent::PlayerSatDown(e) => serde_json::to_value(e),
            TableEvent::PlayerStoodUp(e) => serde_json::to_value(e),
            TableEvent::PlayerSatOut(e) => serde_json::to_value(e),
            TableEvent::PlayerSatIn(e) => serde_json::to_value(e),
            TableEvent::PlayerChipsDebited(e) => serde_json::to_value(e),
            TableEvent::PlayerChipsCredited(e) => serde_json::to_value(e),
            TableEvent::ButtonRotated(e) => serde_json::to_value(e),
            TableEvent::CurrentHandStarted(e) => serde_json::to_value(e),
            TableEvent::CurrentHandFinished(e) => serde_json::to_value(e),
        }
        .map_err(|source| CodecError::Payload {
            tag: tag.to_string(),
            source,
        })?;

        Ok(Self {
            tag: tag.to_string(),
            payload,
        })
    }

    /// Развернуть запись журнала обратно в доменное событие.
    pub fn decode(&self) -> Result<TableEvent, CodecError> {
        let (_, decode) = EVENT_CODECS
            .iter()
            .find(|(tag, _)| *tag == self.tag)
            .ok_or_else(|| CodecError::UnknownTag(self.tag.clone()))?;

        decode(self.payload.clone()).map_err(|source| CodecError::Payload {
            tag: self.tag.clone(),
            source,
        })
    }
}
