//! Диспетчер доменных событий: доменное событие -> интеграционное -> брокер.
//!
//! Для каждого вида события зарегистрирован ноль или один транслятор.
//! Нет транслятора – событие молча отбрасывается: не всё должно быть
//! видно снаружи.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::events::{EventKind, TableEvent};
use crate::domain::positions::Positions;
use crate::domain::TableUid;
use crate::infra::messaging::{topics, IntegrationEvent, IntegrationPayload, PublishError, Publisher};

/// Контекст отправки: к какому столу относится событие и когда оно произошло.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchContext {
    pub table_uid: TableUid,
    pub occurred_at: DateTime<Utc>,
    /// Позиции стола после команды (для `button-rotated`).
    pub positions: Option<Positions>,
}

/// Функция перевода доменного события в данные интеграционного.
pub type TranslateFn = fn(&TableEvent, &DispatchContext) -> Option<IntegrationPayload>;

/// Транслятор: куда публиковать и как переводить.
#[derive(Clone, Copy, Debug)]
pub struct Translator {
    pub topic: &'static str,
    pub translate: TranslateFn,
}

/// Стандартный перевод: поля доменного события один в один.
pub fn to_integration_payload(event: &TableEvent, ctx: &DispatchContext) -> Option<IntegrationPayload> {
    let payload = match event {
        TableEvent::TableCreated(e) => IntegrationPayload::TableCreated {
            rules: e.rules.clone(),
        },
        TableEvent::PlayerSatDown(e) => IntegrationPayload::PlayerSatDown {
            nickname: e.nickname.clone(),
            seat: e.seat,
            stack: e.stack,
        },
        TableEvent::PlayerStoodUp(e) => IntegrationPayload::PlayerStoodUp {
            nickname: e.nickname.clone(),
        },
        TableEvent::PlayerSatOut(e) => IntegrationPayload::PlayerSatOut {
            nickname: e.nickname.clone(),
        },
        TableEvent::PlayerSatIn(e) => IntegrationPayload::PlayerSatIn {
            nickname: e.nickname.clone(),
        },
        TableEvent::PlayerChipsDebited(e) => IntegrationPayload::PlayerChipsDebited {
            nickname: e.nickname.clone(),
            amount: e.amount,
        },
        TableEvent::PlayerChipsCredited(e) => IntegrationPayload::PlayerChipsCredited {
            nickname: e.nickname.clone(),
            amount: e.amount,
        },
        TableEvent::ButtonRotated(_) => IntegrationPayload::ButtonRotated {
            positions: ctx.positions,
        },
        TableEvent::CurrentHandStarted(e) => IntegrationPayload::HandStarted {
            hand_uid: e.hand_uid,
        },
        TableEvent::CurrentHandFinished(e) => IntegrationPayload::HandFinished {
            hand_uid: e.hand_uid,
        },
    };
    Some(payload)
}

/// Топик по умолчанию для вида события.
pub fn default_topic(kind: EventKind) -> &'static str {
    match kind {
        EventKind::TableCreated => topics::TABLE_CREATED,
        EventKind::PlayerSatDown => topics::PLAYER_SAT_DOWN,
        EventKind::PlayerStoodUp => topics::PLAYER_STOOD_UP,
        EventKind::PlayerSatOut => topics::PLAYER_SAT_OUT,
        EventKind::PlayerSatIn => topics::PLAYER_SAT_IN,
        EventKind::PlayerChipsDebited => topics::PLAYER_CHIPS_DEBITED,
        EventKind::PlayerChipsCredited => topics::PLAYER_CHIPS_CREDITED,
        EventKind::ButtonRotated => topics::BUTTON_ROTATED,
        EventKind::CurrentHandStarted => topics::HAND_STARTED,
        EventKind::CurrentHandFinished => topics::HAND_FINISHED,
    }
}

pub struct EventDispatcher {
    translators: HashMap<EventKind, Translator>,
    publisher: Arc<dyn Publisher>,
    topic_prefix: String,
}

impl EventDispatcher {
    /// Диспетчер с пустым реестром: всё будет отбрасываться.
    pub fn new(publisher: Arc<dyn Publisher>, topic_prefix: impl Into<String>) -> Self {
        Self {
            translators: HashMap::new(),
            publisher,
            topic_prefix: topic_prefix.into(),
        }
    }

    /// Диспетчер со стандартными трансляторами для всех десяти событий.
    pub fn with_default_translators(
        publisher: Arc<dyn Publisher>,
        topic_prefix: impl Into<String>,
    ) -> Self {
        let mut dispatcher = Self::new(publisher, topic_prefix);
        for kind in EventKind::ALL {
            dispatcher.register(
                kind,
                Translator {
                    topic: default_topic(kind),
                    translate: to_integration_payload,
                },
            );
        }
        dispatcher
    }

    /// Зарегистрировать транслятор. Старый (если был) возвращается.
    pub fn register(&mut self, kind: EventKind, translator: Translator) -> Option<Translator> {
        self.translators.insert(kind, translator)
    }

    pub fn unregister(&mut self, kind: EventKind) -> Option<Translator> {
        self.translators.remove(&kind)
    }

    pub fn translator(&self, kind: EventKind) -> Option<&Translator> {
        self.translators.get(&kind)
    }

    /// Отправить одно событие. `Ok(false)` – для события нет транслятора.
    pub async fn dispatch(&self, event: &TableEvent, ctx: &DispatchContext) -> Result<bool, PublishError> {
        let Some(translator) = self.translators.get(&event.kind()) else {
            debug!(tag = event.tag(), "нет транслятора, событие не публикуется");
            return Ok(false);
        };

        let Some(payload) = (translator.translate)(event, ctx) else {
            return Ok(false);
        };

        let message = IntegrationEvent {
            table_uid: ctx.table_uid,
            occurred_at: ctx.occurred_at,
            payload,
        };
        let topic = format!("{}{}", self.topic_prefix, translator.topic);

        self.publisher.publish(&topic, &message).await?;
        debug!(topic = %topic, table_uid = ctx.table_uid, "интеграционное событие опубликовано");
        Ok(true)
    }
}
