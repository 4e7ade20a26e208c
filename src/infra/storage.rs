use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::api::dto::{TableDetailView, TableListView};
use crate::api::queries::ListFilter;
use crate::domain::table::Table;
use crate::domain::TableUid;
use crate::infra::mapping::map_table_to_view;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Стол {0} не найден в read-модели")]
    TableNotFound(TableUid),

    #[error("Хранилище read-модели недоступно: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

/// Абстракция хранилища read-модели столов.
///
/// Read-модель – производная от журнала событий: её всегда можно
/// пересобрать, поэтому ошибки записи сюда не откатывают команду.
#[async_trait]
pub trait TableStorage: Send + Sync {
    /// Сохранить (перезаписать) проекцию стола.
    async fn save_view(&self, table: &Table) -> Result<(), StorageError>;

    /// Подробное представление стола.
    async fn get_detail_view(&self, table_uid: TableUid) -> Result<TableDetailView, StorageError>;

    /// Строки лобби, отсортированные по стейку (потом по ID).
    async fn get_list_views(&self, filter: &ListFilter) -> Result<Vec<TableListView>, StorageError>;
}

/// Простая in-memory реализация для тестов и локального запуска.
#[derive(Debug, Default)]
pub struct InMemoryTableStorage {
    views: RwLock<HashMap<TableUid, TableDetailView>>,
}

impl InMemoryTableStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TableStorage for InMemoryTableStorage {
    async fn save_view(&self, table: &Table) -> Result<(), StorageError> {
        let view = map_table_to_view(table);
        self.views.write().await.insert(view.table_uid, view);
        Ok(())
    }

    async fn get_detail_view(&self, table_uid: TableUid) -> Result<TableDetailView, StorageError> {
        self.views
            .read()
            .await
            .get(&table_uid)
            .cloned()
            .ok_or(StorageError::TableNotFound(table_uid))
    }

    async fn get_list_views(&self, filter: &ListFilter) -> Result<Vec<TableListView>, StorageError> {
        let views = self.views.read().await;

        let mut res: Vec<TableListView> = views
            .values()
            .map(TableListView::from)
            .filter(|v| filter.matches(v))
            .collect();

        res.sort_by(|a, b| {
            a.stake
                .cents
                .cmp(&b.stake.cents)
                .then(a.table_uid.cmp(&b.table_uid))
        });
        Ok(res)
    }
}
