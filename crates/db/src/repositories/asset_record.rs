//! Asset record repository.

use std::sync::Arc;

use crate::entities::{asset_record, AssetRecord};
use chrono::NaiveDate;
use fixdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Asset record repository for database operations.
#[derive(Clone)]
pub struct AssetRecordRepository {
    db: Arc<DatabaseConnection>,
}

impl AssetRecordRepository {
    /// Create a new asset record repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new asset record.
    pub async fn create(&self, model: asset_record::ActiveModel) -> AppResult<asset_record::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an asset record by id.
    pub async fn get(&self, id: &str) -> AppResult<asset_record::Model> {
        AssetRecord::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Asset record {id} not found")))
    }

    /// List a technician's records, most recent visit first.
    pub async fn list_by_technician(
        &self,
        technician_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<asset_record::Model>> {
        AssetRecord::find()
            .filter(asset_record::Column::TechnicianId.eq(technician_id))
            .order_by_desc(asset_record::Column::SubmissionDate)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List records for one store, most recent visit first.
    pub async fn list_by_store(
        &self,
        store_name: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<asset_record::Model>> {
        AssetRecord::find()
            .filter(asset_record::Column::StoreName.eq(store_name))
            .order_by_desc(asset_record::Column::SubmissionDate)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List records with `submission_date` in `[from, to)`.
    pub async fn list_in_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<asset_record::Model>> {
        AssetRecord::find()
            .filter(asset_record::Column::SubmissionDate.gte(from))
            .filter(asset_record::Column::SubmissionDate.lt(to))
            .order_by_asc(asset_record::Column::SubmissionDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
