//! Asset record service: technician store-visit submissions.

use std::sync::Arc;

use chrono::NaiveDate;
use fixdesk_common::{AppError, AppResult, Clock, IdGenerator};
use fixdesk_db::entities::asset_record::{self, EquipmentEntry};
use fixdesk_db::entities::user::UserRole;
use fixdesk_db::repositories::{AssetRecordRepository, UserRepository};
use sea_orm::Set;
use validator::Validate;

/// Input for submitting a store-visit record.
#[derive(Debug, Validate)]
pub struct CreateAssetRecordInput {
    #[validate(length(max = 256))]
    pub store_name: String,
    /// Calendar date of the visit.
    pub submission_date: NaiveDate,
    /// Equipment inventory; at least one entry.
    pub equipment: Vec<EquipmentEntry>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Asset record service.
#[derive(Clone)]
pub struct AssetService {
    asset_repo: AssetRecordRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
    clock: Arc<dyn Clock>,
}

impl AssetService {
    /// Create a new asset service.
    #[must_use]
    pub fn new(
        asset_repo: AssetRecordRepository,
        user_repo: UserRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            asset_repo,
            user_repo,
            id_gen: IdGenerator::new(),
            clock,
        }
    }

    /// Submit a store-visit record. Records are write-once; there is no
    /// edit surface.
    pub async fn create_record(
        &self,
        technician_id: &str,
        input: CreateAssetRecordInput,
    ) -> AppResult<asset_record::Model> {
        input.validate()?;

        let store_name = input.store_name.trim();
        if store_name.is_empty() {
            return Err(AppError::Validation("Store name is required".to_string()));
        }
        if input.equipment.is_empty() {
            return Err(AppError::Validation(
                "At least one equipment entry is required".to_string(),
            ));
        }
        for entry in &input.equipment {
            if entry.name.trim().is_empty() {
                return Err(AppError::Validation(
                    "Equipment name cannot be blank".to_string(),
                ));
            }
            // Absent equipment cannot carry a count.
            if !entry.is_present && entry.count != 0 {
                return Err(AppError::Validation(format!(
                    "Equipment '{}' is marked absent but has count {}",
                    entry.name, entry.count
                )));
            }
        }

        let technician = self.user_repo.get_by_id(technician_id).await?;
        if technician.role != UserRole::Technician {
            return Err(AppError::Validation(format!(
                "User {technician_id} is not a technician"
            )));
        }
        if !technician.is_active {
            return Err(AppError::Validation(format!(
                "Technician {technician_id} is disabled"
            )));
        }

        let equipment = serde_json::to_value(&input.equipment)
            .map_err(|e| AppError::Internal(format!("Failed to encode equipment: {e}")))?;

        let model = asset_record::ActiveModel {
            id: Set(self.id_gen.generate()),
            technician_id: Set(technician_id.to_string()),
            store_name: Set(store_name.to_string()),
            submission_date: Set(input.submission_date),
            equipment: Set(equipment),
            notes: Set(input
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())),
            created_at: Set(self.clock.now().into()),
        };

        let created = self.asset_repo.create(model).await?;
        tracing::info!(
            record = %created.id,
            technician = technician_id,
            store = %created.store_name,
            "Asset record submitted"
        );
        Ok(created)
    }

    /// Get a record by id.
    pub async fn get(&self, id: &str) -> AppResult<asset_record::Model> {
        self.asset_repo.get(id).await
    }

    /// List a technician's records, most recent visit first.
    pub async fn list_by_technician(
        &self,
        technician_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<asset_record::Model>> {
        self.asset_repo
            .list_by_technician(technician_id, limit, offset)
            .await
    }

    /// List records for one store, most recent visit first.
    pub async fn list_by_store(
        &self,
        store_name: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<asset_record::Model>> {
        self.asset_repo.list_by_store(store_name, limit, offset).await
    }
}
