//! Complaint repository: CRUD, filtered listings, and the atomic
//! status-transition updates.
//!
//! Every lifecycle transition is a conditional `UPDATE` filtered on the
//! expected current status (and the acting technician where the rule
//! demands it). `rows_affected == 0` means a concurrent transition won.

use std::sync::Arc;

use crate::entities::{
    complaint::{self, ComplaintPriority, ComplaintStatus},
    Complaint,
};
use chrono::{DateTime, Utc};
use fixdesk_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Filters for complaint listings.
#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    /// Restrict to one status.
    pub status: Option<ComplaintStatus>,
    /// Restrict to one priority.
    pub priority: Option<ComplaintPriority>,
    /// Restrict to complaints filed by this user.
    pub creator_id: Option<String>,
    /// Restrict to complaints assigned to this technician.
    pub assigned_technician_id: Option<String>,
}

/// Field changes permitted while a complaint is still pending.
#[derive(Debug, Clone, Default)]
pub struct PendingChanges {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement location.
    pub location: Option<String>,
    /// Replacement priority.
    pub priority: Option<ComplaintPriority>,
    /// Wholesale replacement of the creation photos (JSON array).
    pub photos: Option<serde_json::Value>,
}

/// Complaint repository for database operations.
#[derive(Clone)]
pub struct ComplaintRepository {
    db: Arc<DatabaseConnection>,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new complaint.
    pub async fn create(&self, model: complaint::ActiveModel) -> AppResult<complaint::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a complaint by internal id.
    pub async fn get(&self, id: &str) -> AppResult<complaint::Model> {
        Complaint::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))
    }

    /// Find a complaint by internal id.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<complaint::Model>> {
        Complaint::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a complaint by its human-facing number.
    pub async fn get_by_complaint_id(&self, complaint_id: &str) -> AppResult<complaint::Model> {
        Complaint::find()
            .filter(complaint::Column::ComplaintId.eq(complaint_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::ComplaintNotFound(complaint_id.to_string()))
    }

    /// List complaints, newest first.
    pub async fn list(
        &self,
        filter: &ComplaintFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<complaint::Model>> {
        let mut query = Complaint::find().order_by_desc(complaint::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(complaint::Column::Status.eq(status));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(complaint::Column::Priority.eq(priority));
        }
        if let Some(ref creator_id) = filter.creator_id {
            query = query.filter(complaint::Column::CreatorId.eq(creator_id));
        }
        if let Some(ref technician_id) = filter.assigned_technician_id {
            query = query.filter(complaint::Column::AssignedTechnicianId.eq(technician_id));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply pending-only field changes, conditioned on the complaint
    /// still being `pending`. Returns whether a row was updated.
    pub async fn update_pending(&self, id: &str, changes: PendingChanges) -> AppResult<bool> {
        let mut update = Complaint::update_many()
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::Status.eq(ComplaintStatus::Pending));

        if let Some(title) = changes.title {
            update = update.col_expr(complaint::Column::Title, Expr::value(title));
        }
        if let Some(description) = changes.description {
            update = update.col_expr(complaint::Column::Description, Expr::value(description));
        }
        if let Some(location) = changes.location {
            update = update.col_expr(complaint::Column::Location, Expr::value(location));
        }
        if let Some(priority) = changes.priority {
            update = update.col_expr(complaint::Column::Priority, Expr::value(priority));
        }
        if let Some(photos) = changes.photos {
            update = update.col_expr(complaint::Column::Photos, Expr::value(photos));
        }

        let result = update
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Delete a complaint, conditioned on it still being `pending`.
    /// Returns whether a row was deleted.
    pub async fn delete_pending(&self, id: &str) -> AppResult<bool> {
        let result = Complaint::delete_many()
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::Status.eq(ComplaintStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    // ========== Lifecycle transitions (compare-and-swap) ==========

    /// pending → assigned: bind a technician. Conditional on the current
    /// status; returns whether this caller won the transition.
    pub async fn transition_to_assigned(
        &self,
        id: &str,
        technician_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = Complaint::update_many()
            .col_expr(
                complaint::Column::Status,
                Expr::value(ComplaintStatus::Assigned),
            )
            .col_expr(
                complaint::Column::AssignedTechnicianId,
                Expr::value(technician_id),
            )
            .col_expr(complaint::Column::AssignedAt, Expr::value(at))
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::Status.eq(ComplaintStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected > 0 {
            tracing::info!(complaint = id, technician = technician_id, "Complaint assigned");
        }
        Ok(result.rows_affected > 0)
    }

    /// assigned → in-progress: the assigned technician starts work.
    /// Conditional on status and on the acting technician matching.
    pub async fn transition_to_in_progress(
        &self,
        id: &str,
        technician_id: &str,
        at: DateTime<Utc>,
        technician_notes: Option<String>,
    ) -> AppResult<bool> {
        let mut update = Complaint::update_many()
            .col_expr(
                complaint::Column::Status,
                Expr::value(ComplaintStatus::InProgress),
            )
            .col_expr(complaint::Column::StartedAt, Expr::value(at))
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::Status.eq(ComplaintStatus::Assigned))
            .filter(complaint::Column::AssignedTechnicianId.eq(technician_id));

        if let Some(notes) = technician_notes {
            update = update.col_expr(complaint::Column::TechnicianNotes, Expr::value(notes));
        }

        let result = update
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected > 0 {
            tracing::info!(complaint = id, technician = technician_id, "Work started");
        }
        Ok(result.rows_affected > 0)
    }

    /// in-progress → resolved: the assigned technician closes out the
    /// complaint with notes, materials, and proof photos.
    pub async fn transition_to_resolved(
        &self,
        id: &str,
        technician_id: &str,
        at: DateTime<Utc>,
        resolution_notes: String,
        materials_used: String,
        resolution_photos: serde_json::Value,
    ) -> AppResult<bool> {
        let result = Complaint::update_many()
            .col_expr(
                complaint::Column::Status,
                Expr::value(ComplaintStatus::Resolved),
            )
            .col_expr(complaint::Column::ResolvedAt, Expr::value(at))
            .col_expr(
                complaint::Column::ResolutionNotes,
                Expr::value(resolution_notes),
            )
            .col_expr(
                complaint::Column::MaterialsUsed,
                Expr::value(materials_used),
            )
            .col_expr(
                complaint::Column::ResolutionPhotos,
                Expr::value(resolution_photos),
            )
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::Status.eq(ComplaintStatus::InProgress))
            .filter(complaint::Column::AssignedTechnicianId.eq(technician_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected > 0 {
            tracing::info!(complaint = id, technician = technician_id, "Complaint resolved");
        }
        Ok(result.rows_affected > 0)
    }

    // ========== Workload and reporting queries ==========

    /// Count a technician's active (assigned or in-progress) complaints.
    pub async fn count_active_for_technician(&self, technician_id: &str) -> AppResult<u64> {
        Complaint::find()
            .filter(complaint::Column::AssignedTechnicianId.eq(technician_id))
            .filter(
                complaint::Column::Status
                    .is_in([ComplaintStatus::Assigned, ComplaintStatus::InProgress]),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Complaints with `created_at` in `[from, to)`.
    pub async fn find_created_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<complaint::Model>> {
        Complaint::find()
            .filter(complaint::Column::CreatedAt.gte(from))
            .filter(complaint::Column::CreatedAt.lt(to))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Complaints with `assigned_at` in `[from, to)`.
    pub async fn find_assigned_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<complaint::Model>> {
        Complaint::find()
            .filter(complaint::Column::AssignedAt.gte(from))
            .filter(complaint::Column::AssignedAt.lt(to))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Complaints with `resolved_at` in `[from, to)`.
    pub async fn find_resolved_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<complaint::Model>> {
        Complaint::find()
            .filter(complaint::Column::ResolvedAt.gte(from))
            .filter(complaint::Column::ResolvedAt.lt(to))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
