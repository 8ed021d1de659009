//! Complaint lifecycle service.
//!
//! Owns the creation/edit/delete surface for pending complaints and the
//! technician-driven transitions (`start`, `resolve`). Assignment is the
//! [`AssignmentService`](crate::services::assignment::AssignmentService)'s
//! job. Every operation takes the acting user explicitly; nothing is
//! read from ambient session state.

use std::sync::Arc;

use fixdesk_common::{AppError, AppResult, Clock, IdGenerator};
use fixdesk_db::entities::complaint::{
    self, ComplaintPriority, ComplaintStatus, Creator, PhotoRef,
};
use fixdesk_db::repositories::{ComplaintFilter, ComplaintRepository, PendingChanges, UserRepository};
use sea_orm::Set;
use validator::Validate;

/// Photo ceiling for both creation and resolution attachments.
pub const MAX_PHOTOS: usize = 5;

/// Input for filing a complaint.
#[derive(Debug, Validate)]
pub struct CreateComplaintInput {
    #[validate(length(max = 256))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(length(max = 256))]
    pub location: String,
    /// Defaults to `medium` when absent.
    pub priority: Option<ComplaintPriority>,
    /// Photos attached at creation (0..=5).
    pub photos: Vec<PhotoRef>,
}

/// Field changes for a still-pending complaint.
#[derive(Debug, Default, Validate)]
pub struct EditComplaintInput {
    #[validate(length(max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
    pub priority: Option<ComplaintPriority>,
    /// Wholesale replacement of the creation photos (0..=5).
    pub photos: Option<Vec<PhotoRef>>,
}

/// Input for resolving a complaint.
#[derive(Debug, Validate)]
pub struct ResolveComplaintInput {
    #[validate(length(max = 5000))]
    pub resolution_notes: String,
    /// Materials consumed during the fix. Required; see the resolution
    /// contract note in the service docs.
    #[validate(length(max = 2000))]
    pub materials_used: String,
    /// Proof photos attached at resolution (0..=5).
    pub resolution_photos: Vec<PhotoRef>,
}

/// Complaint lifecycle service.
#[derive(Clone)]
pub struct ComplaintService {
    complaint_repo: ComplaintRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
    clock: Arc<dyn Clock>,
}

impl ComplaintService {
    /// Create a new complaint service.
    #[must_use]
    pub fn new(
        complaint_repo: ComplaintRepository,
        user_repo: UserRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            complaint_repo,
            user_repo,
            id_gen: IdGenerator::new(),
            clock,
        }
    }

    /// File a new complaint in state `pending`.
    ///
    /// The creator may be a client, an admin, or a technician; the
    /// claimed role must match the directory record.
    pub async fn create(
        &self,
        creator: Creator,
        input: CreateComplaintInput,
    ) -> AppResult<complaint::Model> {
        input.validate()?;

        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        let description = input.description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }
        let location = input.location.trim();
        if location.is_empty() {
            return Err(AppError::Validation("Location is required".to_string()));
        }
        if input.photos.len() > MAX_PHOTOS {
            return Err(AppError::Validation(format!(
                "At most {MAX_PHOTOS} photos can be attached"
            )));
        }

        // The claimed creator role must match the directory record.
        let user = self.user_repo.get_by_id(creator.creator_id()).await?;
        if user.role != creator.creator_type().into() {
            return Err(AppError::Validation(
                "Creator role does not match user record".to_string(),
            ));
        }

        let photos = serde_json::to_value(&input.photos)
            .map_err(|e| AppError::Internal(format!("Failed to encode photos: {e}")))?;

        let now = self.clock.now();
        let model = complaint::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(self.id_gen.generate_complaint_id()),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            location: Set(location.to_string()),
            priority: Set(input.priority.unwrap_or_default()),
            status: Set(ComplaintStatus::Pending),
            creator_type: Set(creator.creator_type()),
            creator_id: Set(creator.creator_id().to_string()),
            assigned_technician_id: Set(None),
            photos: Set(photos),
            resolution_photos: Set(serde_json::json!([])),
            technician_notes: Set(None),
            resolution_notes: Set(None),
            materials_used: Set(None),
            created_at: Set(now.into()),
            assigned_at: Set(None),
            started_at: Set(None),
            resolved_at: Set(None),
        };

        let created = self.complaint_repo.create(model).await?;
        tracing::info!(
            complaint = %created.id,
            complaint_number = %created.complaint_id,
            "Complaint filed"
        );
        Ok(created)
    }

    /// Get a complaint by internal id.
    pub async fn get(&self, id: &str) -> AppResult<complaint::Model> {
        self.complaint_repo.get(id).await
    }

    /// Get a complaint by its human-facing number.
    pub async fn get_by_complaint_id(&self, complaint_id: &str) -> AppResult<complaint::Model> {
        self.complaint_repo.get_by_complaint_id(complaint_id).await
    }

    /// List complaints, newest first.
    pub async fn list(
        &self,
        filter: &ComplaintFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<complaint::Model>> {
        self.complaint_repo.list(filter, limit, offset).await
    }

    /// Edit a complaint that is still `pending`.
    ///
    /// Photos are replaced wholesale, never patched item by item.
    pub async fn update_pending(
        &self,
        id: &str,
        input: EditComplaintInput,
    ) -> AppResult<complaint::Model> {
        input.validate()?;

        if let Some(ref title) = input.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("Title cannot be blank".to_string()));
            }
        }
        if let Some(ref description) = input.description {
            if description.trim().is_empty() {
                return Err(AppError::Validation(
                    "Description cannot be blank".to_string(),
                ));
            }
        }
        if let Some(ref location) = input.location {
            if location.trim().is_empty() {
                return Err(AppError::Validation("Location cannot be blank".to_string()));
            }
        }
        if let Some(ref photos) = input.photos {
            if photos.len() > MAX_PHOTOS {
                return Err(AppError::Validation(format!(
                    "At most {MAX_PHOTOS} photos can be attached"
                )));
            }
        }

        let existing = self.complaint_repo.get(id).await?;
        if existing.status != ComplaintStatus::Pending {
            return Err(AppError::InvalidTransition(
                "Only pending complaints can be edited".to_string(),
            ));
        }

        // Nothing to change: return the row as-is rather than issuing
        // an UPDATE with no SET clause.
        if input.title.is_none()
            && input.description.is_none()
            && input.location.is_none()
            && input.priority.is_none()
            && input.photos.is_none()
        {
            return Ok(existing);
        }

        let photos = match input.photos {
            Some(ref photos) => Some(
                serde_json::to_value(photos)
                    .map_err(|e| AppError::Internal(format!("Failed to encode photos: {e}")))?,
            ),
            None => None,
        };

        let changes = PendingChanges {
            title: input.title.map(|t| t.trim().to_string()),
            description: input.description.map(|d| d.trim().to_string()),
            location: input.location.map(|l| l.trim().to_string()),
            priority: input.priority,
            photos,
        };

        // Conditional on `pending`; a concurrent assign wins over the edit.
        if !self.complaint_repo.update_pending(id, changes).await? {
            return Err(AppError::InvalidTransition(
                "Complaint is no longer pending".to_string(),
            ));
        }

        self.complaint_repo.get(id).await
    }

    /// Delete a complaint that is still `pending`.
    pub async fn delete_pending(&self, id: &str) -> AppResult<()> {
        let existing = self.complaint_repo.get(id).await?;
        if existing.status != ComplaintStatus::Pending {
            return Err(AppError::InvalidTransition(
                "Only pending complaints can be deleted".to_string(),
            ));
        }

        if !self.complaint_repo.delete_pending(id).await? {
            return Err(AppError::InvalidTransition(
                "Complaint is no longer pending".to_string(),
            ));
        }

        tracing::info!(complaint = id, "Pending complaint deleted");
        Ok(())
    }

    /// The assigned technician starts work: assigned → in-progress.
    pub async fn start(
        &self,
        id: &str,
        acting_technician_id: &str,
        technician_notes: Option<String>,
    ) -> AppResult<complaint::Model> {
        let existing = self.complaint_repo.get(id).await?;

        if existing.status != ComplaintStatus::Assigned {
            return Err(AppError::InvalidTransition(format!(
                "Cannot start work on a complaint in state {:?}",
                existing.status
            )));
        }
        if existing.assigned_technician_id.as_deref() != Some(acting_technician_id) {
            return Err(AppError::Forbidden(
                "Only the assigned technician can start this complaint".to_string(),
            ));
        }

        let notes = technician_notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let won = self
            .complaint_repo
            .transition_to_in_progress(id, acting_technician_id, self.clock.now(), notes)
            .await?;
        if !won {
            return Err(AppError::InvalidTransition(
                "Complaint is no longer assigned".to_string(),
            ));
        }

        self.complaint_repo.get(id).await
    }

    /// The assigned technician closes out the complaint:
    /// in-progress → resolved (terminal).
    ///
    /// Resolution requires non-empty notes and materials, plus up to
    /// five proof photos. There is no reopen path.
    pub async fn resolve(
        &self,
        id: &str,
        acting_technician_id: &str,
        input: ResolveComplaintInput,
    ) -> AppResult<complaint::Model> {
        input.validate()?;

        let resolution_notes = input.resolution_notes.trim();
        if resolution_notes.is_empty() {
            return Err(AppError::Validation(
                "Resolution notes are required".to_string(),
            ));
        }
        let materials_used = input.materials_used.trim();
        if materials_used.is_empty() {
            return Err(AppError::Validation(
                "Materials used are required".to_string(),
            ));
        }
        if input.resolution_photos.len() > MAX_PHOTOS {
            return Err(AppError::Validation(format!(
                "At most {MAX_PHOTOS} resolution photos can be attached"
            )));
        }

        let existing = self.complaint_repo.get(id).await?;

        if existing.status != ComplaintStatus::InProgress {
            return Err(AppError::InvalidTransition(format!(
                "Cannot resolve a complaint in state {:?}",
                existing.status
            )));
        }
        if existing.assigned_technician_id.as_deref() != Some(acting_technician_id) {
            return Err(AppError::Forbidden(
                "Only the assigned technician can resolve this complaint".to_string(),
            ));
        }

        let resolution_photos = serde_json::to_value(&input.resolution_photos)
            .map_err(|e| AppError::Internal(format!("Failed to encode photos: {e}")))?;

        let won = self
            .complaint_repo
            .transition_to_resolved(
                id,
                acting_technician_id,
                self.clock.now(),
                resolution_notes.to_string(),
                materials_used.to_string(),
                resolution_photos,
            )
            .await?;
        if !won {
            return Err(AppError::InvalidTransition(
                "Complaint is no longer in progress".to_string(),
            ));
        }

        self.complaint_repo.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fixdesk_common::FixedClock;
    use fixdesk_db::entities::complaint::CreatorType;
    use fixdesk_db::entities::user::{self, UserRole};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    fn service(db: Arc<DatabaseConnection>) -> ComplaintService {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
        ));
        ComplaintService::new(
            ComplaintRepository::new(db.clone()),
            UserRepository::new(db),
            clock,
        )
    }

    fn mock_user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            name: "Test User".to_string(),
            phone_number: "+15550100".to_string(),
            role,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn mock_complaint(
        id: &str,
        status: ComplaintStatus,
        technician: Option<&str>,
    ) -> complaint::Model {
        complaint::Model {
            id: id.to_string(),
            complaint_id: format!("CMP-{id}"),
            title: "Broken freezer".to_string(),
            description: "Not cooling".to_string(),
            location: "Store 12".to_string(),
            priority: ComplaintPriority::Medium,
            status,
            creator_type: CreatorType::Client,
            creator_id: "client1".to_string(),
            assigned_technician_id: technician.map(ToString::to_string),
            photos: serde_json::json!([]),
            resolution_photos: serde_json::json!([]),
            technician_notes: None,
            resolution_notes: None,
            materials_used: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap().into(),
            assigned_at: None,
            started_at: None,
            resolved_at: None,
        }
    }

    fn photo(n: usize) -> PhotoRef {
        PhotoRef {
            url: format!("/files/p{n}.jpg"),
            stored_id: format!("p{n}"),
        }
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let err = svc
            .create(
                Creator::Client("client1".to_string()),
                CreateComplaintInput {
                    title: "   ".to_string(),
                    description: "Not cooling".to_string(),
                    location: "Store 12".to_string(),
                    priority: None,
                    photos: vec![],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_too_many_photos() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let err = svc
            .create(
                Creator::Client("client1".to_string()),
                CreateComplaintInput {
                    title: "Broken freezer".to_string(),
                    description: "Not cooling".to_string(),
                    location: "Store 12".to_string(),
                    priority: None,
                    photos: (0..6).map(photo).collect(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_role_mismatch() {
        // Directory says client1 is a client, but the caller claims
        // the complaint was filed by a technician.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("client1", UserRole::Client)]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc
            .create(
                Creator::Technician("client1".to_string()),
                CreateComplaintInput {
                    title: "Broken freezer".to_string(),
                    description: "Not cooling".to_string(),
                    location: "Store 12".to_string(),
                    priority: None,
                    photos: vec![],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_start_on_pending_is_invalid_transition() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_complaint("c1", ComplaintStatus::Pending, None)]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.start("c1", "tech1", None).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_start_by_wrong_technician_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_complaint(
                    "c1",
                    ComplaintStatus::Assigned,
                    Some("tech1"),
                )]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.start("c1", "tech2", None).await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_resolve_before_start_is_invalid_transition() {
        // Complaint is assigned but work never started; resolve must
        // fail regardless of the actor being the assignee.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_complaint(
                    "c1",
                    ComplaintStatus::Assigned,
                    Some("tech1"),
                )]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc
            .resolve(
                "c1",
                "tech1",
                ResolveComplaintInput {
                    resolution_notes: "Replaced compressor".to_string(),
                    materials_used: "Compressor unit".to_string(),
                    resolution_photos: vec![],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_resolve_by_wrong_technician_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_complaint(
                    "c1",
                    ComplaintStatus::InProgress,
                    Some("tech1"),
                )]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc
            .resolve(
                "c1",
                "tech2",
                ResolveComplaintInput {
                    resolution_notes: "Replaced compressor".to_string(),
                    materials_used: "Compressor unit".to_string(),
                    resolution_photos: vec![],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_resolve_requires_notes_and_materials() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db.clone());

        let err = svc
            .resolve(
                "c1",
                "tech1",
                ResolveComplaintInput {
                    resolution_notes: "  ".to_string(),
                    materials_used: "Compressor unit".to_string(),
                    resolution_photos: vec![],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let svc = service(db);
        let err = svc
            .resolve(
                "c1",
                "tech1",
                ResolveComplaintInput {
                    resolution_notes: "Replaced compressor".to_string(),
                    materials_used: String::new(),
                    resolution_photos: vec![],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resolve_happy_path_sets_terminal_state() {
        let mut resolved = mock_complaint("c1", ComplaintStatus::Resolved, Some("tech1"));
        resolved.resolution_notes = Some("Replaced compressor".to_string());
        resolved.materials_used = Some("Compressor unit".to_string());
        resolved.resolved_at = Some(Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap().into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_complaint(
                    "c1",
                    ComplaintStatus::InProgress,
                    Some("tech1"),
                )]])
                .append_query_results([[resolved]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc
            .resolve(
                "c1",
                "tech1",
                ResolveComplaintInput {
                    resolution_notes: "Replaced compressor".to_string(),
                    materials_used: "Compressor unit".to_string(),
                    resolution_photos: vec![photo(1)],
                },
            )
            .await
            .unwrap();

        assert_eq!(result.status, ComplaintStatus::Resolved);
        assert!(result.resolved_at.is_some());
        assert_eq!(result.materials_used.as_deref(), Some("Compressor unit"));
    }

    #[tokio::test]
    async fn test_resolve_raced_transition_is_invalid() {
        // Precheck sees in-progress, but the conditional update reports
        // zero rows: a concurrent resolve won.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_complaint(
                    "c1",
                    ComplaintStatus::InProgress,
                    Some("tech1"),
                )]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc
            .resolve(
                "c1",
                "tech1",
                ResolveComplaintInput {
                    resolution_notes: "Replaced compressor".to_string(),
                    materials_used: "Compressor unit".to_string(),
                    resolution_photos: vec![],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_update_after_assignment_is_invalid_transition() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_complaint(
                    "c1",
                    ComplaintStatus::Assigned,
                    Some("tech1"),
                )]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc
            .update_pending(
                "c1",
                EditComplaintInput {
                    title: Some("New title".to_string()),
                    ..EditComplaintInput::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_delete_pending_raced_is_invalid_transition() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_complaint("c1", ComplaintStatus::Pending, None)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.delete_pending("c1").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition(_)));
    }
}
