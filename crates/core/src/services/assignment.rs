//! Assignment service: binding technicians to pending complaints.
//!
//! A technician may hold arbitrarily many concurrent assignments; the
//! only gate is that the complaint is still `pending` and the
//! technician is an active account. The pending check is enforced
//! atomically, so two admins racing to assign the same complaint get
//! exactly one winner.

use std::sync::Arc;

use fixdesk_common::{AppError, AppResult, Clock};
use fixdesk_db::entities::complaint::{self, ComplaintStatus};
use fixdesk_db::entities::user::UserRole;
use fixdesk_db::repositories::{ComplaintRepository, UserRepository};

/// Assignment service.
#[derive(Clone)]
pub struct AssignmentService {
    complaint_repo: ComplaintRepository,
    user_repo: UserRepository,
    clock: Arc<dyn Clock>,
}

impl AssignmentService {
    /// Create a new assignment service.
    #[must_use]
    pub fn new(
        complaint_repo: ComplaintRepository,
        user_repo: UserRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            complaint_repo,
            user_repo,
            clock,
        }
    }

    /// Bind a technician to a pending complaint: pending → assigned.
    pub async fn assign_technician(
        &self,
        complaint_id: &str,
        technician_id: &str,
    ) -> AppResult<complaint::Model> {
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

        let existing = self.complaint_repo.get(complaint_id).await?;
        if existing.status != ComplaintStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "Cannot assign a complaint in state {:?}",
                existing.status
            )));
        }

        // Atomic check-and-set on status; the loser of a concurrent
        // double-assign lands here with zero rows affected.
        let won = self
            .complaint_repo
            .transition_to_assigned(complaint_id, technician_id, self.clock.now())
            .await?;
        if !won {
            return Err(AppError::InvalidTransition(
                "Complaint is no longer pending".to_string(),
            ));
        }

        self.complaint_repo.get(complaint_id).await
    }

    /// Number of active (assigned or in-progress) complaints a
    /// technician currently holds.
    pub async fn active_count(&self, technician_id: &str) -> AppResult<u64> {
        self.complaint_repo
            .count_active_for_technician(technician_id)
            .await
    }

    /// Delete a technician account.
    ///
    /// Refused while the technician holds any active complaint; once
    /// all their work is resolved the row can go.
    pub async fn delete_technician(&self, technician_id: &str) -> AppResult<()> {
        let technician = self.user_repo.get_by_id(technician_id).await?;
        if technician.role != UserRole::Technician {
            return Err(AppError::Validation(format!(
                "User {technician_id} is not a technician"
            )));
        }

        let active = self
            .complaint_repo
            .count_active_for_technician(technician_id)
            .await?;
        if active > 0 {
            return Err(AppError::Conflict(format!(
                "Technician {technician_id} has {active} active complaints"
            )));
        }

        if !self.user_repo.delete(technician_id).await? {
            return Err(AppError::UserNotFound(technician_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fixdesk_common::FixedClock;
    use fixdesk_db::entities::complaint::{ComplaintPriority, CreatorType};
    use fixdesk_db::entities::user;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    fn service(db: Arc<DatabaseConnection>) -> AssignmentService {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 12, 9, 0, 0).unwrap(),
        ));
        AssignmentService::new(
            ComplaintRepository::new(db.clone()),
            UserRepository::new(db),
            clock,
        )
    }

    fn mock_user(id: &str, role: UserRole, is_active: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            name: "Test User".to_string(),
            phone_number: "+15550100".to_string(),
            role,
            is_active,
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

    #[tokio::test]
    async fn test_assign_to_disabled_technician_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("tech1", UserRole::Technician, false)]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.assign_technician("c1", "tech1").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_assign_to_non_technician_fails() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("client1", UserRole::Client, true)]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.assign_technician("c1", "client1").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_assign_to_unknown_technician_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.assign_technician("c1", "ghost").await.unwrap_err();

        assert!(matches!(err, AppError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_assign_non_pending_is_invalid_transition() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("tech1", UserRole::Technician, true)]])
                .append_query_results([[mock_complaint(
                    "c1",
                    ComplaintStatus::InProgress,
                    Some("tech0"),
                )]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.assign_technician("c1", "tech1").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_concurrent_assign_loser_gets_invalid_transition() {
        // Both admins saw a pending complaint; the conditional update
        // reports zero rows for the one that lost the race.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("tech2", UserRole::Technician, true)]])
                .append_query_results([[mock_complaint("c1", ComplaintStatus::Pending, None)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.assign_technician("c1", "tech2").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_assign_happy_path() {
        let mut assigned = mock_complaint("c1", ComplaintStatus::Assigned, Some("tech1"));
        assigned.assigned_at = Some(Utc.with_ymd_and_hms(2024, 1, 12, 9, 0, 0).unwrap().into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("tech1", UserRole::Technician, true)]])
                .append_query_results([[mock_complaint("c1", ComplaintStatus::Pending, None)]])
                .append_query_results([[assigned]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc.assign_technician("c1", "tech1").await.unwrap();

        assert_eq!(result.status, ComplaintStatus::Assigned);
        assert_eq!(result.assigned_technician_id.as_deref(), Some("tech1"));
        assert!(result.assigned_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_technician_with_active_work_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("tech1", UserRole::Technician, true)]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );
        let svc = service(db);

        let err = svc.delete_technician("tech1").await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_technician_after_all_work_resolved() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mock_user("tech1", UserRole::Technician, true)]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let svc = service(db);

        svc.delete_technician("tech1").await.unwrap();
    }
}
