//! User directory service.
//!
//! The lifecycle and assignment services resolve acting users through
//! this directory; lookups are fallible and surface `UserNotFound`.

use std::sync::Arc;

use fixdesk_common::{AppError, AppResult, Clock, IdGenerator};
use fixdesk_db::entities::user::{self, UserRole};
use fixdesk_db::repositories::UserRepository;
use sea_orm::Set;
use serde::Serialize;
use validator::Validate;

/// Input for registering an account.
#[derive(Debug, Validate)]
pub struct RegisterUserInput {
    #[validate(length(max = 128))]
    pub username: String,
    #[validate(length(max = 256))]
    pub name: String,
    #[validate(length(max = 32))]
    pub phone_number: String,
    pub role: UserRole,
}

/// The directory contract other services depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// Display name.
    pub name: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Whether the account can receive new work.
    pub is_active: bool,
}

/// User directory service.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
            clock,
        }
    }

    /// Register a new account.
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let username = input.username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("Username is required".to_string()));
        }
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        let phone_number = input.phone_number.trim();
        if phone_number.is_empty() {
            return Err(AppError::Validation("Phone number is required".to_string()));
        }

        if self.user_repo.find_by_username(username).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Username {username} is already taken"
            )));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username.to_string()),
            name: Set(name.to_string()),
            phone_number: Set(phone_number.to_string()),
            role: Set(input.role),
            is_active: Set(true),
            created_at: Set(self.clock.now().into()),
            updated_at: Set(None),
        };

        let created = self.user_repo.create(model).await?;
        tracing::info!(user = %created.id, role = ?created.role, "User registered");
        Ok(created)
    }

    /// Get a user by id.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Resolve an id to the directory contract.
    pub async fn directory_entry(&self, id: &str) -> AppResult<DirectoryEntry> {
        let user = self.user_repo.get_by_id(id).await?;
        Ok(DirectoryEntry {
            name: user.name,
            phone_number: user.phone_number,
            is_active: user.is_active,
        })
    }

    /// List users of one role.
    pub async fn list_by_role(
        &self,
        role: UserRole,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        self.user_repo.list_by_role(role, limit, offset).await
    }

    /// List technicians.
    pub async fn list_technicians(&self, limit: u64, offset: u64) -> AppResult<Vec<user::Model>> {
        self.list_by_role(UserRole::Technician, limit, offset).await
    }

    /// Enable or disable an account.
    pub async fn set_active(&self, id: &str, is_active: bool) -> AppResult<()> {
        if !self.user_repo.set_active(id, is_active).await? {
            return Err(AppError::UserNotFound(id.to_string()));
        }
        tracing::info!(user = id, is_active, "Account activation changed");
        Ok(())
    }
}
