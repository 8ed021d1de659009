//! Complaint entity and its lifecycle state machine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Complaint lifecycle status.
///
/// Progression is strictly monotonic along
/// pending → assigned → in-progress → resolved; `resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[derive(Default)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "in-progress")]
    InProgress,
    #[sea_orm(string_value = "resolved")]
    Resolved,
}

impl ComplaintStatus {
    /// The single legal successor state, `None` for the terminal state.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Assigned),
            Self::Assigned => Some(Self::InProgress),
            Self::InProgress => Some(Self::Resolved),
            Self::Resolved => None,
        }
    }

    /// Whether `to` is the legal successor of `self`.
    ///
    /// No transition may skip a state or move backward.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.next() == Some(to)
    }

    /// Whether a technician is actively bound to the complaint
    /// (assigned or in-progress).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }

    /// Whether the complaint has reached its terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved)
    }
}

/// Complaint priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    #[default]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

/// Role of the user who filed the complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum CreatorType {
    #[sea_orm(string_value = "client")]
    Client,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "technician")]
    Technician,
}

impl From<CreatorType> for super::user::UserRole {
    fn from(creator_type: CreatorType) -> Self {
        match creator_type {
            CreatorType::Client => Self::Client,
            CreatorType::Admin => Self::Admin,
            CreatorType::Technician => Self::Technician,
        }
    }
}

/// The complaint's creator as a tagged value.
///
/// A complaint always has exactly one creator; the tag says which role
/// filed it, the payload is the user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creator {
    /// Filed by a client.
    Client(String),
    /// Filed by an admin on a client's behalf.
    Admin(String),
    /// Filed by a technician in the field.
    Technician(String),
}

impl Creator {
    /// The creator's role tag.
    #[must_use]
    pub const fn creator_type(&self) -> CreatorType {
        match self {
            Self::Client(_) => CreatorType::Client,
            Self::Admin(_) => CreatorType::Admin,
            Self::Technician(_) => CreatorType::Technician,
        }
    }

    /// The creator's user id.
    #[must_use]
    pub fn creator_id(&self) -> &str {
        match self {
            Self::Client(id) | Self::Admin(id) | Self::Technician(id) => id,
        }
    }

    /// Rebuild the tagged value from the stored column pair.
    #[must_use]
    pub fn from_columns(creator_type: CreatorType, creator_id: String) -> Self {
        match creator_type {
            CreatorType::Client => Self::Client(creator_id),
            CreatorType::Admin => Self::Admin(creator_id),
            CreatorType::Technician => Self::Technician(creator_id),
        }
    }
}

/// Opaque reference to a stored photo.
///
/// The core never inspects image bytes; it only forwards this pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    /// Public URL of the stored image.
    pub url: String,
    /// Backend storage identifier.
    pub stored_id: String,
}

/// Complaint model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Human-facing complaint number, unique and immutable.
    #[sea_orm(unique)]
    pub complaint_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub location: String,

    pub priority: ComplaintPriority,

    pub status: ComplaintStatus,

    /// Role of the filing user.
    pub creator_type: CreatorType,

    /// Id of the filing user.
    pub creator_id: String,

    /// Technician bound by `assign`; set exactly once.
    #[sea_orm(nullable)]
    pub assigned_technician_id: Option<String>,

    /// Photos attached at creation (JSON array of [`PhotoRef`], 0..=5).
    pub photos: Json,

    /// Photos attached at resolution (JSON array of [`PhotoRef`], 0..=5).
    pub resolution_photos: Json,

    /// Notes recorded when work began.
    #[sea_orm(column_type = "Text", nullable)]
    pub technician_notes: Option<String>,

    /// How the complaint was closed out.
    #[sea_orm(column_type = "Text", nullable)]
    pub resolution_notes: Option<String>,

    /// Materials consumed during resolution.
    #[sea_orm(column_type = "Text", nullable)]
    pub materials_used: Option<String>,

    /// When the complaint was filed.
    pub created_at: DateTimeWithTimeZone,

    /// When a technician was bound. Non-null iff status ≥ assigned.
    #[sea_orm(nullable)]
    pub assigned_at: Option<DateTimeWithTimeZone>,

    /// When work began. Non-null iff status ≥ in-progress.
    #[sea_orm(nullable)]
    pub started_at: Option<DateTimeWithTimeZone>,

    /// When the complaint was resolved. Non-null iff status = resolved.
    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// The creator as a tagged value.
    #[must_use]
    pub fn creator(&self) -> Creator {
        Creator::from_columns(self.creator_type, self.creator_id.clone())
    }

    /// Parsed creation photos. An unreadable column yields an empty list.
    #[must_use]
    pub fn photo_refs(&self) -> Vec<PhotoRef> {
        serde_json::from_value(self.photos.clone()).unwrap_or_default()
    }

    /// Parsed resolution photos. An unreadable column yields an empty list.
    #[must_use]
    pub fn resolution_photo_refs(&self) -> Vec<PhotoRef> {
        serde_json::from_value(self.resolution_photos.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
