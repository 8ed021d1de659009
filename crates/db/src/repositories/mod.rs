//! Database repositories.

pub mod asset_record;
pub mod complaint;
pub mod user;

pub use asset_record::AssetRecordRepository;
pub use complaint::{ComplaintFilter, ComplaintRepository, PendingChanges};
pub use user::UserRepository;
