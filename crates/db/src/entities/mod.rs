//! Database entities.

pub mod asset_record;
pub mod complaint;
pub mod user;

pub use asset_record::Entity as AssetRecord;
pub use complaint::Entity as Complaint;
pub use user::Entity as User;
