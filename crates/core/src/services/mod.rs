//! Business logic services.

#![allow(missing_docs)]

pub mod asset;
pub mod assignment;
pub mod complaint;
pub mod media;
pub mod reporting;
pub mod user;

pub use asset::{AssetService, CreateAssetRecordInput};
pub use assignment::AssignmentService;
pub use complaint::{
    ComplaintService, CreateComplaintInput, EditComplaintInput, ResolveComplaintInput, MAX_PHOTOS,
};
pub use media::MediaService;
pub use reporting::{
    bucket_key_for, bucket_keys, parse_timezone, ComplaintReportBucket, ReportInterval,
    ReportQuery, ReportingService, TechnicianReportQuery, TechnicianReportRow,
};
pub use user::{DirectoryEntry, RegisterUserInput, UserService};
