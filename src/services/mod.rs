pub mod audit_service;
pub mod dataset_service;
pub mod definition_service;
pub mod version_service;

pub use audit_service::{AuditAction, AuditService};
pub use dataset_service::DatasetService;
pub use definition_service::{Comparison, DefinitionService, DefinitionUpsertRequest};
pub use version_service::VersionService;
