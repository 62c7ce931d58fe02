//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod area_repo;
pub mod audit_repo;
pub mod content_repo;
pub mod department_repo;
pub mod media_repo;
pub mod notification_repo;
pub mod password_reset_repo;
pub mod project_repo;
pub mod role_repo;
pub mod service_repo;
pub mod service_request_repo;
pub mod session_repo;
pub mod smtp_config_repo;
pub mod task_repo;
pub mod token_blacklist_repo;
pub mod user_repo;

pub use area_repo::AreaRepo;
pub use audit_repo::AuditLogRepo;
pub use content_repo::ContentRepo;
pub use department_repo::DepartmentRepo;
pub use media_repo::{PhotoRepo, VideoRepo};
pub use notification_repo::NotificationRepo;
pub use password_reset_repo::PasswordResetRepo;
pub use project_repo::ProjectRepo;
pub use role_repo::{PermissionRepo, RoleRepo};
pub use service_repo::ServiceRepo;
pub use service_request_repo::ServiceRequestRepo;
pub use session_repo::SessionRepo;
pub use smtp_config_repo::SmtpConfigRepo;
pub use task_repo::TaskRepo;
pub use token_blacklist_repo::TokenBlacklistRepo;
pub use user_repo::UserRepo;
