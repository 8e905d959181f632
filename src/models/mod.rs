//! Domain models.

pub mod assignment;
pub mod audit_log;
pub mod leave_request;
pub mod notification;
pub mod permission;
pub mod request;
pub mod swap_request;
pub mod user;

pub use assignment::{Assignment, AssignmentKind};
pub use audit_log::AuditLogEntry;
pub use leave_request::{LeaveRequest, LeaveType};
pub use notification::Notification;
pub use permission::{Permission, PermissionRegistry, Role};
pub use request::{RequestStatus, ReviewDecision};
pub use swap_request::SwapRequest;
pub use user::User;
