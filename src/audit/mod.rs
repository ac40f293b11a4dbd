// Append-only audit trail of session lifecycle events

pub mod reader;
pub mod types;
pub mod writer;

pub use reader::AuditReader;
pub use types::{AuditAction, AuditLogEntry};
pub use writer::AuditWriter;
