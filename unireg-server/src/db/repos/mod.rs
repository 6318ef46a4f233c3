//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Handles conflicts via ON CONFLICT (no check-then-insert)
//! - Uses transactions for multi-step operations

pub mod universities;
pub mod leads;

pub use universities::UniversityRepo;
pub use leads::LeadRepo;
