//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod object_id;
pub mod lead;
pub mod university;
pub mod pagination;

pub use validation::ValidationError;
pub use object_id::ObjectId;
pub use lead::{Email, IntakeYear, Lead, LeadSubmission, NewLead, Phone, PhoneInput};
pub use university::{
    Contact, Course, FeeRange, Placements, University, UniversityFilter, UniversityProfile,
    UniversitySummary,
};
pub use pagination::{PageInfo, Paginated, Pagination, PaginationParams};
