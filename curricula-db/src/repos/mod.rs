//! Repository modules for database operations

pub mod catalog;
pub mod plans;
pub mod requirements;
pub mod shares;

pub use catalog::CatalogRepository;
pub use plans::PlanRepository;
pub use requirements::RequirementRepository;
pub use shares::ShareRepository;
