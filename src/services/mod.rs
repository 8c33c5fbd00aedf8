//! Business rules. Handlers stay thin and call into these.

pub mod access;
pub mod auth;
pub mod catalog;
pub mod modules;
pub mod progress;
pub mod purchase;
pub mod seed;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

pub use access::Caller;
pub use auth::AuthService;
pub use catalog::CatalogService;
pub use modules::{ModuleMedia, ModuleService};
pub use progress::ProgressService;
pub use purchase::PurchaseService;
pub use seed::{SeedReport, SeedService};
pub use users::UserService;
