pub mod admission_repo;
pub mod app_config;
pub mod customer_repo;
pub mod database;

pub use admission_repo::PgAdmissionStore;
pub use customer_repo::PgCustomerDirectory;
pub use app_config::{BusinessRules, Config};
pub use database::DbClient;
