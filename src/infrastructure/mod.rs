pub mod config;
pub mod container;
pub mod database;
pub mod external_services;

pub use config::LibraryConfig;
pub use container::AppContainer;
