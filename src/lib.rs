pub mod backoffice;
pub mod config;
pub mod errors;
pub mod logging;
