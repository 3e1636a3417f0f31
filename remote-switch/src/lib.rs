pub mod app;
pub mod config;
pub mod error;
pub mod hal;
pub mod svc;
