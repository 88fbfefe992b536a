pub mod api;
pub mod app;
pub mod config;
pub mod device;
pub mod error;
pub mod models;
pub mod services;

mod test;
