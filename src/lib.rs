pub mod api;
pub mod config;
pub mod configure;
pub mod console;
pub mod devices;
pub mod session;
pub mod view;
