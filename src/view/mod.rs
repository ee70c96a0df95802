pub mod admin;
pub mod confirm;
pub mod mobile;
pub mod page;
pub mod shell;
pub mod state;
pub mod status;

pub use admin::AdminPortal;
pub use confirm::Confirmer;
pub use mobile::MobileApp;
pub use page::{DeviceListView, DeviceRow, Field, Page};
pub use shell::Shell;
pub use state::{transition, Effect, ViewEvent, ViewState};
pub use status::{StatusBanner, StatusKind, StatusMessage};
