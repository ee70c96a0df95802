pub mod client;
pub mod dto;
pub mod errors;

use async_trait::async_trait;

pub use client::ApiClient;
pub use dto::{DeviceUpdate, MutationResponse, NewDevice};
pub use errors::RequestError;

use crate::devices::Device;

/// Device operations the front-ends need, one network exchange per call
/// (listing may page).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceApi: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>, RequestError>;

    async fn get_device(&self, device_id: &str) -> Result<Device, RequestError>;

    async fn create_device(&self, device: &NewDevice) -> Result<MutationResponse, RequestError>;

    /// Partial update; only the fields in `update` change.
    async fn update_device(
        &self,
        device_id: &str,
        update: &DeviceUpdate,
    ) -> Result<MutationResponse, RequestError>;

    async fn delete_device(&self, device_id: &str) -> Result<MutationResponse, RequestError>;
}
