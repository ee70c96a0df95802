pub mod models;

pub use models::{
    format_timestamp, parse_properties, parse_timestamp, Device, Properties, PropertiesError,
    StatusClass,
};
