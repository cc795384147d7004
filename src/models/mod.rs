//! Data models

pub mod form;
pub mod row;
pub mod vehicle;

pub use form::VehicleForm;
pub use row::{Cell, DataRow};
pub use vehicle::{ValidationError, VehicleData, RAW_COLUMNS};
