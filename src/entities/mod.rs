pub mod sensor_data;
pub mod sensors;
