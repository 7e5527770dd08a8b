pub mod api;
pub mod bluetooth;
pub mod logging;
pub mod sensor_session;
