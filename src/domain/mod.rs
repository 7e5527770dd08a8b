pub mod error;
pub mod heatmap;
pub mod impact;
pub mod models;
pub mod progress;
pub mod recorder;
pub mod settings;
pub mod validation;
