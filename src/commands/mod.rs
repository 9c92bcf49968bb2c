pub mod settings;
pub mod visualization;
