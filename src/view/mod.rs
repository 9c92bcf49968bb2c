pub mod color;
pub mod layout;
pub mod render;
