pub mod cache;
pub mod opener;
pub mod session;
pub mod state;
