pub mod aggregate;
pub mod chain;
pub mod provider;
pub mod sample;
pub mod scanner;
