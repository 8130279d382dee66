pub mod config;
pub mod display;
pub mod error;
pub mod import;
pub mod lookup;
pub mod menu;
