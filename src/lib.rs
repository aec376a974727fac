pub mod catalog;
pub mod config;
pub mod engine;
pub mod env;
pub mod explain;
pub mod history;
pub mod session;
pub mod template;

#[cfg(feature = "cli")]
pub mod interactive;
#[cfg(feature = "cli")]
pub mod printer;
