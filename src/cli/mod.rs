pub mod app;
pub mod env;
pub mod output;
pub mod runtime;
