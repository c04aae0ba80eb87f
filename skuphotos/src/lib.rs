pub mod config;
pub mod console;
pub mod error;
pub mod naming;
pub mod resolver;
pub mod session;
pub mod shell;
pub mod store;
pub mod sync;
pub mod view;

#[cfg(test)]
mod testing;
