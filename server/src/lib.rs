pub mod assets;
pub mod config;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod test_support;
