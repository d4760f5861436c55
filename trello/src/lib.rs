pub mod cache;
pub mod client;
pub mod config;
pub mod connector;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{TrelloApi, TrelloClient, create_trello_client};
pub use config::TrelloConfig;
pub use connector::TrelloConnector;
pub use error::{TrelloError, TrelloResult};
