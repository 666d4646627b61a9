//! # fairdispatch — fair round-robin packet dispatch for peer-to-peer nodes
//!
//! Delivers inbound messages from many remote peer sources to a single
//! application handler, isolating each source's backlog from the others,
//! bounding per-source memory, and evicting sources that stop making
//! progress. A round-robin scheduling ring keeps any one loud source from
//! starving the rest.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use fairdispatch::{Dispatcher, DispatcherConfig, Handler};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Handler<String, Vec<u8>> for Printer {
//!     type Error = std::convert::Infallible;
//!
//!     async fn handle(&self, source: String, message: Vec<u8>) -> Result<(), Self::Error> {
//!         println!("{source}: {} bytes", message.len());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fairdispatch::ConfigError> {
//!     let config = DispatcherConfig {
//!         max_source_queue_size: 64,
//!         give_up_after_skipped: 3,
//!         drop_source_after_retries: 5,
//!     };
//!     let mut dispatcher = Dispatcher::new(Printer, config)?;
//!     dispatcher.dispatch("peer-a".to_string(), b"hello".to_vec()).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module organization
//!
//! - [`dispatch`] - the scheduling ring, per-source queues, and the
//!   `Dispatcher`/`SerializedDispatcher` state machines
//! - [`error`] - construction-time configuration errors
//!
//! ## Out of scope
//!
//! This crate does not parse message contents, manage transport or peer
//! connections, or persist queue state across restarts. It has no CLI and no
//! environment-variable surface; configuration is three constructor
//! integers.

pub mod dispatch;
pub mod error;

pub use dispatch::{Dispatcher, DispatcherConfig, Handler, SerializedDispatcher};
pub use error::ConfigError;
