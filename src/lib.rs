//! Bulk asynchronous DNS queries.
//!
//! This crate sends a large number of independent requests through a
//! transport without dedicating a thread to each of them, and later
//! matches every outcome back to the request that caused it. While it was
//! written for resolving long lists of domain names, nothing but the
//! [dns] module is specific to the DNS.
//!
//! # Overview
//!
//! Requests are sent as part of a [`Batch`]. Dispatching assigns each
//! request a [`CorrelationId`], records it as outstanding, and hands it to
//! a [`Transport`]. The transport sends the request in whichever way it
//! likes and publishes exactly one [`Outcome`] for it into the batch’s
//! [`ResultQueue`] once it has completed.
//!
//! Outcomes are then drained from the queue using one of two strategies:
//!
//! * [`Batch::drain_exact`] takes as many outcomes as requests were sent,
//!   no matter how long that takes, while
//! * [`Batch::drain_until`] runs a pool of workers taking outcomes until a
//!   deadline and reports requests without an outcome as unreturned.
//!
//! Finally, [`Batch::report`] summarizes the batch.
//!
//! ```
//! use domain_bulk::{
//!     Batch, Config, CorrelationId, Outcome, Rejected, Request,
//!     ResultQueue, Transport,
//! };
//!
//! /// A transport that answers every request with its own payload.
//! struct Echo;
//!
//! impl Transport for Echo {
//!     type Payload = String;
//!     type Response = String;
//!     type Failure = ();
//!
//!     fn send_async(
//!         &self,
//!         request: Request<String>,
//!         queue: &ResultQueue<String, ()>,
//!     ) -> Result<(), Rejected> {
//!         let queue = queue.clone();
//!         tokio::spawn(async move {
//!             let (id, payload) = request.into_parts();
//!             queue.put(Outcome::success(id, payload));
//!         });
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let batch = Batch::new(Echo, Config::new());
//! let dispatched = batch.dispatch(["a", "b", "c"], |item, _| {
//!     Ok::<_, std::convert::Infallible>(String::from(item))
//! });
//! let report = batch.drain_exact(dispatched.sent).await;
//! assert_eq!(report.success, 3);
//! # }
//! ```
//!
//! # Feature Flags
//!
//! * `dns`: enables the [dns] module for building DNS queries with the
//!   [domain](https://github.com/nlnetlabs/domain) crate. This feature is
//!   enabled by default.
//! * `serde`: implements `Serialize` for [`Report`] and [`CorrelationId`].
//!
//! # Logging
//!
//! The crate reports what it is doing via the
//! [tracing](https://github.com/tokio-rs/tracing) crate. It never installs
//! a subscriber itself.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use self::batch::Batch;
pub use self::config::Config;
pub use self::dispatch::{Dispatched, ItemFailure};
pub use self::drain::Drained;
pub use self::error::{Error, Rejected, TimedOut};
pub use self::id::{CorrelationId, IdGenerator, IdStart};
pub use self::outstanding::Outstanding;
pub use self::queue::ResultQueue;
pub use self::request::{Outcome, Request};
pub use self::stats::{Counters, Report};
pub use self::transport::Transport;

mod batch;
mod config;
mod dispatch;
mod drain;
mod error;
mod id;
mod ledger;
mod outstanding;
mod queue;
mod request;
mod stats;
mod transport;

#[cfg(feature = "dns")]
#[cfg_attr(docsrs, doc(cfg(feature = "dns")))]
pub mod dns;
