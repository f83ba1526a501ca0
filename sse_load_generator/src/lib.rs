//! Load generator for SSE pub/sub hubs.
//!
//! Opens batches of long-lived subscriptions, one topic per connection, all
//! authorized by a single signed subscriber token, and keeps them open until
//! the process is interrupted.
pub mod client;
pub mod config;
pub mod counter;
pub mod observability;
pub mod operator;
pub mod runner;
pub mod shutdown;
pub mod token;
pub mod worker;
