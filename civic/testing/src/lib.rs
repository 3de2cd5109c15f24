mod chain;
mod service;
mod tracing;
mod wallet;

pub use {chain::*, service::*, tracing::*, wallet::*};
