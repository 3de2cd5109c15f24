mod aggregator;
mod board;
mod contract;
mod draft;
mod error;
mod evm;
mod gateway;
mod session;
mod settings;
mod subscription;
mod wallet;

pub use {
    aggregator::*, board::*, contract::*, draft::*, error::*, evm::*, gateway::*, session::*,
    settings::*, subscription::*, wallet::*,
};
