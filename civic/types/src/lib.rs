mod analytics;
mod category;
mod draft;
mod proposal;
mod search;
mod service;
mod view;

pub use {
    analytics::*, category::*, draft::*, proposal::*, search::*, service::*, view::*,
};

// -------------------------------- re-exports ---------------------------------

pub use alloy_primitives::Address;
