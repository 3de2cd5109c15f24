use {
    crate::{ProposalContract, Result},
    alloy::primitives::Address,
    async_trait::async_trait,
    tokio::sync::broadcast,
};

/// Notifications pushed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The authorized accounts changed. An empty list means the user revoked
    /// access or locked the wallet.
    AccountsChanged(Vec<Address>),
    /// The wallet switched networks.
    ChainChanged(u64),
}

/// The wallet the user authorizes the application with.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    type Contract: ProposalContract;

    /// Asks the user to authorize the application. Fails with
    /// `Error::UserRejected` if they decline.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Accounts the application is already authorized for. Never prompts.
    async fn accounts(&self) -> Result<Vec<Address>>;

    async fn chain_id(&self) -> Result<u64>;

    /// Binds a contract handle that signs with `signer`.
    fn bind(&self, contract: Address, signer: Address) -> Self::Contract;

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
