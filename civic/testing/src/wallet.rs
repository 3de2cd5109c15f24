use {
    crate::{MockChain, MockContract},
    async_trait::async_trait,
    civic_client::{Error, Result, WalletEvent, WalletProvider},
    civic_types::Address,
    std::sync::{Arc, Mutex, MutexGuard, PoisonError},
    tokio::sync::broadcast,
};

pub const MOCK_CHAIN_ID: u64 = 31337;

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug)]
struct Accounts {
    available: Vec<Address>,
    authorized: bool,
    rejects: bool,
    chain_id: u64,
}

/// A scriptable wallet backed by a `MockChain`.
///
/// Clones share state, so a test can keep one handle to drive the wallet
/// (switch accounts, change chains) after giving another to a session.
#[derive(Debug, Clone)]
pub struct MockWallet {
    chain: MockChain,
    accounts: Arc<Mutex<Accounts>>,
    events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
    /// A wallet holding `accounts` that has not yet authorized the
    /// application.
    pub fn new(chain: MockChain, accounts: Vec<Address>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            chain,
            accounts: Arc::new(Mutex::new(Accounts {
                available: accounts,
                authorized: false,
                rejects: false,
                chain_id: MOCK_CHAIN_ID,
            })),
            events,
        }
    }

    /// Marks the application as authorized, as if the user approved it in an
    /// earlier visit.
    pub fn authorized(self) -> Self {
        self.lock().authorized = true;
        self
    }

    /// Makes the next access requests be declined.
    pub fn rejecting(self) -> Self {
        self.lock().rejects = true;
        self
    }

    pub fn on_chain(self, chain_id: u64) -> Self {
        self.lock().chain_id = chain_id;
        self
    }

    pub fn chain(&self) -> &MockChain {
        &self.chain
    }

    /// Changes the exposed accounts and notifies subscribers. An empty list
    /// behaves like the user revoking access.
    pub fn switch_accounts(&self, accounts: Vec<Address>) {
        {
            let mut state = self.lock();
            state.authorized = !accounts.is_empty();
            state.available = accounts.clone();
        }

        let _ = self.events.send(WalletEvent::AccountsChanged(accounts));
    }

    pub fn switch_chain(&self, chain_id: u64) {
        self.lock().chain_id = chain_id;

        let _ = self.events.send(WalletEvent::ChainChanged(chain_id));
    }

    fn lock(&self) -> MutexGuard<'_, Accounts> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    type Contract = MockContract;

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let mut state = self.lock();

        if state.rejects {
            return Err(Error::UserRejected);
        }

        state.authorized = true;

        Ok(state.available.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        let state = self.lock();

        if !state.authorized {
            return Ok(Vec::new());
        }

        Ok(state.available.clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.lock().chain_id)
    }

    fn bind(&self, contract: Address, signer: Address) -> MockContract {
        self.chain.contract(contract, signer)
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
