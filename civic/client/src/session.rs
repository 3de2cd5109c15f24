use {
    crate::{ChainConfig, Error, Result, SubscriptionId, Subscriptions, WalletEvent, WalletProvider},
    alloy::primitives::Address,
    tokio::sync::broadcast::{self, error::TryRecvError},
    tracing::{debug, info, warn},
};

/// Notifications the session sends to its listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected { account: Address, chain_id: u64 },
    AccountChanged { account: Address },
    /// The wallet switched networks. Sent before the session reconnects on
    /// the new chain; a `Connected` follows if that succeeds.
    ChainChanged { chain_id: u64 },
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone)]
pub struct Connection<C> {
    pub account: Address,
    pub chain_id: u64,
    pub contract: C,
}

#[derive(Debug)]
enum State<C> {
    Disconnected,
    Connecting,
    Connected(Connection<C>),
}

/// The wallet session: which account is active and the contract handle that
/// signs as it.
///
/// The account and the contract handle live together in the `Connected`
/// state, so one is never present without the other.
pub struct Session<W>
where
    W: WalletProvider,
{
    wallet: Option<W>,
    contract_address: Address,
    expected_chain_id: Option<u64>,
    state: State<W::Contract>,
    events: Option<broadcast::Receiver<WalletEvent>>,
    listeners: Subscriptions<SessionEvent>,
    epoch: u64,
    /// Set by an explicit `disconnect`, cleared by the next successful
    /// connection. While set, chain changes do not reconnect.
    dismissed: bool,
}

impl<W> Session<W>
where
    W: WalletProvider,
{
    /// `wallet` is `None` when no wallet is installed.
    ///
    /// The session listens to the wallet for as long as it lives, so a chain
    /// change can reconnect it even after a failed connection.
    pub fn new(wallet: Option<W>, config: &ChainConfig) -> Self {
        let events = wallet.as_ref().map(W::subscribe);

        Self {
            wallet,
            contract_address: config.contract_address,
            expected_chain_id: config.chain_id,
            state: State::Disconnected,
            events,
            listeners: Subscriptions::new(),
            epoch: 0,
            dismissed: false,
        }
    }

    pub fn status(&self) -> Status {
        match self.state {
            State::Disconnected => Status::Disconnected,
            State::Connecting => Status::Connecting,
            State::Connected(_) => Status::Connected,
        }
    }

    pub fn connection(&self) -> Option<&Connection<W::Contract>> {
        match &self.state {
            State::Connected(connection) => Some(connection),
            _ => None,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.connection().map(|connection| connection.account)
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.connection().map(|connection| connection.chain_id)
    }

    /// The wallet, exposed only while connected.
    pub fn provider(&self) -> Option<&W> {
        self.connection().and(self.wallet.as_ref())
    }

    /// `None` means reads and writes are unavailable; callers should offer
    /// to connect instead of failing.
    pub fn contract(&self) -> Option<&W::Contract> {
        self.connection().map(|connection| &connection.contract)
    }

    pub fn require_contract(&self) -> Result<&W::Contract> {
        self.contract().ok_or(Error::NotConnected)
    }

    /// Bumped on every change of identity: connect, account switch, chain
    /// switch and disconnect. Results requested under an older epoch belong
    /// to a session that no longer exists.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn register<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listeners.register(listener)
    }

    pub fn unregister(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unregister(id)
    }

    /// Reconnects without prompting if the wallet already authorized an
    /// account. Meant to run once when the application starts.
    pub async fn restore(&mut self) -> Result<Option<Address>> {
        let Some(wallet) = &self.wallet else {
            debug!("No wallet installed, staying disconnected");
            return Ok(None);
        };

        let Some(account) = wallet.accounts().await?.into_iter().next() else {
            debug!("Wallet has no authorized account, staying disconnected");
            return Ok(None);
        };

        self.establish(account).await.map(Some)
    }

    /// Asks the wallet for account access.
    pub async fn connect(&mut self) -> Result<Address> {
        let Some(wallet) = &self.wallet else {
            return Err(Error::NoWallet);
        };

        if let State::Connected(connection) = &self.state {
            return Ok(connection.account);
        }

        self.state = State::Connecting;

        let result = match wallet.request_accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => self.establish(account).await,
                None => Err(Error::UserRejected),
            },
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            warn!(%err, "Failed to connect wallet");
            self.state = State::Disconnected;
        }

        result
    }

    /// Forgets the active account. Wallets offer no way for an application
    /// to revoke its own access, so nothing is sent to the wallet.
    ///
    /// The session stays disconnected until the next `connect` or `restore`,
    /// whatever the wallet does in the meantime.
    pub fn disconnect(&mut self) {
        self.dismissed = true;
        self.drop_connection();
    }

    /// The single entry point for wallet notifications.
    pub async fn handle_event(&mut self, event: WalletEvent) -> Result<()> {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                let Some(current) = self.account() else {
                    debug!(?accounts, "Ignoring account change while disconnected");
                    return Ok(());
                };

                match accounts.first() {
                    None => self.drop_connection(),
                    Some(account) if *account == current => {},
                    Some(account) => self.switch_account(*account),
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                if self.dismissed {
                    debug!(chain_id, "Ignoring chain change after disconnect");
                    return Ok(());
                }

                info!(chain_id, "Wallet switched chain, rebuilding session");

                // The contract binding may not exist on the new chain, so
                // rebuild everything instead of patching the connection.
                let was_connected = self.connection().is_some();
                if was_connected {
                    self.teardown();
                }

                self.listeners
                    .dispatch(&SessionEvent::ChainChanged { chain_id });

                let restored = self.restore().await;

                if was_connected && !matches!(restored, Ok(Some(_))) {
                    self.listeners.dispatch(&SessionEvent::Disconnected);
                }

                restored?;
            },
        }

        Ok(())
    }

    /// Applies every wallet notification received since the last call and
    /// returns how many there were. Every event is applied even if an
    /// earlier one fails; the first failure is returned.
    pub async fn sync_events(&mut self) -> Result<usize> {
        let mut pending = Vec::new();

        if let Some(events) = &mut self.events {
            loop {
                match events.try_recv() {
                    Ok(event) => pending.push(event),
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!(skipped, "Wallet events were dropped");
                    },
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
        }

        let applied = pending.len();
        let mut first_err = None;

        for event in pending {
            if let Err(err) = self.handle_event(event).await {
                warn!(%err, "Failed to apply wallet event");
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(applied),
        }
    }

    async fn establish(&mut self, account: Address) -> Result<Address> {
        let Some(wallet) = &self.wallet else {
            return Err(Error::NoWallet);
        };

        let chain_id = wallet.chain_id().await?;

        if let Some(expected) = self.expected_chain_id {
            if expected != chain_id {
                return Err(Error::ChainMismatch {
                    expected,
                    actual: chain_id,
                });
            }
        }

        let contract = wallet.bind(self.contract_address, account);

        self.state = State::Connected(Connection {
            account,
            chain_id,
            contract,
        });
        self.dismissed = false;
        self.epoch += 1;

        info!(%account, chain_id, "Wallet connected");
        self.listeners
            .dispatch(&SessionEvent::Connected { account, chain_id });

        Ok(account)
    }

    fn switch_account(&mut self, account: Address) {
        let Some(wallet) = &self.wallet else {
            return;
        };

        let State::Connected(connection) = &mut self.state else {
            return;
        };

        connection.account = account;
        connection.contract = wallet.bind(self.contract_address, account);
        self.epoch += 1;

        info!(%account, "Wallet account changed");
        self.listeners
            .dispatch(&SessionEvent::AccountChanged { account });
    }

    fn drop_connection(&mut self) {
        if matches!(self.state, State::Disconnected) {
            return;
        }

        self.teardown();
        info!("Wallet disconnected");
        self.listeners.dispatch(&SessionEvent::Disconnected);
    }

    fn teardown(&mut self) {
        self.state = State::Disconnected;
        self.epoch += 1;
    }
}
