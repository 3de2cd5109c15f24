use {
    crate::{ContractEvent, Error, ProposalContract, Result, WalletEvent, WalletProvider},
    alloy::{
        network::ReceiptResponse,
        primitives::{Address, U256},
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::types::{Filter, Log, TransactionReceipt},
        sol,
        sol_types::SolEvent,
        transports::TransportError,
    },
    async_trait::async_trait,
    civic_types::{ProposalId, RawProposal},
    std::time::Duration,
    tokio::{sync::broadcast, task::JoinHandle},
    tracing::{debug, warn},
    url::Url,
};

sol! {
    #[sol(rpc)]
    interface CivicProposals {
        event ProposalSubmitted(uint256 indexed proposalId, string text, string summary, string category, address submitter, uint256 timestamp);
        event Voted(uint256 indexed proposalId, address indexed voter, bool isLike, uint256 timestamp);

        function submitProposal(string _text, string _summary, string _category) external;
        function voteProposal(uint256 _proposalId, bool _isLike) external;
        function getProposal(uint256 _proposalId) external view returns (string, string, string, address, uint256, uint256, uint256);
        function getUserProposals(address _user) external view returns (uint256[]);
        function getProposalCount() external view returns (uint256);
        function hasUserVoted(uint256 _proposalId, address _user) external view returns (bool);
        function getUserVote(uint256 _proposalId, address _user) external view returns (bool);
    }
}

/// EIP-1193 error code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Capacity of the wallet event channel. Slow subscribers lag rather than
/// block the watcher.
const EVENT_CHANNEL_CAPACITY: usize = 16;

// ---------------------------------- wallet -----------------------------------

/// A wallet reached through an Ethereum JSON-RPC endpoint whose node holds
/// the account keys and signs on the user's behalf.
#[derive(Debug, Clone)]
pub struct EvmWallet<P> {
    provider: P,
    events: broadcast::Sender<WalletEvent>,
}

impl EvmWallet<DynProvider> {
    pub fn connect_http(rpc_url: &str) -> Result<Self> {
        let url = Url::parse(rpc_url)?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self::new(provider))
    }
}

impl<P> EvmWallet<P> {
    pub fn new(provider: P) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self { provider, events }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P> EvmWallet<P>
where
    P: Provider + Clone + 'static,
{
    /// Plain HTTP endpoints cannot push notifications, so poll the accounts
    /// and chain id and broadcast whatever changed since the previous tick.
    pub fn watch(&self, interval: Duration) -> JoinHandle<()> {
        let provider = self.provider.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut last_accounts = None;
            let mut last_chain_id = None;

            loop {
                ticker.tick().await;

                match provider.get_accounts().await {
                    Ok(accounts) => {
                        if last_accounts.as_ref().is_some_and(|last| *last != accounts) {
                            debug!(accounts = accounts.len(), "Wallet accounts changed");
                            let _ = events.send(WalletEvent::AccountsChanged(accounts.clone()));
                        }
                        last_accounts = Some(accounts);
                    },
                    Err(err) => warn!(%err, "Failed to poll wallet accounts"),
                }

                match provider.get_chain_id().await {
                    Ok(chain_id) => {
                        if last_chain_id.is_some_and(|last| last != chain_id) {
                            debug!(chain_id, "Wallet chain changed");
                            let _ = events.send(WalletEvent::ChainChanged(chain_id));
                        }
                        last_chain_id = Some(chain_id);
                    },
                    Err(err) => warn!(%err, "Failed to poll wallet chain id"),
                }
            }
        })
    }
}

#[async_trait]
impl<P> WalletProvider for EvmWallet<P>
where
    P: Provider + Clone + 'static,
{
    type Contract = EvmProposalContract<P>;

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.provider
            .raw_request::<_, Vec<Address>>("eth_requestAccounts".into(), Vec::<()>::new())
            .await
            .map_err(|err| {
                if rejected_by_user(&err) {
                    Error::UserRejected
                } else {
                    Error::Read(err.to_string())
                }
            })
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.provider
            .get_accounts()
            .await
            .map_err(|err| Error::Read(err.to_string()))
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|err| Error::Read(err.to_string()))
    }

    fn bind(&self, contract: Address, signer: Address) -> Self::Contract {
        EvmProposalContract::new(contract, signer, self.provider.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

// --------------------------------- contract ----------------------------------

#[derive(Debug, Clone)]
pub struct EvmProposalContract<P> {
    instance: CivicProposals::CivicProposalsInstance<P>,
    signer: Address,
}

impl<P> EvmProposalContract<P>
where
    P: Provider,
{
    pub fn new(address: Address, signer: Address, provider: P) -> Self {
        Self {
            instance: CivicProposals::new(address, provider),
            signer,
        }
    }

    fn check_receipt(receipt: &TransactionReceipt) -> Result<()> {
        if !ReceiptResponse::status(receipt) {
            return Err(Error::Transaction(format!(
                "transaction {} reverted",
                receipt.transaction_hash
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl<P> ProposalContract for EvmProposalContract<P>
where
    P: Provider + Clone + 'static,
{
    fn address(&self) -> Address {
        *self.instance.address()
    }

    fn signer(&self) -> Address {
        self.signer
    }

    async fn submit_proposal(
        &self,
        text: &str,
        summary: &str,
        category: &str,
    ) -> Result<ProposalId> {
        let receipt = self
            .instance
            .submitProposal(text.to_string(), summary.to_string(), category.to_string())
            .from(self.signer)
            .send()
            .await
            .map_err(|err| write_error(err, None))?
            .get_receipt()
            .await
            .map_err(|err| Error::Transaction(err.to_string()))?;

        Self::check_receipt(&receipt)?;

        let submitted = receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.inner.address == self.address())
            .find_map(|log| log.log_decode::<CivicProposals::ProposalSubmitted>().ok())
            .ok_or_else(|| {
                Error::Transaction(format!(
                    "transaction {} emitted no ProposalSubmitted event",
                    receipt.transaction_hash
                ))
            })?;

        let proposal_id = to_u64(submitted.inner.data.proposalId, "proposal id")?;

        debug!(proposal_id, tx_hash = %receipt.transaction_hash, "Submission included");

        Ok(proposal_id)
    }

    async fn vote_proposal(&self, proposal_id: ProposalId, is_like: bool) -> Result<()> {
        let receipt = self
            .instance
            .voteProposal(U256::from(proposal_id), is_like)
            .from(self.signer)
            .send()
            .await
            .map_err(|err| write_error(err, Some(proposal_id)))?
            .get_receipt()
            .await
            .map_err(|err| Error::Transaction(err.to_string()))?;

        Self::check_receipt(&receipt)?;

        debug!(proposal_id, is_like, tx_hash = %receipt.transaction_hash, "Vote included");

        Ok(())
    }

    async fn get_proposal(&self, proposal_id: ProposalId) -> Result<RawProposal> {
        let fields = self
            .instance
            .getProposal(U256::from(proposal_id))
            .call()
            .await
            .map_err(read_error)?;

        Ok(RawProposal {
            text: fields._0,
            summary: fields._1,
            category: fields._2,
            submitter: fields._3,
            timestamp: to_u64(fields._4, "timestamp")?,
            likes: to_u64(fields._5, "likes")?,
            dislikes: to_u64(fields._6, "dislikes")?,
        })
    }

    async fn get_user_proposals(&self, user: Address) -> Result<Vec<ProposalId>> {
        self.instance
            .getUserProposals(user)
            .call()
            .await
            .map_err(read_error)?
            .into_iter()
            .map(|id| to_u64(id, "proposal id"))
            .collect()
    }

    async fn get_proposal_count(&self) -> Result<u64> {
        let count = self
            .instance
            .getProposalCount()
            .call()
            .await
            .map_err(read_error)?;

        to_u64(count, "proposal count")
    }

    async fn has_user_voted(&self, proposal_id: ProposalId, user: Address) -> Result<bool> {
        self.instance
            .hasUserVoted(U256::from(proposal_id), user)
            .call()
            .await
            .map_err(read_error)
    }

    async fn get_user_vote(&self, proposal_id: ProposalId, user: Address) -> Result<bool> {
        self.instance
            .getUserVote(U256::from(proposal_id), user)
            .call()
            .await
            .map_err(read_error)
    }

    async fn events(&self, from_block: u64) -> Result<Vec<ContractEvent>> {
        let filter = Filter::new()
            .address(self.address())
            .from_block(from_block)
            .event_signature(vec![
                CivicProposals::ProposalSubmitted::SIGNATURE_HASH,
                CivicProposals::Voted::SIGNATURE_HASH,
            ]);

        let logs = self
            .instance
            .provider()
            .get_logs(&filter)
            .await
            .map_err(|err| Error::Read(err.to_string()))?;

        debug!(from_block, logs = logs.len(), "Fetched contract logs");

        logs.iter().filter_map(decode_event).collect()
    }
}

// ---------------------------------- helpers ----------------------------------

fn decode_event(log: &Log) -> Option<Result<ContractEvent>> {
    let topic = *log.topic0()?;

    if topic == CivicProposals::ProposalSubmitted::SIGNATURE_HASH {
        let event = log
            .log_decode::<CivicProposals::ProposalSubmitted>()
            .ok()?
            .inner
            .data;

        return Some(submitted_event(event));
    }

    if topic == CivicProposals::Voted::SIGNATURE_HASH {
        let event = log.log_decode::<CivicProposals::Voted>().ok()?.inner.data;

        return Some(voted_event(event));
    }

    None
}

fn submitted_event(event: CivicProposals::ProposalSubmitted) -> Result<ContractEvent> {
    Ok(ContractEvent::ProposalSubmitted {
        proposal_id: to_u64(event.proposalId, "proposal id")?,
        text: event.text,
        summary: event.summary,
        category: event.category,
        submitter: event.submitter,
        timestamp: to_u64(event.timestamp, "timestamp")?,
    })
}

fn voted_event(event: CivicProposals::Voted) -> Result<ContractEvent> {
    Ok(ContractEvent::Voted {
        proposal_id: to_u64(event.proposalId, "proposal id")?,
        voter: event.voter,
        is_like: event.isLike,
        timestamp: to_u64(event.timestamp, "timestamp")?,
    })
}

fn to_u64(value: U256, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::Read(format!("{what} {value} exceeds 64 bits")))
}

fn rejected_by_user(err: &TransportError) -> bool {
    err.as_error_resp()
        .is_some_and(|payload| payload.code == USER_REJECTED_CODE)
}

/// Whether a revert reason or node message reports a double vote.
pub fn is_already_voted(message: &str) -> bool {
    message.to_lowercase().contains("already voted")
}

fn read_error(err: alloy::contract::Error) -> Error {
    Error::Read(err.to_string())
}

fn write_error(err: alloy::contract::Error, proposal_id: Option<ProposalId>) -> Error {
    if let alloy::contract::Error::TransportError(transport) = &err {
        if rejected_by_user(transport) {
            return Error::UserRejected;
        }
    }

    let message = err.to_string();

    match proposal_id {
        Some(proposal_id) if is_already_voted(&message) => Error::AlreadyVoted { proposal_id },
        _ => Error::Transaction(message),
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, assertor::*, test_case::test_case};

    #[test_case("execution reverted: Already voted", true; "revert reason")]
    #[test_case("server returned an error response: error code 3: execution reverted: You have already voted", true; "node message")]
    #[test_case("execution reverted: Invalid proposal", false; "other revert")]
    #[test_case("insufficient funds for gas", false; "gas failure")]
    fn detecting_double_votes(message: &str, expect: bool) {
        assert_that!(is_already_voted(message)).is_equal_to(expect);
    }

    #[test]
    fn converting_contract_integers() {
        assert_that!(to_u64(U256::from(42), "likes").unwrap()).is_equal_to(42);
        assert_that!(matches!(to_u64(U256::MAX, "likes"), Err(Error::Read(_)))).is_true();
    }

    #[test]
    fn decoding_vote_log() {
        let voter = Address::repeat_byte(7);
        let event = CivicProposals::Voted {
            proposalId: U256::from(3),
            voter,
            isLike: true,
            timestamp: U256::from(1_700_000_000),
        };
        let log = Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(1),
                data: event.encode_log_data(),
            },
            ..Default::default()
        };

        let decoded = decode_event(&log).unwrap().unwrap();

        assert_that!(decoded).is_equal_to(ContractEvent::Voted {
            proposal_id: 3,
            voter,
            is_like: true,
            timestamp: 1_700_000_000,
        });
    }
}
