use {
    async_trait::async_trait,
    civic_client::{ContractEvent, Error, ProposalContract, Result},
    civic_types::{Address, Category, ProposalId, RawProposal},
    std::{
        collections::{BTreeMap, BTreeSet},
        sync::{Arc, Mutex, MutexGuard, PoisonError},
    },
    tracing::debug,
};

/// Block timestamp of the first transaction on a fresh chain.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Seconds between two consecutive transactions.
pub const BLOCK_TIME: u64 = 12;

#[derive(Debug)]
struct Entry {
    proposal: RawProposal,
    votes: BTreeMap<Address, bool>,
}

#[derive(Debug, Default)]
struct Ledger {
    entries: Vec<Entry>,
    /// Index of an event is the block it was emitted in.
    events: Vec<ContractEvent>,
    failing_reads: BTreeSet<ProposalId>,
    failing_count: bool,
    transactions: u64,
}

impl Ledger {
    fn now(&mut self) -> u64 {
        let timestamp = GENESIS_TIMESTAMP + self.transactions * BLOCK_TIME;
        self.transactions += 1;
        timestamp
    }

    fn entry(&self, proposal_id: ProposalId) -> Option<&Entry> {
        usize::try_from(proposal_id)
            .ok()
            .and_then(|index| self.entries.get(index))
    }

    fn entry_mut(&mut self, proposal_id: ProposalId) -> Option<&mut Entry> {
        usize::try_from(proposal_id)
            .ok()
            .and_then(|index| self.entries.get_mut(index))
    }

    fn existing(&self, proposal_id: ProposalId) -> Result<&Entry> {
        self.entry(proposal_id)
            .ok_or_else(|| Error::Read(format!("execution reverted: proposal {proposal_id} does not exist")))
    }

    fn readable(&self, proposal_id: ProposalId) -> Result<&Entry> {
        if self.failing_reads.contains(&proposal_id) {
            return Err(Error::Read(format!("node failed to read proposal {proposal_id}")));
        }

        self.existing(proposal_id)
    }

    fn push(&mut self, proposal: RawProposal) -> ProposalId {
        let proposal_id = self.entries.len() as ProposalId;

        self.events.push(ContractEvent::ProposalSubmitted {
            proposal_id,
            text: proposal.text.clone(),
            summary: proposal.summary.clone(),
            category: proposal.category.clone(),
            submitter: proposal.submitter,
            timestamp: proposal.timestamp,
        });
        self.entries.push(Entry {
            proposal,
            votes: BTreeMap::new(),
        });

        proposal_id
    }
}

/// An in-memory proposal contract shared by every handle bound to it.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    ledger: Arc<Mutex<Ledger>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contract(&self, address: Address, signer: Address) -> MockContract {
        MockContract {
            address,
            signer,
            ledger: self.ledger.clone(),
        }
    }

    /// Adds a proposal with preset tallies, as if others had already voted
    /// on it. Returns its id.
    pub fn seed(
        &self,
        submitter: Address,
        text: &str,
        category: Category,
        likes: u64,
        dislikes: u64,
    ) -> ProposalId {
        let mut ledger = self.lock();
        let timestamp = ledger.now();

        ledger.push(RawProposal {
            text: text.to_string(),
            summary: format!("Summary of: {text}"),
            category: category.to_string(),
            submitter,
            timestamp,
            likes,
            dislikes,
        })
    }

    /// Makes `get_proposal` fail for `proposal_id` until `heal` is called.
    /// The id may belong to a proposal that does not exist yet. Vote lookups
    /// keep working.
    pub fn fail_reads_of(&self, proposal_id: ProposalId) {
        self.lock().failing_reads.insert(proposal_id);
    }

    /// Makes reading the proposal count fail until `heal` is called.
    pub fn fail_count(&self) {
        self.lock().failing_count = true;
    }

    pub fn heal(&self) {
        let mut ledger = self.lock();
        ledger.failing_reads.clear();
        ledger.failing_count = false;
    }

    pub fn proposal_count(&self) -> u64 {
        self.lock().entries.len() as u64
    }

    /// `(likes, dislikes)` of a proposal, bypassing injected failures.
    pub fn tallies(&self, proposal_id: ProposalId) -> Option<(u64, u64)> {
        self.lock()
            .entry(proposal_id)
            .map(|entry| (entry.proposal.likes, entry.proposal.dislikes))
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A handle to a `MockChain` that signs as a fixed account.
#[derive(Debug, Clone)]
pub struct MockContract {
    address: Address,
    signer: Address,
    ledger: Arc<Mutex<Ledger>>,
}

impl MockContract {
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProposalContract for MockContract {
    fn address(&self) -> Address {
        self.address
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
        let mut ledger = self.lock();
        let timestamp = ledger.now();

        let proposal_id = ledger.push(RawProposal {
            text: text.to_string(),
            summary: summary.to_string(),
            category: category.to_string(),
            submitter: self.signer,
            timestamp,
            likes: 0,
            dislikes: 0,
        });

        debug!(proposal_id, signer = %self.signer, "Mock proposal submitted");

        Ok(proposal_id)
    }

    async fn vote_proposal(&self, proposal_id: ProposalId, is_like: bool) -> Result<()> {
        let mut ledger = self.lock();
        let timestamp = ledger.now();

        let Some(entry) = ledger.entry_mut(proposal_id) else {
            return Err(Error::Transaction(format!(
                "execution reverted: proposal {proposal_id} does not exist"
            )));
        };

        if entry.votes.contains_key(&self.signer) {
            return Err(Error::AlreadyVoted { proposal_id });
        }

        entry.votes.insert(self.signer, is_like);

        if is_like {
            entry.proposal.likes += 1;
        } else {
            entry.proposal.dislikes += 1;
        }

        ledger.events.push(ContractEvent::Voted {
            proposal_id,
            voter: self.signer,
            is_like,
            timestamp,
        });

        Ok(())
    }

    async fn get_proposal(&self, proposal_id: ProposalId) -> Result<RawProposal> {
        Ok(self.lock().readable(proposal_id)?.proposal.clone())
    }

    async fn get_user_proposals(&self, user: Address) -> Result<Vec<ProposalId>> {
        let ledger = self.lock();

        Ok(ledger
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.proposal.submitter == user)
            .map(|(index, _)| index as ProposalId)
            .collect())
    }

    async fn get_proposal_count(&self) -> Result<u64> {
        let ledger = self.lock();

        if ledger.failing_count {
            return Err(Error::Read("node failed to read proposal count".to_string()));
        }

        Ok(ledger.entries.len() as u64)
    }

    async fn has_user_voted(&self, proposal_id: ProposalId, user: Address) -> Result<bool> {
        Ok(self.lock().existing(proposal_id)?.votes.contains_key(&user))
    }

    async fn get_user_vote(&self, proposal_id: ProposalId, user: Address) -> Result<bool> {
        // Like the contract, reads `false` for accounts that never voted.
        Ok(self
            .lock()
            .existing(proposal_id)?
            .votes
            .get(&user)
            .copied()
            .unwrap_or(false))
    }

    async fn events(&self, from_block: u64) -> Result<Vec<ContractEvent>> {
        let ledger = self.lock();
        let from = usize::try_from(from_block).unwrap_or(usize::MAX);

        Ok(ledger.events.iter().skip(from).cloned().collect())
    }
}

// ----------------------------------- tests -----------------------------------
