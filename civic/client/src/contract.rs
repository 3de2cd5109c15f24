use {
    crate::Result,
    alloy::primitives::Address,
    async_trait::async_trait,
    civic_types::{ProposalId, RawProposal},
    serde::{Deserialize, Serialize},
};

/// Events emitted by the proposal contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContractEvent {
    ProposalSubmitted {
        proposal_id: ProposalId,
        text: String,
        summary: String,
        category: String,
        submitter: Address,
        timestamp: u64,
    },
    Voted {
        proposal_id: ProposalId,
        voter: Address,
        is_like: bool,
        timestamp: u64,
    },
}

impl ContractEvent {
    pub fn proposal_id(&self) -> ProposalId {
        match self {
            ContractEvent::ProposalSubmitted { proposal_id, .. }
            | ContractEvent::Voted { proposal_id, .. } => *proposal_id,
        }
    }
}

/// A typed handle to the proposal contract, bound to the account that signs
/// its transactions.
#[async_trait]
pub trait ProposalContract: Send + Sync {
    fn address(&self) -> Address;

    /// The account transactions are sent from.
    fn signer(&self) -> Address;

    /// Submits a proposal and waits for it to be included. Returns the id
    /// the contract assigned to it.
    async fn submit_proposal(
        &self,
        text: &str,
        summary: &str,
        category: &str,
    ) -> Result<ProposalId>;

    /// Casts a vote and waits for it to be included.
    async fn vote_proposal(&self, proposal_id: ProposalId, is_like: bool) -> Result<()>;

    async fn get_proposal(&self, proposal_id: ProposalId) -> Result<RawProposal>;

    async fn get_user_proposals(&self, user: Address) -> Result<Vec<ProposalId>>;

    async fn get_proposal_count(&self) -> Result<u64>;

    async fn has_user_voted(&self, proposal_id: ProposalId, user: Address) -> Result<bool>;

    async fn get_user_vote(&self, proposal_id: ProposalId, user: Address) -> Result<bool>;

    /// Events emitted at or after `from_block`, oldest first.
    async fn events(&self, from_block: u64) -> Result<Vec<ContractEvent>>;
}
