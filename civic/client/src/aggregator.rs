use {
    crate::{Error, ProposalContract, Result, ServiceClient},
    alloy::primitives::Address,
    civic_types::{Category, Draft, Proposal, ProposalId, VoteStatus},
    futures::future::try_join_all,
    tracing::{debug, info, warn},
};

/// Result of a vote that went through on chain.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    /// The proposal as re-read after the vote.
    pub proposal: Proposal,
    /// Set when the search index could not be told about the new tallies.
    /// The vote itself still stands.
    pub sync_error: Option<String>,
}

/// Result of a submission that went through on chain.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub proposal: Proposal,
    /// Set when the proposal could not be added to the search index.
    pub sync_error: Option<String>,
}

impl SubmitOutcome {
    pub fn is_degraded(&self) -> bool {
        self.sync_error.is_some()
    }
}

impl VoteOutcome {
    pub fn is_degraded(&self) -> bool {
        self.sync_error.is_some()
    }
}

/// Reads whether `viewer` voted on a proposal, and how.
pub async fn fetch_vote_status<C>(
    contract: &C,
    proposal_id: ProposalId,
    viewer: Option<Address>,
) -> Result<VoteStatus>
where
    C: ProposalContract + ?Sized,
{
    let Some(viewer) = viewer else {
        return Ok(VoteStatus::default());
    };

    if !contract.has_user_voted(proposal_id, viewer).await? {
        return Ok(VoteStatus::default());
    }

    let is_like = contract.get_user_vote(proposal_id, viewer).await?;

    Ok(VoteStatus::voted(is_like))
}

/// Reads a single proposal fresh from the contract.
pub async fn fetch_proposal<C>(
    contract: &C,
    proposal_id: ProposalId,
    viewer: Option<Address>,
) -> Result<Proposal>
where
    C: ProposalContract + ?Sized,
{
    let raw = contract.get_proposal(proposal_id).await?;
    let status = fetch_vote_status(contract, proposal_id, viewer).await?;

    Ok(Proposal::from_raw(proposal_id, raw, status))
}

/// Reads every proposal ever submitted, ordered by id.
///
/// Reads are issued concurrently. If any of them fails the whole fetch fails;
/// a partial list is never returned.
pub async fn fetch_all<C>(contract: &C, viewer: Option<Address>) -> Result<Vec<Proposal>>
where
    C: ProposalContract + ?Sized,
{
    let count = contract.get_proposal_count().await?;
    debug!(count, ?viewer, "Fetching all proposals");

    try_join_all((0..count).map(|id| fetch_proposal(contract, id, viewer))).await
}

/// Reads the proposals submitted by `account`.
pub async fn fetch_user_proposals<C>(contract: &C, account: Address) -> Result<Vec<Proposal>>
where
    C: ProposalContract + ?Sized,
{
    let ids = contract.get_user_proposals(account).await?;
    debug!(%account, count = ids.len(), "Fetching user proposals");

    try_join_all(ids.into_iter().map(|id| fetch_proposal(contract, id, Some(account)))).await
}

/// Casts a vote as the contract handle's signer, then re-reads the proposal.
///
/// Tallies are never adjusted locally; the returned proposal is whatever the
/// contract reports after the transaction is included.
pub async fn vote<C>(
    contract: Option<&C>,
    gateway: Option<&ServiceClient>,
    proposal_id: ProposalId,
    is_like: bool,
) -> Result<VoteOutcome>
where
    C: ProposalContract + ?Sized,
{
    let contract = contract.ok_or(Error::NotConnected)?;
    let voter = contract.signer();

    if contract.has_user_voted(proposal_id, voter).await? {
        return Err(Error::AlreadyVoted { proposal_id });
    }

    contract.vote_proposal(proposal_id, is_like).await?;
    info!(proposal_id, %voter, is_like, "Vote cast");

    let proposal = read_back(contract, proposal_id, voter).await?;

    let sync_error = match gateway {
        Some(gateway) => gateway
            .update_vote(proposal_id, proposal.likes, proposal.dislikes)
            .await
            .err()
            .map(|err| {
                warn!(proposal_id, %err, "Failed to sync vote tallies");
                err.to_string()
            }),
        None => None,
    };

    Ok(VoteOutcome {
        proposal,
        sync_error,
    })
}

/// Submits a draft as the contract handle's signer, then re-reads the
/// created proposal.
pub async fn submit<C>(
    contract: Option<&C>,
    gateway: Option<&ServiceClient>,
    draft: &Draft,
) -> Result<SubmitOutcome>
where
    C: ProposalContract + ?Sized,
{
    let contract = contract.ok_or(Error::NotConnected)?;
    let (text, summary, category) = validate(draft)?;
    let submitter = contract.signer();

    let proposal_id = contract
        .submit_proposal(text, summary, category.as_str())
        .await?;
    info!(proposal_id, %submitter, %category, "Proposal submitted");

    let proposal = read_back(contract, proposal_id, submitter).await?;

    let sync_error = match gateway {
        Some(gateway) => gateway.store_proposal(&proposal).await.err().map(|err| {
            warn!(proposal_id, %err, "Failed to index proposal");
            err.to_string()
        }),
        None => None,
    };

    Ok(SubmitOutcome {
        proposal,
        sync_error,
    })
}

/// Reads a proposal right after a transaction on it went through.
async fn read_back<C>(contract: &C, proposal_id: ProposalId, account: Address) -> Result<Proposal>
where
    C: ProposalContract + ?Sized,
{
    fetch_proposal(contract, proposal_id, Some(account))
        .await
        .map_err(|err| {
            warn!(proposal_id, %err, "Transaction applied but reading it back failed");
            Error::ReadAfterWrite {
                proposal_id,
                source: Box::new(err),
            }
        })
}

fn validate(draft: &Draft) -> Result<(&str, &str, &Category)> {
    let text = draft.text.trim();
    if text.is_empty() {
        return Err(Error::InvalidProposal {
            reason: "text is required",
        });
    }

    let summary = draft.summary.trim();
    if summary.is_empty() {
        return Err(Error::InvalidProposal {
            reason: "summary is required",
        });
    }

    let Some(category) = &draft.category else {
        return Err(Error::InvalidProposal {
            reason: "category is required",
        });
    };

    Ok((text, summary, category))
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, assertor::*, test_case::test_case};

    fn draft(text: &str, summary: &str, category: Option<Category>) -> Draft {
        Draft {
            text: text.to_string(),
            summary: summary.to_string(),
            category,
            image: None,
        }
    }

    #[test_case(draft("", "summary", Some(Category::Governance)), "text is required"; "missing text")]
    #[test_case(draft("  \n", "summary", Some(Category::Governance)), "text is required"; "blank text")]
    #[test_case(draft("text", "", Some(Category::Governance)), "summary is required"; "missing summary")]
    #[test_case(draft("text", "summary", None), "category is required"; "missing category")]
    fn rejecting_incomplete_drafts(draft: Draft, expect: &'static str) {
        assert_that!(matches!(
            validate(&draft),
            Err(Error::InvalidProposal { reason }) if reason == expect
        ))
        .is_true();
    }

    #[test]
    fn validated_fields_are_trimmed() {
        let draft = draft(" Add bike lanes ", " Bike lanes on Main St. ", Some(Category::Transportation));
        let (text, summary, category) = validate(&draft).unwrap();

        assert_that!(text).is_equal_to("Add bike lanes");
        assert_that!(summary).is_equal_to("Bike lanes on Main St.");
        assert_that!(*category).is_equal_to(Category::Transportation);
    }
}
