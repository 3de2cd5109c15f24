//! Request and response bodies of the AI service's REST API.

use {
    crate::{Proposal, ProposalId},
    serde::{Deserialize, Serialize},
    serde_with::skip_serializing_none,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub query: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteUpdate {
    pub proposal_id: ProposalId,
    pub likes: u64,
    pub dislikes: u64,
}

/// A proposal as indexed by the search service.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredProposal {
    pub id: ProposalId,
    pub text: String,
    pub summary: String,
    pub category: String,
    pub submitter: String,
    pub timestamp: String,
    pub likes: u64,
    pub dislikes: u64,
    pub has_voted: Option<bool>,
    pub user_vote: Option<bool>,
}

impl From<&Proposal> for StoredProposal {
    fn from(proposal: &Proposal) -> Self {
        Self {
            id: proposal.id,
            text: proposal.text.clone(),
            summary: proposal.summary.clone(),
            category: proposal.category.to_string(),
            submitter: proposal.submitter.to_checksum(None),
            timestamp: proposal.timestamp.to_rfc3339(),
            likes: proposal.likes,
            dislikes: proposal.dislikes,
            has_voted: Some(proposal.has_voted),
            user_vote: proposal.user_vote,
        }
    }
}

/// Generic acknowledgement returned by the write endpoints.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// The body the service sends alongside a non-2xx status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub detail: String,
}

// ----------------------------------- tests -----------------------------------
