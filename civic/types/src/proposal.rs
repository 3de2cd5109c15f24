use {
    crate::Category,
    alloy_primitives::Address,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// Identifier assigned by the contract: 0-based, dense and append-only.
pub type ProposalId = u64;

/// The fields `getProposal` returns, in contract order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProposal {
    pub text: String,
    pub summary: String,
    pub category: String,
    pub submitter: Address,
    /// Block timestamp, in seconds.
    pub timestamp: u64,
    pub likes: u64,
    pub dislikes: u64,
}

/// Whether a given account has voted on a proposal, and how.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VoteStatus {
    pub has_voted: bool,
    pub user_vote: Option<bool>,
}

impl VoteStatus {
    pub const fn voted(is_like: bool) -> Self {
        Self {
            has_voted: true,
            user_vote: Some(is_like),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    pub text: String,
    pub summary: String,
    pub category: Category,
    pub submitter: Address,
    pub timestamp: DateTime<Utc>,
    pub likes: u64,
    pub dislikes: u64,
    /// Relative to the viewing account. `false` when there is no viewer.
    pub has_voted: bool,
    pub user_vote: Option<bool>,
}

impl Proposal {
    pub fn from_raw(id: ProposalId, raw: RawProposal, status: VoteStatus) -> Self {
        Self {
            id,
            text: raw.text,
            summary: raw.summary,
            category: Category::from(raw.category),
            submitter: raw.submitter,
            timestamp: timestamp_from_secs(raw.timestamp),
            likes: raw.likes,
            dislikes: raw.dislikes,
            has_voted: status.has_voted,
            user_vote: status.user_vote,
        }
    }

    /// Total number of votes cast, used to rank proposals by engagement.
    pub fn engagement(&self) -> u64 {
        self.likes.saturating_add(self.dislikes)
    }

    pub fn approval_rate(&self) -> f64 {
        approval_rate(self.likes, self.dislikes)
    }

    pub fn vote_status(&self) -> VoteStatus {
        VoteStatus {
            has_voted: self.has_voted,
            user_vote: self.user_vote,
        }
    }
}

/// `likes / (likes + dislikes)`, or 0 when nobody has voted.
pub fn approval_rate(likes: u64, dislikes: u64) -> f64 {
    let total = likes as f64 + dislikes as f64;

    if total == 0.0 {
        return 0.0;
    }

    likes as f64 / total
}

/// Timestamps past the range `chrono` can represent collapse to the epoch.
pub fn timestamp_from_secs(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_default()
}

// ----------------------------------- tests -----------------------------------
