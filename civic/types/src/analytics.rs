//! Aggregates over a fetched proposal set.
//!
//! Everything here is a pure function of its input slice. Callers recompute
//! after every fetch instead of keeping derived values around.

use {
    crate::{Category, Proposal},
    alloy_primitives::Address,
    chrono::{Days, NaiveDate},
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub proposals: usize,
    pub votes: u64,
    pub likes: u64,
    pub dislikes: u64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubmitterEngagement {
    pub proposals: usize,
    pub votes: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub proposals: usize,
    pub votes: u64,
}

/// The dashboard summary of a proposal set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Overview {
    pub totals: Totals,
    pub average_approval_rate: f64,
    pub categories: BTreeMap<Category, usize>,
    pub top: Vec<Proposal>,
    pub recent: Vec<Proposal>,
}

impl Overview {
    pub fn compute(proposals: &[Proposal], limit: usize) -> Self {
        Self {
            totals: totals(proposals),
            average_approval_rate: average_approval_rate(proposals),
            categories: category_counts(proposals),
            top: top_by_engagement(proposals, limit)
                .into_iter()
                .cloned()
                .collect(),
            recent: most_recent(proposals, limit).into_iter().cloned().collect(),
        }
    }
}

pub fn totals(proposals: &[Proposal]) -> Totals {
    proposals.iter().fold(
        Totals {
            proposals: proposals.len(),
            ..Default::default()
        },
        |mut acc, proposal| {
            acc.likes = acc.likes.saturating_add(proposal.likes);
            acc.dislikes = acc.dislikes.saturating_add(proposal.dislikes);
            acc.votes = acc.votes.saturating_add(proposal.engagement());
            acc
        },
    )
}

/// Mean approval rate over the proposals that received at least one vote.
/// Proposals nobody voted on would otherwise drag the mean towards zero.
pub fn average_approval_rate(proposals: &[Proposal]) -> f64 {
    let (sum, count) = proposals
        .iter()
        .filter(|proposal| proposal.engagement() > 0)
        .fold((0.0, 0usize), |(sum, count), proposal| {
            (sum + proposal.approval_rate(), count + 1)
        });

    if count == 0 {
        return 0.0;
    }

    sum / count as f64
}

pub fn category_counts(proposals: &[Proposal]) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();

    for proposal in proposals {
        *counts.entry(proposal.category.clone()).or_default() += 1;
    }

    counts
}

/// The `limit` proposals with the most votes. Ties keep id order.
pub fn top_by_engagement(proposals: &[Proposal], limit: usize) -> Vec<&Proposal> {
    let mut sorted = proposals.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| b.engagement().cmp(&a.engagement()));
    sorted.truncate(limit);
    sorted
}

/// The `limit` newest proposals.
pub fn most_recent(proposals: &[Proposal], limit: usize) -> Vec<&Proposal> {
    let mut sorted = proposals.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted.truncate(limit);
    sorted
}

pub fn submitter_engagement(proposals: &[Proposal]) -> BTreeMap<Address, SubmitterEngagement> {
    let mut engagement = BTreeMap::<_, SubmitterEngagement>::new();

    for proposal in proposals {
        let entry = engagement.entry(proposal.submitter).or_default();
        entry.proposals += 1;
        entry.votes = entry.votes.saturating_add(proposal.engagement());
    }

    engagement
}

/// One entry per calendar day (UTC) for the `days` days ending at `today`,
/// oldest first.
pub fn daily_activity(proposals: &[Proposal], today: NaiveDate, days: u64) -> Vec<DailyActivity> {
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| {
            let (count, votes) = proposals
                .iter()
                .filter(|proposal| proposal.timestamp.date_naive() == date)
                .fold((0, 0_u64), |(count, votes), proposal| {
                    (count + 1, votes.saturating_add(proposal.engagement()))
                });

            DailyActivity {
                date,
                proposals: count,
                votes,
            }
        })
        .collect()
}

// ----------------------------------- tests -----------------------------------
