use {
    crate::{Category, Proposal},
    serde::{Deserialize, Serialize},
    std::cmp::Ordering,
};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    MostLiked,
    MostVoted,
    ApprovalRate,
}

impl SortBy {
    fn compare(self, a: &Proposal, b: &Proposal) -> Ordering {
        match self {
            SortBy::Newest => b.timestamp.cmp(&a.timestamp),
            SortBy::Oldest => a.timestamp.cmp(&b.timestamp),
            SortBy::MostLiked => b.likes.cmp(&a.likes),
            SortBy::MostVoted => b.engagement().cmp(&a.engagement()),
            SortBy::ApprovalRate => b.approval_rate().total_cmp(&a.approval_rate()),
        }
    }
}

/// Selects and orders proposals for a list view.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ProposalFilter {
    /// `None` matches every category.
    pub category: Option<Category>,
    /// Case-insensitive substring matched against text, summary and category.
    pub query: String,
    pub sort_by: SortBy,
}

impl ProposalFilter {
    pub fn matches(&self, proposal: &Proposal) -> bool {
        if let Some(category) = &self.category {
            if proposal.category != *category {
                return false;
            }
        }

        let query = self.query.trim().to_lowercase();

        query.is_empty()
            || proposal.text.to_lowercase().contains(&query)
            || proposal.summary.to_lowercase().contains(&query)
            || proposal.category.as_str().to_lowercase().contains(&query)
    }

    pub fn apply<'a>(&self, proposals: &'a [Proposal]) -> Vec<&'a Proposal> {
        let mut selected = proposals
            .iter()
            .filter(|proposal| self.matches(proposal))
            .collect::<Vec<_>>();

        selected.sort_by(|a, b| self.sort_by.compare(a, b));
        selected
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{Address, RawProposal, VoteStatus},
        assertor::*,
        test_case::test_case,
    };

    fn proposals() -> Vec<Proposal> {
        [
            ("Repave the ring road", "Transportation", 100, 1, 1),
            ("Plant trees along the river", "Environment", 300, 4, 0),
            ("Night bus routes", "Transportation", 200, 2, 6),
            ("Open data portal", "Governance", 400, 0, 0),
        ]
        .into_iter()
        .enumerate()
        .map(|(id, (text, category, timestamp, likes, dislikes))| {
            Proposal::from_raw(
                id as u64,
                RawProposal {
                    text: text.to_string(),
                    summary: String::new(),
                    category: category.to_string(),
                    submitter: Address::ZERO,
                    timestamp,
                    likes,
                    dislikes,
                },
                VoteStatus::default(),
            )
        })
        .collect()
    }

    #[test_case(SortBy::Newest, vec![3, 1, 2, 0]; "newest first")]
    #[test_case(SortBy::Oldest, vec![0, 2, 1, 3]; "oldest first")]
    #[test_case(SortBy::MostLiked, vec![1, 2, 0, 3]; "most liked")]
    #[test_case(SortBy::MostVoted, vec![2, 1, 0, 3]; "most voted")]
    #[test_case(SortBy::ApprovalRate, vec![1, 0, 2, 3]; "highest approval")]
    fn sorting_proposals(sort_by: SortBy, expect: Vec<u64>) {
        let proposals = proposals();
        let filter = ProposalFilter {
            sort_by,
            ..Default::default()
        };

        let ids = filter
            .apply(&proposals)
            .into_iter()
            .map(|p| p.id)
            .collect::<Vec<_>>();

        assert_that!(ids).is_equal_to(expect);
    }

    #[test_case(Some(Category::Transportation), "", vec![2, 0]; "by category")]
    #[test_case(None, "RIVER", vec![1]; "by text ignoring case")]
    #[test_case(None, "governance", vec![3]; "by category label")]
    #[test_case(Some(Category::Transportation), "bus", vec![2]; "by category and text")]
    #[test_case(Some(Category::PublicSafety), "", vec![]; "no match")]
    fn filtering_proposals(category: Option<Category>, query: &str, expect: Vec<u64>) {
        let proposals = proposals();
        let filter = ProposalFilter {
            category,
            query: query.to_string(),
            sort_by: SortBy::Newest,
        };

        let ids = filter
            .apply(&proposals)
            .into_iter()
            .map(|p| p.id)
            .collect::<Vec<_>>();

        assert_that!(ids).is_equal_to(expect);
    }
}
