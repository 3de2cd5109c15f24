use {
    crate::{Error, Result},
    civic_types::{Overview, Proposal, ProposalFilter},
    tracing::debug,
};

/// Proof that a fetch was started under a given generation of the board and
/// of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    session_epoch: u64,
}

#[derive(Debug)]
pub enum Outcome {
    Updated,
    /// The fetch failed and the board was cleared.
    Failed(Error),
    /// A newer fetch was started, the board was invalidated, or the session
    /// changed identity after this one began. The result was discarded.
    Stale,
}

/// The proposal list shown to the user.
///
/// Holds the last complete fetch. A fetch is discarded when it completes if
/// a newer one began, the board was invalidated, or the session epoch moved
/// on (`Session::epoch`), so results read for a previous account or chain
/// never reach the list.
#[derive(Debug, Default)]
pub struct ProposalBoard {
    epoch: u64,
    proposals: Vec<Proposal>,
}

impl ProposalBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `session_epoch` is the session's epoch at the time the fetch starts.
    pub fn begin(&mut self, session_epoch: u64) -> Ticket {
        self.epoch += 1;
        Ticket {
            epoch: self.epoch,
            session_epoch,
        }
    }

    /// Voids every ticket issued so far, e.g. when the session changes or
    /// the view goes away.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
    }

    /// `session_epoch` is the session's epoch now, when the fetch completed.
    pub fn apply(
        &mut self,
        ticket: Ticket,
        session_epoch: u64,
        result: Result<Vec<Proposal>>,
    ) -> Outcome {
        if ticket.epoch != self.epoch {
            debug!(ticket = ticket.epoch, current = self.epoch, "Discarding superseded fetch");
            return Outcome::Stale;
        }

        if ticket.session_epoch != session_epoch {
            debug!(
                ticket = ticket.session_epoch,
                current = session_epoch,
                "Discarding fetch from a previous session"
            );
            return Outcome::Stale;
        }

        match result {
            Ok(proposals) => {
                self.proposals = proposals;
                Outcome::Updated
            },
            Err(err) => {
                self.proposals.clear();
                Outcome::Failed(err)
            },
        }
    }

    /// Swaps in a freshly read proposal, e.g. after a vote. Returns `false`
    /// and leaves the board untouched if it does not hold that proposal; the
    /// list only grows through a full fetch, so ids stay dense.
    pub fn replace(&mut self, proposal: Proposal) -> bool {
        match self.proposals.iter_mut().find(|p| p.id == proposal.id) {
            Some(existing) => {
                *existing = proposal;
                true
            },
            None => false,
        }
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn filtered(&self, filter: &ProposalFilter) -> Vec<&Proposal> {
        filter.apply(&self.proposals)
    }

    pub fn overview(&self, limit: usize) -> Overview {
        Overview::compute(&self.proposals, limit)
    }
}

// ----------------------------------- tests -----------------------------------
