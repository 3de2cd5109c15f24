use {civic_types::ProposalId, thiserror::Error};

/// How an error should be surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No wallet, rejected prompt, wrong chain or no session. Shown as a
    /// blocking prompt.
    Connectivity,
    /// The transaction was not applied. Local state stays untouched until
    /// the next read.
    Transaction,
    /// A contract read failed.
    Read,
    /// The AI service failed. The user may retry by hand.
    Service,
    /// Configuration or local persistence failed.
    Local,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("no wallet provider found; install a browser wallet to continue")]
    NoWallet,

    #[error("the wallet declined the account access request")]
    UserRejected,

    #[error("wallet is on chain {actual}, expecting chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("no wallet connected")]
    NotConnected,

    #[error("account has already voted on proposal {proposal_id}")]
    AlreadyVoted { proposal_id: ProposalId },

    #[error("invalid proposal: {reason}")]
    InvalidProposal { reason: &'static str },

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("contract read failed: {0}")]
    Read(String),

    /// The transaction is on chain; only reading the result back failed.
    /// Refetch instead of sending it again.
    #[error("transaction on proposal {proposal_id} was applied, but reading it back failed: {source}")]
    ReadAfterWrite {
        proposal_id: ProposalId,
        source: Box<Error>,
    },

    #[error("service request failed: {0}")]
    Service(String),

    #[error("{what} must not be empty")]
    EmptyInput { what: &'static str },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoWallet
            | Error::UserRejected
            | Error::ChainMismatch { .. }
            | Error::NotConnected => ErrorKind::Connectivity,
            Error::AlreadyVoted { .. } | Error::InvalidProposal { .. } | Error::Transaction(_) => {
                ErrorKind::Transaction
            },
            Error::Read(_) | Error::ReadAfterWrite { .. } => ErrorKind::Read,
            Error::Service(_) | Error::EmptyInput { .. } | Error::Http(_) => ErrorKind::Service,
            Error::Config(_) | Error::Url(_) | Error::Io(_) | Error::Json(_) => ErrorKind::Local,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
