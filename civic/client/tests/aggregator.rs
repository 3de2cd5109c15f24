use {
    assertor::*,
    axum::http::StatusCode,
    civic_client::{
        ChainConfig, Error, ErrorKind, Outcome, ProposalBoard, ServiceClient, Session, fetch_all,
        fetch_proposal, fetch_user_proposals, submit, vote,
    },
    civic_testing::{MockChain, MockContract, MockService, MockWallet, setup_tracing_subscriber},
    civic_types::{Address, Category, Draft, VoteUpdate},
};

fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

fn carol() -> Address {
    Address::repeat_byte(0xc0)
}

/// A chain holding two proposals, (3 likes, 1 dislike) and (0, 0), and a
/// session connected as alice.
async fn setup() -> (MockChain, Session<MockWallet>) {
    setup_tracing_subscriber(tracing::Level::DEBUG);

    let chain = MockChain::new();
    chain.seed(carol(), "Add bike lanes on Main St.", Category::Transportation, 3, 1);
    chain.seed(carol(), "Host a summer festival", Category::EventsAndCulture, 0, 0);

    let wallet = MockWallet::new(chain.clone(), vec![alice()]).authorized();
    let mut session = Session::new(Some(wallet), &ChainConfig::default());
    session.restore().await.unwrap();

    (chain, session)
}

fn draft() -> Draft {
    Draft {
        text: "Extend library hours on weekends".to_string(),
        summary: "Longer weekend library hours.".to_string(),
        category: Some(Category::Other("Education".to_string())),
        image: None,
    }
}

#[tokio::test]
async fn fetching_all_proposals() {
    let (_, session) = setup().await;

    let proposals = fetch_all(session.require_contract().unwrap(), session.account())
        .await
        .unwrap();

    let ids = proposals.iter().map(|p| p.id).collect::<Vec<_>>();
    assert_that!(ids).is_equal_to(vec![0, 1]);
    assert_that!(proposals[0].category.clone()).is_equal_to(Category::Transportation);
    assert_that!(proposals[0].submitter).is_equal_to(carol());

    let mut board = ProposalBoard::new();
    let ticket = board.begin(session.epoch());
    board.apply(ticket, session.epoch(), Ok(proposals));

    let overview = board.overview(5);
    assert_that!(overview.totals.proposals).is_equal_to(2);
    assert_that!(overview.totals.votes).is_equal_to(4);
    assert_that!(overview.average_approval_rate).is_equal_to(0.75);
}

#[tokio::test]
async fn one_failed_read_fails_the_whole_fetch() {
    let (chain, session) = setup().await;
    let contract = session.require_contract().unwrap();

    chain.fail_reads_of(1);
    let err = fetch_all(contract, session.account()).await.unwrap_err();
    assert_that!(err.kind()).is_equal_to(ErrorKind::Read);

    chain.heal();
    chain.fail_count();
    let err = fetch_all(contract, session.account()).await.unwrap_err();
    assert_that!(matches!(err, Error::Read(_))).is_true();

    chain.heal();
    assert_that!(fetch_all(contract, session.account()).await.unwrap().len()).is_equal_to(2);
}

#[tokio::test]
async fn voting_rereads_from_chain() {
    let (chain, session) = setup().await;

    let outcome = vote(session.contract(), None, 1, true).await.unwrap();

    assert_that!(outcome.proposal.likes).is_equal_to(1);
    assert_that!(outcome.proposal.dislikes).is_equal_to(0);
    assert_that!(outcome.proposal.has_voted).is_true();
    assert_that!(outcome.proposal.user_vote).is_equal_to(Some(true));
    assert_that!(outcome.sync_error).is_none();
    assert_that!(chain.tallies(1)).is_equal_to(Some((1, 0)));
}

#[tokio::test]
async fn voting_twice_is_refused() {
    let (chain, session) = setup().await;

    vote(session.contract(), None, 0, false).await.unwrap();
    let err = vote(session.contract(), None, 0, true).await.unwrap_err();

    assert_that!(matches!(err, Error::AlreadyVoted { proposal_id: 0 })).is_true();
    assert_that!(err.kind()).is_equal_to(ErrorKind::Transaction);
    assert_that!(chain.tallies(0)).is_equal_to(Some((3, 2)));

    let proposal = fetch_proposal(session.require_contract().unwrap(), 0, session.account())
        .await
        .unwrap();
    assert_that!(proposal.user_vote).is_equal_to(Some(false));
}

#[tokio::test]
async fn voting_without_session() {
    let err = vote::<MockContract>(None, None, 0, true).await.unwrap_err();

    assert_that!(matches!(err, Error::NotConnected)).is_true();
}

#[tokio::test]
async fn vote_status_is_relative_to_the_viewer() {
    let (_, session) = setup().await;
    let contract = session.require_contract().unwrap();

    vote(Some(contract), None, 1, false).await.unwrap();

    let anonymous = fetch_all(contract, None).await.unwrap();
    assert_that!(anonymous[1].has_voted).is_false();
    assert_that!(anonymous[1].user_vote).is_none();

    let own = fetch_all(contract, session.account()).await.unwrap();
    assert_that!(own[1].has_voted).is_true();
    assert_that!(own[1].user_vote).is_equal_to(Some(false));
}

#[tokio::test]
async fn vote_tallies_are_synced() {
    let (_, session) = setup().await;
    let service = MockService::start().await.unwrap();
    let gateway = ServiceClient::new(&service.url).unwrap();

    let outcome = vote(session.contract(), Some(&gateway), 0, true).await.unwrap();

    assert_that!(outcome.is_degraded()).is_false();
    assert_that!(service.state.vote_updates()).is_equal_to(vec![VoteUpdate {
        proposal_id: 0,
        likes: 4,
        dislikes: 1,
    }]);
}

#[tokio::test]
async fn failed_sync_keeps_the_vote() {
    let (chain, session) = setup().await;
    let service = MockService::start().await.unwrap();
    service
        .state
        .fail_with(StatusCode::INTERNAL_SERVER_ERROR, "index unavailable");
    let gateway = ServiceClient::new(&service.url).unwrap();

    let outcome = vote(session.contract(), Some(&gateway), 1, true).await.unwrap();

    assert_that!(outcome.is_degraded()).is_true();
    assert_that!(outcome.sync_error.unwrap().contains("index unavailable")).is_true();
    assert_that!(outcome.proposal.likes).is_equal_to(1);
    assert_that!(chain.tallies(1)).is_equal_to(Some((1, 0)));
}

#[tokio::test]
async fn submitting_a_draft() {
    let (chain, session) = setup().await;
    let service = MockService::start().await.unwrap();
    let gateway = ServiceClient::new(&service.url).unwrap();

    let outcome = submit(session.contract(), Some(&gateway), &draft()).await.unwrap();

    assert_that!(outcome.is_degraded()).is_false();
    assert_that!(outcome.proposal.id).is_equal_to(2);
    assert_that!(outcome.proposal.submitter).is_equal_to(alice());
    assert_that!(outcome.proposal.category.clone())
        .is_equal_to(Category::Other("Education".to_string()));
    assert_that!(chain.proposal_count()).is_equal_to(3);

    let stored = service.state.stored();
    assert_that!(stored.len()).is_equal_to(1);
    assert_that!(stored[0].id).is_equal_to(2);
    assert_that!(stored[0].submitter.clone()).is_equal_to(alice().to_checksum(None));

    let own = fetch_user_proposals(session.require_contract().unwrap(), alice())
        .await
        .unwrap();
    assert_that!(own.iter().map(|p| p.id).collect::<Vec<_>>()).is_equal_to(vec![2]);
}

#[tokio::test]
async fn incomplete_draft_is_not_submitted() {
    let (chain, session) = setup().await;

    let incomplete = Draft {
        category: None,
        ..draft()
    };
    let err = submit(session.contract(), None, &incomplete).await.unwrap_err();

    assert_that!(matches!(err, Error::InvalidProposal { .. })).is_true();
    assert_that!(chain.proposal_count()).is_equal_to(2);
}

#[tokio::test]
async fn fetch_started_before_account_switch_is_discarded() {
    setup_tracing_subscriber(tracing::Level::DEBUG);

    let chain = MockChain::new();
    chain.seed(carol(), "Add bike lanes on Main St.", Category::Transportation, 3, 1);

    let wallet = MockWallet::new(chain.clone(), vec![alice(), bob()]).authorized();
    let mut session = Session::new(Some(wallet.clone()), &ChainConfig::default());
    session.restore().await.unwrap();
    vote(session.contract(), None, 0, true).await.unwrap();

    let mut board = ProposalBoard::new();
    let ticket = board.begin(session.epoch());
    let result = fetch_all(session.require_contract().unwrap(), session.account()).await;

    wallet.switch_accounts(vec![bob()]);
    session.sync_events().await.unwrap();

    let outcome = board.apply(ticket, session.epoch(), result);

    assert_that!(matches!(outcome, Outcome::Stale)).is_true();
    assert_that!(board.proposals().is_empty()).is_true();

    // A fetch for the new account goes through and carries bob's view.
    let ticket = board.begin(session.epoch());
    let result = fetch_all(session.require_contract().unwrap(), session.account()).await;
    assert_that!(matches!(board.apply(ticket, session.epoch(), result), Outcome::Updated))
        .is_true();
    assert_that!(board.proposals()[0].has_voted).is_false();
}

#[tokio::test]
async fn failed_read_after_vote_reports_applied_vote() {
    let (chain, session) = setup().await;
    chain.fail_reads_of(1);

    let err = vote(session.contract(), None, 1, true).await.unwrap_err();

    assert_that!(matches!(err, Error::ReadAfterWrite { proposal_id: 1, .. })).is_true();
    assert_that!(err.kind()).is_equal_to(ErrorKind::Read);
    assert_that!(chain.tallies(1)).is_equal_to(Some((1, 0)));

    // Sending it again is refused, the vote already counts.
    chain.heal();
    let err = vote(session.contract(), None, 1, true).await.unwrap_err();
    assert_that!(matches!(err, Error::AlreadyVoted { proposal_id: 1 })).is_true();
}

#[tokio::test]
async fn failed_read_after_submit_reports_applied_submission() {
    let (chain, session) = setup().await;
    let service = MockService::start().await.unwrap();
    let gateway = ServiceClient::new(&service.url).unwrap();
    chain.fail_reads_of(2);

    let err = submit(session.contract(), Some(&gateway), &draft()).await.unwrap_err();

    assert_that!(matches!(err, Error::ReadAfterWrite { proposal_id: 2, .. })).is_true();
    assert_that!(err.kind()).is_equal_to(ErrorKind::Read);
    assert_that!(chain.proposal_count()).is_equal_to(3);
    assert_that!(service.state.stored().is_empty()).is_true();
}
