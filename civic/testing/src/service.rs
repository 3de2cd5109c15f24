use {
    axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        routing::{get, post},
        serve,
    },
    civic_types::{
        AnswerResponse, ErrorResponse, MessageResponse, QuestionRequest, StoredProposal,
        SummaryRequest, SummaryResponse, VoteUpdate,
    },
    serde_json::{Value, json},
    std::{
        io,
        sync::{Arc, Mutex, MutexGuard, PoisonError},
    },
    tokio::{net::TcpListener, task::JoinHandle},
    tracing::debug,
};

type Reply<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Debug)]
struct Inner {
    failure: Option<(StatusCode, String)>,
    search_body: Value,
    summaries: Vec<String>,
    searches: Vec<String>,
    questions: Vec<String>,
    vote_updates: Vec<VoteUpdate>,
    stored: Vec<StoredProposal>,
}

impl Inner {
    fn check(&self) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
        match &self.failure {
            Some((status, detail)) => Err((*status, Json(ErrorResponse {
                detail: detail.clone(),
            }))),
            None => Ok(()),
        }
    }
}

/// Everything the mock service received and will respond with.
#[derive(Debug, Clone)]
pub struct MockServiceState {
    inner: Arc<Mutex<Inner>>,
}

impl MockServiceState {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                failure: None,
                search_body: json!({ "results": [] }),
                summaries: Vec::new(),
                searches: Vec::new(),
                questions: Vec::new(),
                vote_updates: Vec::new(),
                stored: Vec::new(),
            })),
        }
    }

    /// Every endpoint responds with `status` and `{"detail": detail}` until
    /// `recover` is called.
    pub fn fail_with(&self, status: StatusCode, detail: &str) {
        self.lock().failure = Some((status, detail.to_string()));
    }

    pub fn recover(&self) {
        self.lock().failure = None;
    }

    /// The raw body returned by the search endpoint.
    pub fn set_search_body(&self, body: Value) {
        self.lock().search_body = body;
    }

    pub fn summaries(&self) -> Vec<String> {
        self.lock().summaries.clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.lock().searches.clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.lock().questions.clone()
    }

    pub fn vote_updates(&self) -> Vec<VoteUpdate> {
        self.lock().vote_updates.clone()
    }

    pub fn stored(&self) -> Vec<StoredProposal> {
        self.lock().stored.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The AI service's REST API, served on an ephemeral local port.
#[derive(Debug)]
pub struct MockService {
    pub url: String,
    pub state: MockServiceState,
    handle: JoinHandle<()>,
}

impl MockService {
    pub async fn start() -> io::Result<Self> {
        let state = MockServiceState::new();

        let app = Router::new()
            .route("/api/generate_summary", post(generate_summary))
            .route("/api/search_proposals/{query}", get(search_proposals))
            .route("/api/ask_proposal", post(ask_proposal))
            .route("/api/update_vote", post(update_vote))
            .route("/api/store_proposal", post(store_proposal))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", listener.local_addr()?);

        let handle = tokio::spawn(async move {
            if let Err(err) = serve(listener, app.into_make_service()).await {
                debug!(%err, "Mock service stopped");
            }
        });

        Ok(Self { url, state, handle })
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn generate_summary(
    State(state): State<MockServiceState>,
    Json(request): Json<SummaryRequest>,
) -> Reply<SummaryResponse> {
    let mut inner = state.lock();
    inner.check()?;

    let summary = format!("Summary: {}", request.text);
    inner.summaries.push(request.text);

    Ok(Json(SummaryResponse { summary }))
}

async fn search_proposals(
    State(state): State<MockServiceState>,
    Path(query): Path<String>,
) -> Reply<Value> {
    let mut inner = state.lock();
    inner.check()?;

    inner.searches.push(query);

    Ok(Json(inner.search_body.clone()))
}

async fn ask_proposal(
    State(state): State<MockServiceState>,
    Json(request): Json<QuestionRequest>,
) -> Reply<AnswerResponse> {
    let mut inner = state.lock();
    inner.check()?;

    let answer = format!("Answer to: {}", request.query);
    inner.questions.push(request.query);

    Ok(Json(AnswerResponse { answer }))
}

async fn update_vote(
    State(state): State<MockServiceState>,
    Json(update): Json<VoteUpdate>,
) -> Reply<MessageResponse> {
    let mut inner = state.lock();
    inner.check()?;

    inner.vote_updates.push(update);

    Ok(Json(MessageResponse {
        message: format!("Vote updated for proposal {}", update.proposal_id),
    }))
}

async fn store_proposal(
    State(state): State<MockServiceState>,
    Json(proposal): Json<StoredProposal>,
) -> Reply<MessageResponse> {
    let mut inner = state.lock();
    inner.check()?;

    let message = format!("Proposal {} stored", proposal.id);
    inner.stored.push(proposal);

    Ok(Json(MessageResponse { message }))
}
