use {
    crate::{Error, Result, ServiceConfig},
    civic_types::{
        AnswerResponse, ErrorResponse, MessageResponse, Proposal, ProposalId, QuestionRequest,
        SearchHit, StoredProposal, SummaryRequest, SummaryResponse, VoteUpdate, search_results,
    },
    reqwest::{Response, StatusCode},
    serde::{Serialize, de::DeserializeOwned},
    serde_json::Value,
    tracing::{debug, warn},
    url::Url,
};

/// Client of the AI service: summaries, semantic search, Q&A, and the
/// search index kept in sync with the chain.
///
/// Every call is sent exactly once. Failures are returned to the caller, who
/// decides whether to let the user try again.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    inner: reqwest::Client,
    endpoint: Url,
    sync_endpoint: Url,
}

impl ServiceClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;

        Ok(Self {
            inner: reqwest::Client::new(),
            sync_endpoint: endpoint.clone(),
            endpoint,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        let sync_endpoint = match &config.sync_endpoint {
            Some(sync_endpoint) => Url::parse(sync_endpoint)?,
            None => endpoint.clone(),
        };

        Ok(Self {
            inner: reqwest::Client::builder()
                .timeout(config.timeout())
                .build()?,
            endpoint,
            sync_endpoint,
        })
    }

    /// Sends vote tally updates to a different host than the other calls.
    pub fn with_sync_endpoint(mut self, sync_endpoint: &str) -> Result<Self> {
        self.sync_endpoint = Url::parse(sync_endpoint)?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn generate_summary(&self, text: &str) -> Result<String> {
        let text = non_empty(text, "proposal text")?;

        let response: SummaryResponse = self
            .post(&self.endpoint, &["api", "generate_summary"], &SummaryRequest {
                text: text.to_string(),
            })
            .await?;

        Ok(response.summary)
    }

    /// Semantic search over the indexed proposals. Results that are not
    /// objects are dropped; everything else is normalized.
    pub async fn search_proposals(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query = non_empty(query, "search query")?;

        let url = join(&self.endpoint, &["api", "search_proposals", query])?;
        debug!(%url, "Searching proposals");

        let response = self.inner.get(url).send().await?;
        let body: Value = parse(response).await?;

        let hits = search_results(&body)
            .into_iter()
            .filter_map(|result| {
                result
                    .inspect_err(|err| warn!(%err, "Dropping malformed search result"))
                    .ok()
            })
            .collect();

        Ok(hits)
    }

    pub async fn ask_question(&self, query: &str) -> Result<String> {
        let query = non_empty(query, "question")?;

        let response: AnswerResponse = self
            .post(&self.endpoint, &["api", "ask_proposal"], &QuestionRequest {
                query: query.to_string(),
            })
            .await?;

        Ok(response.answer)
    }

    /// Pushes the latest on-chain tallies of a proposal to the search index.
    pub async fn update_vote(
        &self,
        proposal_id: ProposalId,
        likes: u64,
        dislikes: u64,
    ) -> Result<MessageResponse> {
        self.post(&self.sync_endpoint, &["api", "update_vote"], &VoteUpdate {
            proposal_id,
            likes,
            dislikes,
        })
        .await
    }

    /// Adds a newly submitted proposal to the search index.
    pub async fn store_proposal(&self, proposal: &Proposal) -> Result<MessageResponse> {
        self.post(
            &self.endpoint,
            &["api", "store_proposal"],
            &StoredProposal::from(proposal),
        )
        .await
    }

    async fn post<B, R>(&self, base: &Url, segments: &[&str], body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = join(base, segments)?;
        debug!(%url, "Sending service request");

        let response = self.inner.post(url).json(body).send().await?;

        parse(response).await
    }
}

fn non_empty<'a>(input: &'a str, what: &'static str) -> Result<&'a str> {
    let input = input.trim();

    if input.is_empty() {
        return Err(Error::EmptyInput { what });
    }

    Ok(input)
}

/// Appends path segments to `base`, percent-encoding each of them.
fn join(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();

    url.path_segments_mut()
        .map_err(|_| Error::Service(format!("endpoint `{base}` cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

async fn parse<R>(response: Response) -> Result<R>
where
    R: DeserializeOwned,
{
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Service(describe_failure(status, &body)));
    }

    Ok(response.json().await?)
}

/// The service reports failures as `{"detail": "..."}`; fall back to the raw
/// body for anything else.
fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { detail }) => format!("{status}: {detail}"),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{status}: {}", body.trim()),
    }
}

// ----------------------------------- tests -----------------------------------
