//! Query resolution.
//!
//! [`Gateway::resolve`] validates a query, runs the configured
//! [`Pipeline`], assembles the `{summary, sources, query}` envelope and hands
//! the exchange to the history recorder without waiting for it.
//!
//! ## Failure policy
//!
//! - An empty query fails before any provider is called.
//! - A failing search or retrieval call fails the request.
//! - A failing generation call *after* a successful search degrades to a
//!   numbered listing of the search results.

use std::sync::Arc;
use std::time::Instant;

use touchline_search::normalize::{no_results_citation, normalize_results, placeholder_citations};
use touchline_search::{SearchClient, SourceCitation};

use crate::config::{GatewayConfig, SamplingConfig};
use crate::error::{GatewayError, QUERY_REQUIRED, Result};
use crate::history::{HistoryRecord, HistoryRecorder};
use crate::mode::ResolutionMode;
use crate::prompt::{Prompt, fallback_summary};
use crate::providers::{RetrievalClient, TextGenerator, build_generator};
use crate::types::{ClientMetadata, SearchRequest, SearchResponse};

/// Provider clients for the active [`ResolutionMode`].
#[derive(Clone)]
pub enum Pipeline {
    DirectGeneration {
        generator: Arc<dyn TextGenerator>,
    },
    SearchThenSummarize {
        search: SearchClient,
        generator: Arc<dyn TextGenerator>,
    },
    SearchOnly {
        search: SearchClient,
    },
    DocumentRetrieval {
        retrieval: RetrievalClient,
    },
}

impl Pipeline {
    /// Build the clients for `mode` from `config`.
    pub fn from_config(config: &GatewayConfig, mode: ResolutionMode) -> Result<Self> {
        let search = || -> Result<SearchClient> {
            let search = config
                .search
                .clone()
                .ok_or_else(|| GatewayError::Configuration("search provider not configured".into()))?;
            Ok(SearchClient::new(search)?)
        };
        let generator = || -> Result<Arc<dyn TextGenerator>> {
            let generation = config.generation.as_ref().ok_or_else(|| {
                GatewayError::Configuration("generation provider not configured".into())
            })?;
            build_generator(generation)
        };

        Ok(match mode {
            ResolutionMode::DirectGeneration => Self::DirectGeneration {
                generator: generator()?,
            },
            ResolutionMode::SearchThenSummarize => Self::SearchThenSummarize {
                search: search()?,
                generator: generator()?,
            },
            ResolutionMode::SearchOnly => Self::SearchOnly { search: search()? },
            ResolutionMode::DocumentRetrieval => {
                let retrieval = config.retrieval.as_ref().ok_or_else(|| {
                    GatewayError::Configuration("retrieval endpoint not configured".into())
                })?;
                Self::DocumentRetrieval {
                    retrieval: RetrievalClient::new(retrieval)?,
                }
            }
        })
    }

    /// The mode these clients implement.
    pub fn mode(&self) -> ResolutionMode {
        match self {
            Self::DirectGeneration { .. } => ResolutionMode::DirectGeneration,
            Self::SearchThenSummarize { .. } => ResolutionMode::SearchThenSummarize,
            Self::SearchOnly { .. } => ResolutionMode::SearchOnly,
            Self::DocumentRetrieval { .. } => ResolutionMode::DocumentRetrieval,
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Pipeline").field(&self.mode()).finish()
    }
}

/// The query resolution gateway. Shared across requests behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Gateway {
    pipeline: Pipeline,
    sampling: SamplingConfig,
    recorder: Option<HistoryRecorder>,
}

impl Gateway {
    /// Gateway over `pipeline` with default sampling and no history.
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            sampling: SamplingConfig::default(),
            recorder: None,
        }
    }

    /// Select the mode and build every client `config` calls for.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Configuration`] when the selected mode's providers are
    /// missing or invalid.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let mode = ResolutionMode::from_config(config)?;
        let pipeline = Pipeline::from_config(config, mode)?;
        let sampling = config
            .generation
            .as_ref()
            .map(|g| g.sampling)
            .unwrap_or_default();
        Ok(Self::new(pipeline).with_sampling(sampling))
    }

    /// Set sampling parameters for generation calls.
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    /// Hand completed exchanges to `recorder`.
    pub fn with_history(mut self, recorder: HistoryRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// The active mode.
    pub fn mode(&self) -> ResolutionMode {
        self.pipeline.mode()
    }

    /// Resolve `request` into a response envelope.
    ///
    /// On success the exchange is queued for history; persistence never
    /// affects the result.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidInput`] for an empty or whitespace query
    /// - [`GatewayError::UpstreamUnavailable`] / [`GatewayError::UpstreamMalformed`]
    ///   when the first provider call fails
    pub async fn resolve(
        &self,
        request: SearchRequest,
        metadata: ClientMetadata,
    ) -> Result<SearchResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(GatewayError::InvalidInput(QUERY_REQUIRED.into()));
        }

        let started = Instant::now();
        tracing::debug!(mode = %self.mode(), query, "resolving query");

        let response = match self.answer(query).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(mode = %self.mode(), code = e.code(), "query failed: {e}");
                return Err(e);
            }
        };

        if response.summary.trim().is_empty() {
            tracing::warn!(mode = %self.mode(), "resolved with an empty summary");
        }
        tracing::info!(
            mode = %self.mode(),
            sources = response.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query resolved"
        );

        if let Some(ref recorder) = self.recorder {
            recorder.record(HistoryRecord::new(request.requester, &response, metadata));
        }
        Ok(response)
    }

    async fn answer(&self, query: &str) -> Result<SearchResponse> {
        let (summary, sources) = match &self.pipeline {
            Pipeline::DirectGeneration { generator } => {
                let summary = generator.generate(&Prompt::direct(query), &self.sampling).await?;
                (summary, placeholder_citations())
            }
            Pipeline::SearchThenSummarize { search, generator } => {
                let citations = run_search(search, query).await?;
                let prompt = Prompt::summarize(query, &citations);
                let summary = match generator.generate(&prompt, &self.sampling).await {
                    Ok(text) if !text.trim().is_empty() => text,
                    Ok(_) => {
                        tracing::warn!(provider = generator.name(), "generation returned blank text; using result listing");
                        fallback_summary(query, &citations)
                    }
                    Err(e) => {
                        tracing::warn!(provider = generator.name(), "generation failed, using result listing: {e}");
                        fallback_summary(query, &citations)
                    }
                };
                (summary, sources_or_placeholder(citations))
            }
            Pipeline::SearchOnly { search } => {
                let citations = run_search(search, query).await?;
                (fallback_summary(query, &citations), sources_or_placeholder(citations))
            }
            Pipeline::DocumentRetrieval { retrieval } => {
                let answer = retrieval.retrieve(query).await?;
                (answer.summary, answer.sources)
            }
        };

        Ok(SearchResponse {
            summary,
            sources,
            query: query.to_owned(),
        })
    }
}

async fn run_search(search: &SearchClient, query: &str) -> Result<Vec<SourceCitation>> {
    let raw = search.search(query, search.max_results()).await?;
    Ok(normalize_results(&raw))
}

fn sources_or_placeholder(citations: Vec<SourceCitation>) -> Vec<SourceCitation> {
    if citations.is_empty() {
        vec![no_results_citation()]
    } else {
        citations
    }
}
