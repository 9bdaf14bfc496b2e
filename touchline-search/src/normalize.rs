//! Citation normalisation.
//!
//! Every function here is total: missing or malformed provider fields are
//! replaced with fixed defaults, never reported as errors.

use crate::types::{RawResult, SourceCitation};

/// Title used when a result has none.
pub const DEFAULT_TITLE: &str = "No title";
/// URL used when a result has none.
pub const DEFAULT_URL: &str = "#";
/// Snippet used when a result has none.
pub const DEFAULT_SNIPPET: &str = "No description available";

/// Longest snippet produced from a retrieval document's page content.
const MAX_DOCUMENT_SNIPPET_CHARS: usize = 300;

/// Normalise raw search results into citations, preserving rank order.
pub fn normalize_results(results: &[RawResult]) -> Vec<SourceCitation> {
    results.iter().map(normalize_result).collect()
}

/// Normalise one raw search result. Blank strings count as missing.
pub fn normalize_result(raw: &RawResult) -> SourceCitation {
    SourceCitation {
        title: non_blank(raw.title.as_deref()).unwrap_or(DEFAULT_TITLE).to_owned(),
        url: non_blank(raw.url.as_deref()).unwrap_or(DEFAULT_URL).to_owned(),
        snippet: non_blank(raw.snippet.as_deref())
            .unwrap_or(DEFAULT_SNIPPET)
            .to_owned(),
    }
}

/// Normalise the documents attached to a retrieval-endpoint answer.
///
/// Reads `sourceDocuments`, then `sources`. Without either array the result
/// is the single [`document_placeholder`] citation.
pub fn normalize_documents(body: &serde_json::Value) -> Vec<SourceCitation> {
    let docs = body
        .get("sourceDocuments")
        .and_then(|v| v.as_array())
        .or_else(|| body.get("sources").and_then(|v| v.as_array()));

    match docs {
        Some(docs) => docs.iter().map(normalize_document).collect(),
        None => vec![document_placeholder()],
    }
}

/// Normalise one retrieval document.
///
/// Citation-shaped entries (`title`/`url`/`snippet`) pass through untouched.
/// LangChain-style `{pageContent, metadata}` documents take their title and
/// URL from metadata and their snippet from the page content.
pub fn normalize_document(doc: &serde_json::Value) -> SourceCitation {
    let field = |v: &serde_json::Value, key: &str| {
        v.get(key)
            .and_then(|f| f.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let metadata = doc.get("metadata").cloned().unwrap_or_default();
    let source = field(&metadata, "source");

    let title = field(doc, "title")
        .or_else(|| field(&metadata, "title"))
        .or_else(|| source.clone())
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned());

    let url = field(doc, "url")
        .or_else(|| field(doc, "link"))
        .or_else(|| field(&metadata, "url"))
        .or_else(|| source.filter(|s| s.starts_with("http://") || s.starts_with("https://")))
        .unwrap_or_else(|| DEFAULT_URL.to_owned());

    let snippet = field(doc, "snippet")
        .or_else(|| field(doc, "pageContent").map(|c| condense(&c)))
        .unwrap_or_else(|| DEFAULT_SNIPPET.to_owned());

    SourceCitation { title, url, snippet }
}

/// The citation shown when a retrieval answer carries no documents.
pub fn document_placeholder() -> SourceCitation {
    SourceCitation::new(
        "Document-based Answer",
        DEFAULT_URL,
        "Answer retrieved from document knowledge base",
    )
}

/// Filler citations for modes that do no searching.
///
/// These are well-known football outlets shown for orientation only; they
/// are not evidence for the generated summary.
pub fn placeholder_citations() -> Vec<SourceCitation> {
    vec![
        SourceCitation::new(
            "BBC Sport - Football",
            "https://www.bbc.co.uk/sport/football",
            "Latest football news, results, fixtures and analysis",
        ),
        SourceCitation::new(
            "ESPN FC",
            "https://www.espn.com/soccer/",
            "Scores, transfers and coverage from leagues worldwide",
        ),
        SourceCitation::new(
            "Sky Sports Football",
            "https://www.skysports.com/football",
            "Match reports, live scores and football headlines",
        ),
    ]
}

/// The citation shown when a search succeeded with zero hits.
pub fn no_results_citation() -> SourceCitation {
    SourceCitation::new(
        "No sources found",
        DEFAULT_URL,
        "The search provider returned no results for this query",
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Collapse whitespace and cap the length at a char boundary.
fn condense(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_DOCUMENT_SNIPPET_CHARS {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(MAX_DOCUMENT_SNIPPET_CHARS).collect();
    out.push_str("...");
    out
}
