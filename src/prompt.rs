//! Prompt construction and the deterministic fallback summary.

use touchline_search::SourceCitation;

/// Instruction sent with every generation request.
pub const FOOTBALL_INSTRUCTION: &str = "You are a football (soccer) expert assistant. \
Answer questions about matches, players, clubs, transfers, tactics and competitions \
accurately and concisely. If you are not sure about a fact, say so instead of guessing.";

/// Extra instruction when numbered search results are supplied.
const SUMMARIZE_INSTRUCTION: &str = "Use only the numbered search results below to answer. \
Write a short summary in plain prose and do not invent details that are not in the results.";

/// A provider-neutral prompt: an instruction plus the user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System-level instruction.
    pub system: String,
    /// User turn.
    pub user: String,
}

impl Prompt {
    /// Prompt for answering `query` directly, with no search context.
    pub fn direct(query: &str) -> Self {
        Self {
            system: FOOTBALL_INSTRUCTION.to_owned(),
            user: query.to_owned(),
        }
    }

    /// Prompt for summarizing `citations` as an answer to `query`.
    ///
    /// An empty citation list produces a context stating that no sources
    /// were found.
    pub fn summarize(query: &str, citations: &[SourceCitation]) -> Self {
        let context = if citations.is_empty() {
            "No sources were found for this query.".to_owned()
        } else {
            numbered_context(citations)
        };
        Self {
            system: format!("{FOOTBALL_INSTRUCTION}\n\n{SUMMARIZE_INSTRUCTION}"),
            user: format!("Question: {query}\n\nSearch results:\n{context}"),
        }
    }

    /// Both parts as a single text block, for providers without a system role.
    pub fn flattened(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

fn numbered_context(citations: &[SourceCitation]) -> String {
    citations
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{}] {}\n{}\n{}", i + 1, c.title, c.url, c.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Deterministic summary used when no generation output is available.
///
/// One `"{n}. {title}: {snippet}"` line per citation, or a fixed sentence
/// when there are none.
pub fn fallback_summary(query: &str, citations: &[SourceCitation]) -> String {
    if citations.is_empty() {
        return format!("No results found for \"{query}\".");
    }
    citations
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}: {}", i + 1, c.title, c.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citations() -> Vec<SourceCitation> {
        vec![
            SourceCitation::new("Chelsea 2-1 Arsenal", "https://example.com/1", "Match report"),
            SourceCitation::new("Player ratings", "https://example.com/2", "Palmer stars"),
        ]
    }

    #[test]
    fn fallback_lists_numbered_lines() {
        assert_eq!(
            fallback_summary("Chelsea vs Arsenal", &citations()),
            "1. Chelsea 2-1 Arsenal: Match report\n2. Player ratings: Palmer stars"
        );
    }

    #[test]
    fn fallback_without_citations() {
        assert_eq!(
            fallback_summary("Wrexham", &[]),
            "No results found for \"Wrexham\"."
        );
    }

    #[test]
    fn direct_prompt_carries_query_verbatim() {
        let prompt = Prompt::direct("Who won the 2022 World Cup?");
        assert_eq!(prompt.user, "Who won the 2022 World Cup?");
        assert!(prompt.system.contains("football"));
    }

    #[test]
    fn summarize_prompt_numbers_context() {
        let prompt = Prompt::summarize("Chelsea vs Arsenal", &citations());
        assert!(prompt.user.starts_with("Question: Chelsea vs Arsenal"));
        assert!(prompt.user.contains("[1] Chelsea 2-1 Arsenal\nhttps://example.com/1\nMatch report"));
        assert!(prompt.user.contains("[2] Player ratings"));
        assert!(prompt.system.contains("numbered search results"));
    }

    #[test]
    fn summarize_prompt_without_sources() {
        let prompt = Prompt::summarize("Wrexham", &[]);
        assert!(prompt.user.contains("No sources were found"));
    }

    #[test]
    fn flattened_joins_parts() {
        let prompt = Prompt::direct("q");
        assert!(prompt.flattened().ends_with("\n\nq"));
    }
}
