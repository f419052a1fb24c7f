// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction and tolerant response parsing for the local model.
//!
//! Small local models wrap answers in prose or markdown fences; every
//! parser here extracts what it can and degrades gracefully instead of
//! failing the pipeline.

use tabrecall_core::TabRecord;
use tabrecall_core::types::TAG_UNCATEGORIZED;
use tracing::{debug, warn};

/// Fixed category set for tab classification.
pub const CATEGORIES: &[&str] = &[
    "News",
    "Shopping",
    "Research",
    "Social",
    "Entertainment",
    "Technology",
    "Finance",
    "Reference",
];

/// Prompt for page summarization.
pub fn summarize_prompt(text: &str) -> String {
    format!(
        "Summarize the following web page content in 2-3 plain sentences. \
         Respond with the summary only, no preamble.\n\n{text}"
    )
}

/// Prompt for single-label classification of a summary.
pub fn classify_prompt(summary: &str) -> String {
    format!(
        "Classify this page summary into exactly one category from: {}. \
         Respond with the category name only.\n\nSummary: {summary}",
        CATEGORIES.join(", ")
    )
}

/// Prompt for ranking records against a search query.
///
/// The listing carries id, title, and a clipped summary per record; the
/// model answers with a JSON array of tab ids, best match first.
pub fn rank_prompt(query: &str, records: &[TabRecord]) -> String {
    let mut listing = String::new();
    for record in records {
        let summary: String = record.summary.chars().take(200).collect();
        listing.push_str(&format!(
            "- id {}: {} -- {}\n",
            record.tab_id, record.title, summary
        ));
    }
    format!(
        "Given these open tabs:\n{listing}\n\
         Return the ids of the tabs most relevant to the query \"{query}\", \
         best match first, as a JSON array of numbers (e.g. [3, 1]). \
         Output the JSON array only. Return [] if none are relevant."
    )
}

/// Extract a category label from a model response.
///
/// Matches case-insensitively anywhere in the response so "Category:
/// Research." still resolves. Unmatched responses fall back to the
/// uncategorized label rather than erroring.
pub fn parse_label(response: &str) -> String {
    let lowered = response.to_lowercase();
    for category in CATEGORIES {
        if lowered.contains(&category.to_lowercase()) {
            return (*category).to_string();
        }
    }
    debug!(response, "no known category in classification response");
    TAG_UNCATEGORIZED.to_string()
}

/// Extract the ranked id array from a model response.
///
/// Handles markdown code fences and surrounding prose by locating the
/// outermost `[...]`. Returns an empty Vec on parse failure (ranking is
/// best-effort, never fatal).
pub fn parse_rank_response(response: &str) -> Vec<i64> {
    let trimmed = response.trim();
    let start = trimmed.find('[').unwrap_or(0);
    let end = trimmed.rfind(']').map(|i| i + 1).unwrap_or(trimmed.len());
    let json_str = &trimmed[start..end];

    match serde_json::from_str::<Vec<i64>>(json_str) {
        Ok(ids) => ids,
        Err(e) => {
            warn!("failed to parse rank response: {e}");
            debug!("raw response: {response}");
            Vec::new()
        }
    }
}
