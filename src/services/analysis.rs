//! Class analysis aggregator
//!
//! Collects all lecture text and quiz content/results for a class, builds a
//! fixed-template prompt, invokes the AI client once, and atomically
//! replaces the class's stored analysis. An AI failure writes nothing, so
//! the previous analysis stays current.

use crate::ai::{ChatClient, GenerationParams};
use crate::db::Repository;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub analysis: Value,
    pub created_at: DateTime<Utc>,
}

pub struct AnalysisService {
    repo: Repository,
    chat: Arc<dyn ChatClient>,
}

impl AnalysisService {
    pub fn new(repo: Repository, chat: Arc<dyn ChatClient>) -> Self {
        Self { repo, chat }
    }

    pub async fn run(&self, class_id: i64) -> Result<AnalysisRecord> {
        let start = Instant::now();

        let lecture_texts = self.repo.lecture_texts_for_class(class_id).await?;
        let quiz_rows = self.repo.quiz_texts_for_class(class_id).await?;

        // No quiz signal means nothing to analyze; fail before the
        // external call.
        if quiz_rows.is_empty() {
            return Err(AppError::NoQuizzes { class_id });
        }

        let lecture_block = join_nonempty(lecture_texts.iter().map(String::as_str));
        let quiz_block = join_nonempty(quiz_rows.iter().map(|(content, _)| content.as_str()));
        let results_block =
            join_nonempty(quiz_rows.iter().filter_map(|(_, results)| results.as_deref()));

        let prompt = build_prompt(&lecture_block, &quiz_block, &results_block);

        let analysis = self
            .chat
            .chat(&prompt, &GenerationParams::analysis_defaults())
            .await?;

        let serialized = serde_json::to_string(&analysis)?;
        let row = self.repo.replace_analysis(class_id, &serialized).await?;

        metrics::counter!("lectern_analyses_run_total").increment(1);
        metrics::histogram!("lectern_analysis_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        info!(
            class_id = class_id,
            prompt_chars = prompt.len(),
            total_ms = start.elapsed().as_millis(),
            "Class analysis stored"
        );

        Ok(AnalysisRecord {
            analysis,
            created_at: row.created_at,
        })
    }

    pub async fn latest(&self, class_id: i64) -> Result<AnalysisRecord> {
        let row = self
            .repo
            .latest_analysis(class_id)
            .await?
            .ok_or_else(|| crate::not_found!("Analysis for class", class_id))?;

        // Historical rows may hold malformed JSON; return the raw string
        // rather than failing the read.
        let analysis = serde_json::from_str(&row.analysis_text)
            .unwrap_or(Value::String(row.analysis_text));

        Ok(AnalysisRecord {
            analysis,
            created_at: row.created_at,
        })
    }
}

/// Join text blocks with newlines, skipping empty entries
fn join_nonempty<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fixed-template prompt embedding the three aggregated text blocks
fn build_prompt(lecture_text: &str, quiz_content: &str, quiz_results: &str) -> String {
    format!(
        "You are an AI teaching assistant analyzing a university course.\n\n\
         Below are lecture transcripts and slide content:\n{lecture_text}\n\n\
         Below are quiz questions:\n{quiz_content}\n\n\
         Below are quiz performance results:\n{quiz_results}\n\n\
         Your task:\n\
         1. Identify the concepts students are struggling with most based on quiz performance.\n\
         2. Cross-reference those weak concepts with the lecture transcripts and slides.\n\
         3. Determine where (which lecture topic, section, or example) each concept was originally covered.\n\
         4. Infer why students may have misunderstood it (e.g., insufficient examples, rushed explanation, abstract treatment, lack of practice alignment).\n\
         5. Suggest specific ways the professor could revisit or improve coverage of each concept.\n\n\
         Output Requirements:\n\
         - Only provide the TOP 3 weakest concepts.\n\
         - For each concept, provide:\n\
            - Concept Name\n\
            - Estimated Mastery Score (0-100)\n\
            - Where It Was Covered (cite lecture title or topic if possible)\n\
            - Why Students Struggled\n\
            - How to Revisit / Improve It\n\n\
         Be concise but specific. Ground your reasoning in the lecture and quiz content provided. \
         List sections titles exactly as provided."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_all_three_blocks_in_order() {
        let prompt = build_prompt("LECTURES-HERE", "QUIZZES-HERE", "RESULTS-HERE");

        let l = prompt.find("LECTURES-HERE").unwrap();
        let q = prompt.find("QUIZZES-HERE").unwrap();
        let r = prompt.find("RESULTS-HERE").unwrap();
        assert!(l < q && q < r);

        assert!(prompt.contains("TOP 3 weakest concepts"));
        assert!(prompt.contains("Estimated Mastery Score (0-100)"));
        assert!(prompt.contains("How to Revisit / Improve It"));
    }

    #[test]
    fn test_join_nonempty_skips_blank_blocks() {
        let items = ["first", "", "  ", "second"];
        assert_eq!(join_nonempty(items.iter().copied()), "first\nsecond");
    }

    #[test]
    fn test_join_nonempty_empty_iterator() {
        assert_eq!(join_nonempty(std::iter::empty()), "");
    }
}
