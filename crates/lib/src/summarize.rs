//! Summarizer: turn raw Slack message text into a ticket title and description.
//!
//! The model is asked for a fixed `TITLE:` / `DESCRIPTION:` shape and its output is
//! pattern-matched. Anything it fails to provide falls back to the cleaned input, so a
//! summary is always produced.

use crate::llm::TextGenerator;
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Cleaned input is cut to this many characters before prompting.
pub const MAX_INPUT_CHARS: usize = 1200;
pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_TOKENS: u32 = 250;

const EMPTY_TITLE: &str = "Untitled ticket";
const EMPTY_DESCRIPTION: &str = "(no message text)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub title: String,
    pub description: String,
}

fn markup_patterns() -> &'static [Regex; 4] {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [r"\*([^*]+)\*", r"_([^_]+)_", r"~([^~]+)~", r"`([^`]+)`"]
            .map(|p| Regex::new(p).expect("markup regex must compile"))
    })
}

fn title_regex() -> &'static Regex {
    static TITLE_RE: OnceLock<Regex> = OnceLock::new();
    TITLE_RE.get_or_init(|| {
        Regex::new(r"(?im)TITLE:[ \t]*(.*)$").expect("title regex must compile")
    })
}

fn description_regex() -> &'static Regex {
    static DESCRIPTION_RE: OnceLock<Regex> = OnceLock::new();
    DESCRIPTION_RE.get_or_init(|| {
        Regex::new(r"(?i)DESCRIPTION:\s*([\s\S]+)").expect("description regex must compile")
    })
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Remove bold, italic, strikethrough and inline-code delimiters (keeping the inner text),
/// then cap at [`MAX_INPUT_CHARS`].
pub fn clean_message(text: &str) -> String {
    let mut out = text.to_string();
    for re in markup_patterns() {
        out = re.replace_all(&out, "$1").into_owned();
    }
    truncate_chars(&out, MAX_INPUT_CHARS)
}

pub fn build_prompt(clean_text: &str) -> String {
    format!(
        "Extract a title and description from this message. Output ONLY in this exact format, nothing else:\n\
         \n\
         TITLE: <short title>\n\
         DESCRIPTION:\n\
         <bullet points>\n\
         \n\
         Message:\n\
         {}",
        clean_text
    )
}

/// Parse model output, falling back per field to the cleaned input: first line as-is
/// (title) and whole text (description). The title is read from the `TITLE:` line only, so an
/// empty `TITLE:` never swallows the line after it.
pub fn parse_summary(output: &str, clean_text: &str) -> SummaryResult {
    let title = title_regex()
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .or_else(|| clean_text.lines().next().filter(|l| !l.trim().is_empty()))
        .map(|t| truncate_chars(t, MAX_TITLE_CHARS))
        .unwrap_or_else(|| EMPTY_TITLE.to_string());

    let description = description_regex()
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if clean_text.trim().is_empty() {
                EMPTY_DESCRIPTION.to_string()
            } else {
                clean_text.to_string()
            }
        });

    SummaryResult { title, description }
}

/// Summarizer over any text-generation backend.
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Never fails: a backend error is logged and treated as empty output.
    pub async fn summarize(&self, message_text: &str) -> SummaryResult {
        let clean = clean_message(message_text);
        let prompt = build_prompt(&clean);
        let output = match self.generator.generate(&prompt, MAX_TOKENS).await {
            Ok(out) => out,
            Err(e) => {
                log::warn!("summarizer: generation failed, using message text: {}", e);
                String::new()
            }
        };
        parse_summary(&output, &clean)
    }
}
