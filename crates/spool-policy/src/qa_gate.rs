use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

macro_rules! fact_pattern {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($pattern).ok());
    };
}

fact_pattern!(DECIMALS, r"\b\d+\.\d+\b");
fact_pattern!(YEARS, r"\b\d{4}\b");
fact_pattern!(INTEGERS, r"\b\d+\b");
fact_pattern!(SLASH_DATES, r"\d{1,2}/\d{1,2}/\d{2,4}");
fact_pattern!(DASH_DATES, r"\d{1,2}-\d{1,2}-\d{2,4}");
fact_pattern!(DOUBLE_QUOTED, r#""([^"]+)""#);
fact_pattern!(SINGLE_QUOTED, r"'([^']+)'");

/// Heuristic fact-verification gate for generated summaries.
///
/// Extracts comparable fact classes (numeric literals, date-like
/// patterns, quoted strings, and capitalized mid-sentence words) from a
/// source span and its candidate summary, then requires the summary to
/// preserve a minimum fraction of the source's facts. Strict mode
/// additionally rejects any summary fact absent from the source.
///
/// This is deliberately conservative, not a semantic-equivalence check:
/// rejecting a valid paraphrase is acceptable, accepting a hallucination
/// is not.
#[derive(Debug, Clone)]
pub struct SummaryQAGate {
    /// Minimum fraction of source facts the summary must preserve.
    pub threshold: f64,
    /// Reject any fact the summary introduces that the source lacks.
    pub strict: bool,
}

impl Default for SummaryQAGate {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            strict: false,
        }
    }
}

impl SummaryQAGate {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            strict: false,
        }
    }

    /// Same threshold, with fabrication rejection enabled.
    pub fn strict(threshold: f64) -> Self {
        Self {
            threshold,
            strict: true,
        }
    }

    /// Check a candidate summary against its source text.
    ///
    /// An empty summary is trivially valid (there is nothing to verify
    /// and nothing fabricated); a source with no extractable facts
    /// passes unless strict mode finds fabrications.
    pub fn verify(&self, source: &str, summary: &str) -> bool {
        if summary.trim().is_empty() {
            return true;
        }

        let source_facts = extract_facts(source);
        let summary_facts = extract_facts(summary);

        if self.strict {
            let fabricated = summary_facts.difference(&source_facts).count();
            if fabricated > 0 {
                warn!(fabricated, "summary rejected: fabricated facts");
                return false;
            }
        }

        if source_facts.is_empty() {
            return true;
        }

        let preserved = source_facts.intersection(&summary_facts).count();
        let fidelity = preserved as f64 / source_facts.len() as f64;
        if fidelity < self.threshold {
            warn!(
                fidelity,
                threshold = self.threshold,
                "summary rejected: lost source facts"
            );
            return false;
        }
        true
    }

    /// Verify, regenerating up to `max_retries` times on failure.
    /// Returns the last candidate and whether it passed.
    pub fn verify_with_retry(
        &self,
        source: &str,
        candidate: String,
        mut regenerate: impl FnMut() -> String,
        max_retries: usize,
    ) -> (String, bool) {
        let mut summary = candidate;
        for attempt in 0..=max_retries {
            if self.verify(source, &summary) {
                return (summary, true);
            }
            if attempt < max_retries {
                summary = regenerate();
            }
        }
        (summary, false)
    }
}

/// Union of all extractable fact classes in a text.
fn extract_facts(text: &str) -> HashSet<String> {
    let mut facts = HashSet::new();
    facts.extend(extract_numbers(text));
    facts.extend(extract_quoted(text));
    facts.extend(extract_proper_names(text));
    facts
}

fn collect_matches(pattern: &LazyLock<Option<Regex>>, text: &str, out: &mut HashSet<String>) {
    if let Some(regex) = pattern.as_ref() {
        out.extend(regex.find_iter(text).map(|m| m.as_str().to_string()));
    }
}

/// Numbers and date-like patterns: decimals, years, integers, dates.
fn extract_numbers(text: &str) -> HashSet<String> {
    let mut numbers = HashSet::new();
    collect_matches(&DECIMALS, text, &mut numbers);
    collect_matches(&YEARS, text, &mut numbers);
    collect_matches(&INTEGERS, text, &mut numbers);
    collect_matches(&SLASH_DATES, text, &mut numbers);
    collect_matches(&DASH_DATES, text, &mut numbers);
    numbers
}

/// Content of single- and double-quoted strings.
fn extract_quoted(text: &str) -> HashSet<String> {
    let mut quoted = HashSet::new();
    for pattern in [&DOUBLE_QUOTED, &SINGLE_QUOTED] {
        if let Some(regex) = pattern.as_ref() {
            quoted.extend(
                regex
                    .captures_iter(text)
                    .filter_map(|c| c.get(1))
                    .map(|m| m.as_str().to_string()),
            );
        }
    }
    quoted
}

/// Capitalized words that are not at a sentence start: a cheap
/// proper-noun candidate heuristic.
fn extract_proper_names(text: &str) -> HashSet<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut names = HashSet::new();
    for (i, word) in words.iter().enumerate() {
        let clean: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
        let starts_upper = clean.chars().next().is_some_and(|c| c.is_uppercase());
        if !starts_upper || i == 0 {
            continue;
        }
        let follows_terminator = words[i - 1].ends_with(['.', '!', '?']);
        if !follows_terminator {
            names.insert(clean);
        }
    }
    names
}
