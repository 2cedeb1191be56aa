use crate::analyzer::{StandardAnalyzer, TextAnalyzer};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

lazy_static! {
    // Everything that is not a letter, digit, whitespace or hyphen.
    static ref PUNCT: Regex = Regex::new(r"[^\p{L}\p{N}\s-]").expect("valid regex");
}

/// Text → term pipeline shared by indexing and querying.
///
/// Lowercase, fold diacritics, strip punctuation except `-`, split into words,
/// keep alphanumeric and hyphenated words, then drop stopwords unless the word
/// is one of the configured exceptions. Stopwords and exceptions are folded
/// the same way as the text, so `não` in a dictionary matches the term `nao`.
#[derive(Clone)]
pub struct Normalizer {
    analyzer: Arc<dyn TextAnalyzer>,
    stopwords: HashSet<String>,
    exceptions: HashSet<String>,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("stopwords", &self.stopwords.len())
            .field("exceptions", &self.exceptions)
            .finish()
    }
}

impl Normalizer {
    /// Normalizer with the stopword list of `locale` and no exceptions.
    pub fn new(analyzer: Arc<dyn TextAnalyzer>, locale: &str) -> Self {
        let raw = analyzer.stopwords(locale);
        let mut n = Self { analyzer, stopwords: HashSet::new(), exceptions: HashSet::new() };
        n.stopwords = n.fold_set(raw);
        n
    }

    /// Stock analyzer, `pt` stopwords.
    pub fn portuguese() -> Self {
        Self::new(Arc::new(StandardAnalyzer::new()), "pt")
    }

    pub fn with_exceptions<I, S>(mut self, exceptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exceptions = self.fold_set(exceptions);
        self
    }

    pub fn exceptions(&self) -> &HashSet<String> {
        &self.exceptions
    }

    pub fn is_stopword(&self, term: &str) -> bool {
        self.stopwords.contains(term)
    }

    /// Normalize with the exceptions this normalizer was configured with.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        self.run(text, &self.exceptions)
    }

    /// Normalize with a caller-supplied exception set instead of the configured one.
    pub fn normalize_with(&self, text: &str, exceptions: &HashSet<String>) -> Vec<String> {
        let folded = self.fold_set(exceptions);
        self.run(text, &folded)
    }

    fn run(&self, text: &str, exceptions: &HashSet<String>) -> Vec<String> {
        let lowered = text.to_lowercase();
        let folded = self.analyzer.fold_diacritics(&lowered);
        let stripped = PUNCT.replace_all(&folded, "");
        self.analyzer
            .tokenize(&stripped)
            .into_iter()
            .filter_map(|raw| keep_word(&raw))
            .filter(|t| !self.stopwords.contains(t) || exceptions.contains(t))
            .collect()
    }

    fn fold_set<I, S>(&self, words: I) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        words
            .into_iter()
            .map(|w| self.analyzer.fold_diacritics(&w.as_ref().to_lowercase()))
            .collect()
    }
}

/// Alphanumeric words and hyphenated compounds survive; edge hyphens are trimmed.
fn keep_word(raw: &str) -> Option<String> {
    let word = raw.trim_matches('-');
    if word.is_empty() {
        return None;
    }
    if word.chars().all(|c| c.is_alphanumeric() || c == '-') {
        Some(word.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenated_compound_is_one_token() {
        let n = Normalizer::portuguese();
        let t = n.normalize("Single-Sign-On (SSO)");
        assert_eq!(t, vec!["single-sign-on", "sso"]);
    }

    #[test]
    fn lone_hyphens_are_dropped() {
        let n = Normalizer::portuguese();
        assert_eq!(n.normalize("vpn - acesso --"), vec!["vpn", "acesso"]);
    }

    #[test]
    fn stopwords_removed_after_folding() {
        let n = Normalizer::portuguese();
        // "à" folds to "a", "não" to "nao"; both are stopwords
        assert_eq!(n.normalize("Acesso à VPN não"), vec!["acesso", "vpn"]);
    }

    #[test]
    fn exceptions_survive() {
        let n = Normalizer::portuguese().with_exceptions(["não", "e"]);
        assert_eq!(n.normalize("VPN e acesso, não jornada"), vec!["vpn", "e", "acesso", "nao", "jornada"]);
    }

    #[test]
    fn normalize_with_overrides_configured_exceptions() {
        let n = Normalizer::portuguese().with_exceptions(["e"]);
        let only_ou: HashSet<String> = ["ou".to_string()].into_iter().collect();
        assert_eq!(n.normalize_with("plano e ou saúde", &only_ou), vec!["plano", "ou", "saude"]);
    }
}
