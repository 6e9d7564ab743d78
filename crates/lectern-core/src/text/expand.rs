//! Advisory query expansion.
//!
//! Expansion appends a handful of synonyms after the user's own words.
//! It never rewrites or reorders them, and disabling it changes no
//! scoring contract, only the token stream the models receive.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Maximum synonyms appended per query token.
const MAX_SYNONYMS_PER_TOKEN: usize = 2;

/// Source of single-word synonyms for a query token.
pub trait SynonymProvider {
    fn synonyms(&self, word: &str) -> Vec<String>;
}

/// Built-in table covering the vocabulary of technical study material.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticSynonyms;

static SYNONYM_TABLE: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let entries: &[(&str, &[&str])] = &[
        ("big", &["large", "huge"]),
        ("data", &["information"]),
        ("database", &["dbms", "datastore"]),
        ("databases", &["dbms", "datastores"]),
        ("delete", &["remove", "drop"]),
        ("document", &["file", "record"]),
        ("error", &["fault", "mistake"]),
        ("fast", &["quick", "rapid"]),
        ("find", &["locate", "search"]),
        ("graph", &["network", "chart"]),
        ("index", &["catalog"]),
        ("learning", &["training", "education"]),
        ("machine", &["computer", "automated"]),
        ("method", &["technique", "approach"]),
        ("model", &["algorithm"]),
        ("network", &["net", "graph"]),
        ("normalize", &["standardize"]),
        ("query", &["lookup", "request"]),
        ("search", &["retrieval", "lookup"]),
        ("small", &["little", "tiny"]),
        ("store", &["save", "persist"]),
        ("supervised", &["labeled"]),
        ("table", &["relation"]),
        ("test", &["exam", "check"]),
    ];
    entries.iter().copied().collect()
});

impl SynonymProvider for StaticSynonyms {
    fn synonyms(&self, word: &str) -> Vec<String> {
        SYNONYM_TABLE
            .get(word)
            .map(|alts| alts.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default()
    }
}

/// Appends up to two distinct synonyms per token after the original
/// token list, preserving the user's order.
pub struct QueryExpander<P = StaticSynonyms> {
    provider: P,
    enabled: bool,
}

impl QueryExpander<StaticSynonyms> {
    pub fn new(enabled: bool) -> Self {
        Self {
            provider: StaticSynonyms,
            enabled,
        }
    }
}

impl<P: SynonymProvider> QueryExpander<P> {
    pub fn with_provider(provider: P, enabled: bool) -> Self {
        Self { provider, enabled }
    }

    /// Lowercase whitespace tokenization, lighter than the indexing
    /// normalizer so every user word survives into the expansion.
    pub fn expand(&self, raw_query: &str) -> Vec<String> {
        let tokens: Vec<String> = raw_query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if !self.enabled {
            return tokens;
        }

        let mut expanded = tokens.clone();
        for token in &tokens {
            let mut added = 0;
            for synonym in self.provider.synonyms(token) {
                if added == MAX_SYNONYMS_PER_TOKEN {
                    break;
                }
                let synonym = synonym.to_lowercase();
                if synonym == *token || synonym.contains(' ') || expanded.contains(&synonym) {
                    continue;
                }
                expanded.push(synonym);
                added += 1;
            }
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_expansion_returns_original_tokens() {
        let expander = QueryExpander::new(false);
        assert_eq!(
            expander.expand("Database Search"),
            vec!["database", "search"]
        );
    }

    #[test]
    fn expansions_follow_the_original_list() {
        let expander = QueryExpander::new(true);
        let tokens = expander.expand("database search");
        assert_eq!(&tokens[..2], &["database", "search"]);
        assert!(tokens[2..].contains(&"dbms".to_string()));
        assert!(tokens[2..].contains(&"retrieval".to_string()));
    }

    #[test]
    fn at_most_two_synonyms_per_token() {
        let expander = QueryExpander::new(true);
        let tokens = expander.expand("database");
        assert!(tokens.len() <= 3);
    }

    #[test]
    fn duplicate_synonyms_are_skipped() {
        struct Echo;
        impl SynonymProvider for Echo {
            fn synonyms(&self, word: &str) -> Vec<String> {
                vec![word.to_string(), "shared".to_string(), "shared".to_string()]
            }
        }
        let expander = QueryExpander::with_provider(Echo, true);
        let tokens = expander.expand("alpha beta");
        assert_eq!(tokens, vec!["alpha", "beta", "shared"]);
    }

    #[test]
    fn unknown_tokens_expand_to_nothing() {
        let expander = QueryExpander::new(true);
        assert_eq!(expander.expand("xyzzy"), vec!["xyzzy"]);
    }
}
