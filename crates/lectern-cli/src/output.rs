//! Output formatting for search results.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use lectern_core::search::ScoredHit;
use serde::Serialize;

/// JSON output structure for search results
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub query: &'a str,
    pub total: usize,
    pub results: &'a [ScoredHit],
}

/// Formats search results as JSON.
pub fn format_json(query: &str, hits: &[ScoredHit]) -> String {
    let report = JsonReport {
        query,
        total: hits.len(),
        results: hits,
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
}

/// Formats search results for human-readable terminal output.
pub fn format_human(query: &str, hits: &[ScoredHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for \"{}\"", query);
    }

    let mut output = String::new();
    output.push_str(&format!(
        "Found {} result{} for \"{}\":\n\n",
        hits.len(),
        if hits.len() == 1 { "" } else { "s" },
        query
    ));

    for (i, hit) in hits.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} (score: {:.3}, {})\n",
            i + 1,
            hit.path,
            hit.score,
            hit.method.as_str()
        ));

        // Component scores are only present on fused results
        let mut score_parts = Vec::new();
        if let Some(ls) = hit.lexical_score {
            score_parts.push(format!("lexical: {:.3}", ls));
        }
        if let Some(ps) = hit.probabilistic_score {
            score_parts.push(format!("probabilistic: {:.3}", ps));
        }
        if let Some(ss) = hit.semantic_score {
            score_parts.push(format!("semantic: {:.3}", ss));
        }
        if !score_parts.is_empty() {
            output.push_str(&format!("   [{}]\n", score_parts.join(", ")));
        }

        let mut meta = format!("{} | {}", hit.file_type, hit.file_size);
        if !hit.modified_date.is_empty() {
            meta.push_str(&format!(" | {}", hit.modified_date));
        }
        output.push_str(&format!("   {}\n", meta));

        if !hit.summary.is_empty() {
            output.push_str(&format!("   {}\n", hit.summary));
        }
        for point in &hit.key_points {
            output.push_str(&format!("   - {}\n", point));
        }

        output.push('\n');
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::search::{DocId, SearchMethod};

    fn make_hit(path: &str, score: f32, method: SearchMethod) -> ScoredHit {
        let (file_name, folder) = match path.rsplit_once('/') {
            Some((folder, name)) => (name.to_string(), folder.to_string()),
            None => (path.to_string(), "Root".to_string()),
        };
        ScoredHit {
            doc_id: DocId(0),
            path: path.to_string(),
            file_name,
            folder,
            file_type: "TXT".to_string(),
            score,
            method,
            lexical_score: None,
            probabilistic_score: None,
            semantic_score: None,
            summary: "Supervised **learning** trains models on labeled data.".to_string(),
            key_points: vec!["Classification and regression are supervised tasks".to_string()],
            file_size: "1.2 KB".to_string(),
            modified_date: "2026-03-01".to_string(),
        }
    }

    #[test]
    fn test_format_human_empty() {
        let output = format_human("test query", &[]);
        assert!(output.contains("No results found"));
    }

    #[test]
    fn test_format_human_single() {
        let hits = vec![make_hit("guides/ml.txt", 0.85, SearchMethod::Lexical)];
        let output = format_human("supervised", &hits);
        assert!(output.contains("1 result"));
        assert!(output.contains("guides/ml.txt"));
        assert!(output.contains("(score: 0.850, lexical)"));
        assert!(output.contains("TXT | 1.2 KB | 2026-03-01"));
        assert!(output.contains("**learning**"));
        assert!(output.contains("- Classification and regression"));
    }

    #[test]
    fn test_format_human_fused_breakdown() {
        let mut hit = make_hit("ml.txt", 0.812, SearchMethod::Fused);
        hit.lexical_score = Some(0.7);
        hit.probabilistic_score = Some(0.8);
        hit.semantic_score = Some(0.9);
        let output = format_human("supervised", &[hit]);
        assert!(output.contains("[lexical: 0.700, probabilistic: 0.800, semantic: 0.900]"));
    }

    #[test]
    fn test_format_json() {
        let hits = vec![make_hit("guides/ml.txt", 0.9, SearchMethod::Lexical)];
        let output = format_json("supervised", &hits);
        assert!(output.contains("\"query\": \"supervised\""));
        assert!(output.contains("\"total\": 1"));
        assert!(output.contains("\"path\": \"guides/ml.txt\""));
        assert!(output.contains("\"method\": \"lexical\""));
        // Component scores are absent on single-model results
        assert!(!output.contains("lexical_score"));
    }
}
