//! Restricted evaluator for model-authored analysis snippets.
//!
//! Snippets arrive as untrusted strings from the `python_analysis` tool. They
//! never reach an interpreter: a lexical denylist runs first, then the code
//! is parsed into a small expression grammar (assignments, column indexing,
//! boolean masks, method calls) and walked by [`eval`]. Anything outside the
//! grammar is a syntax error, so there is no filesystem, network, or process
//! surface to escape to.
//!
//! The result is the `result` variable if the snippet assigned one, else the
//! final value of `df`, serialized with a `type` tag and bounded previews.

mod eval;
mod parser;
mod serialize;
mod token;

use polars::prelude::{DataFrame, PolarsError};
use tracing::debug;

/// Substrings that fail a snippet before parsing. Matching is
/// case-insensitive and deliberately blunt: a false positive is a retryable
/// tool error, a false negative is not.
const FORBIDDEN_TOKENS: &[&str] = &[
    "import", "exec", "eval", "__", "open", "file", "input", "compile",
];

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Forbidden operation detected: {0}")]
    Forbidden(String),

    #[error("Syntax error in code: {0}")]
    Syntax(String),

    #[error("Execution error: {0}")]
    Execution(String),
}

impl From<PolarsError> for SandboxError {
    fn from(err: PolarsError) -> Self {
        SandboxError::Execution(err.to_string())
    }
}

fn check_denylist(code: &str) -> Result<(), SandboxError> {
    let lowered = code.to_lowercase();
    for token in FORBIDDEN_TOKENS {
        if lowered.contains(token) {
            return Err(SandboxError::Forbidden((*token).to_string()));
        }
    }
    Ok(())
}

/// Evaluates one snippet against a clone of `df` and serializes the result.
pub fn run(df: &DataFrame, code: &str) -> Result<serde_json::Value, SandboxError> {
    check_denylist(code)?;
    let tokens = token::tokenize(code)?;
    let stmts = parser::parse(tokens)?;
    let value = eval::execute(df, &stmts)?;
    debug!(code_len = code.len(), "analysis snippet evaluated");
    Ok(serialize::to_json(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_df() -> DataFrame {
        let a = Series::new("a".into(), &[1i64, 2, 3]);
        let g = Series::new("g".into(), &["x", "y", "x"]);
        DataFrame::new(vec![a.into_column(), g.into_column()]).unwrap()
    }

    #[test]
    fn import_is_rejected_before_parsing() {
        let err = run(&sample_df(), "import os").unwrap_err();
        assert_eq!(err.to_string(), "Forbidden operation detected: import");
    }

    #[test]
    fn denylist_is_case_insensitive() {
        let err = run(&sample_df(), "IMPORT os").unwrap_err();
        assert_eq!(err.to_string(), "Forbidden operation detected: import");
    }

    #[test]
    fn dunder_access_is_rejected() {
        let err = run(&sample_df(), "df.__class__").unwrap_err();
        assert!(matches!(err, SandboxError::Forbidden(_)));
    }

    #[test]
    fn denylist_matches_substrings() {
        // "profile" contains "file": blunt matching is retryable, so the
        // false positive is acceptable
        let err = run(&sample_df(), "result = df['profile']").unwrap_err();
        assert_eq!(err.to_string(), "Forbidden operation detected: file");
    }

    #[test]
    fn scalar_sum_round_trips() {
        let out = run(&sample_df(), "result = df['a'].sum()").unwrap();
        assert_eq!(out, json!({"type": "scalar", "value": 6}));
    }

    #[test]
    fn filtered_frame_reports_true_shape() {
        let out = run(&sample_df(), "result = df[df['a'] > 1]").unwrap();
        assert_eq!(out["type"], json!("dataframe"));
        assert_eq!(out["shape"], json!([2, 2]));
        assert_eq!(out["data"].as_array().unwrap().len(), 2);
        assert_eq!(out["data"][0]["a"], json!(2));
    }

    #[test]
    fn large_frame_preview_is_truncated() {
        let a = Series::new("a".into(), (0..25i64).collect::<Vec<_>>());
        let df = DataFrame::new(vec![a.into_column()]).unwrap();
        let out = run(&df, "result = df").unwrap();
        assert_eq!(out["data"].as_array().unwrap().len(), 10);
        assert_eq!(out["shape"], json!([25, 1]));
    }

    #[test]
    fn df_fallback_when_no_result_assigned() {
        let out = run(&sample_df(), "df = df.head(2)").unwrap();
        assert_eq!(out["type"], json!("dataframe"));
        assert_eq!(out["shape"], json!([2, 2]));
    }

    #[test]
    fn unique_serializes_as_series() {
        let out = run(&sample_df(), "result = df['g'].unique()").unwrap();
        assert_eq!(out["type"], json!("series"));
        assert_eq!(out["data"]["0"], json!("x"));
        assert_eq!(out["data"]["1"], json!("y"));
    }

    #[test]
    fn tolist_serializes_as_collection() {
        let out = run(&sample_df(), "result = df['a'].tolist()").unwrap();
        assert_eq!(out, json!({"type": "collection", "value": [1, 2, 3]}));
    }

    #[test]
    fn grouped_aggregation_is_a_frame_with_key_column() {
        let out = run(&sample_df(), "result = df.groupby('g')['a'].sum()").unwrap();
        assert_eq!(out["type"], json!("dataframe"));
        assert_eq!(out["shape"], json!([2, 2]));
        // group labels travel as a key column, sorted ascending
        assert_eq!(out["data"][0]["g"], json!("x"));
        assert_eq!(out["data"][0]["a"], json!(4));
        assert_eq!(out["data"][1]["g"], json!("y"));
        assert_eq!(out["data"][1]["a"], json!(2));
    }

    #[test]
    fn unfinished_code_is_a_syntax_error() {
        let err = run(&sample_df(), "result = df[").unwrap_err();
        assert!(err.to_string().starts_with("Syntax error in code:"));
    }

    #[test]
    fn unknown_column_is_an_execution_error() {
        let err = run(&sample_df(), "result = df['missing'].sum()").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Execution error: Column 'missing' not found"
        );
    }

    #[test]
    fn source_frame_is_never_mutated() {
        let df = sample_df();
        let _ = run(&df, "df = df.head(1)").unwrap();
        assert_eq!(df.height(), 3);
    }
}
