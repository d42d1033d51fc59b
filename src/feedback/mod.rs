//! Structured diagnostics
//!
//! Machine-readable output for editors and tooling: JSON reports built
//! from the pipeline's lex, parse and semantic errors.

use serde::{Deserialize, Serialize};

use crate::frontend::token::Token;
use crate::utils::{ParseError, SemanticError};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Pipeline stage that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Lex,
    Parse,
    Semantic,
}

/// A single diagnostic in a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub severity: Severity,
    pub message: String,
    /// 1-based source line, if known
    pub line: Option<u32>,
    /// Offending lexeme, if known
    pub lexeme: Option<String>,
}

impl Diagnostic {
    /// Diagnostic for an `Error`-kind token from the lexer
    pub fn from_lex_error(token: &Token) -> Self {
        Self {
            stage: Stage::Lex,
            severity: Severity::Error,
            message: format!("Unscannable input '{}'", token.lexeme),
            line: Some(token.line),
            lexeme: Some(token.lexeme.clone()),
        }
    }

    pub fn from_parse_error(error: &ParseError) -> Self {
        Self {
            stage: Stage::Parse,
            severity: Severity::Error,
            message: error.to_string(),
            line: Some(error.line()),
            lexeme: None,
        }
    }

    pub fn from_semantic_error(error: &SemanticError) -> Self {
        Self {
            stage: Stage::Semantic,
            severity: Severity::Error,
            message: error.message(),
            line: Some(error.token.line),
            lexeme: Some(error.token.lexeme.clone()),
        }
    }
}

/// Pipeline statistics for a report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    pub token_count: usize,
    pub statement_count: usize,
    pub lex_error_count: usize,
    pub parse_error_count: usize,
    pub semantic_error_count: usize,
}

/// Complete front-end report for one source text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// True when no diagnostics were produced. This means "no errors
    /// detected", not that the program is correct.
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ReportStats,
}

impl AnalysisReport {
    /// Serialize to compact JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
