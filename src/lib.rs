//! Ember language front end
//!
//! A lexical scanner, recursive-descent parser, and semantic analyzer for
//! the Ember experimental language. The pipeline is strictly linear:
//! source text to tokens to AST to a list of semantic errors. Nothing is
//! ever executed. Each stage degrades gracefully instead of aborting, so a
//! single run surfaces as many diagnostics as possible.
//!
//! ```
//! use ember_lang::check;
//!
//! let report = check("def f(x):\n    return x");
//! assert!(report.success);
//! ```

pub mod feedback;
pub mod frontend;
pub mod types;
pub mod utils;

pub use frontend::ast::{Expr, Stmt};
pub use frontend::lexer::Lexer;
pub use frontend::parser::Parser;
pub use frontend::semantic::{AnalyzerOptions, SemanticAnalyzer};
pub use frontend::token::{Literal, Token, TokenKind};
pub use types::{FunctionType, Type};
pub use utils::{ParseError, SemanticError, SemanticErrorKind};

use feedback::{AnalysisReport, Diagnostic, ReportStats};

/// Run the full pipeline over a source text and collect a structured
/// report of everything the front end found.
pub fn check(source: &str) -> AnalysisReport {
    let tokens = Lexer::new(source).tokenize();
    let token_count = tokens.len();
    let mut diagnostics: Vec<Diagnostic> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Error)
        .map(Diagnostic::from_lex_error)
        .collect();
    let lex_error_count = diagnostics.len();

    let mut parser = Parser::new(tokens);
    let statements = parser.parse();
    let parse_errors = parser.take_errors();
    diagnostics.extend(parse_errors.iter().map(Diagnostic::from_parse_error));

    let semantic_errors = SemanticAnalyzer::new().analyze(&statements);
    diagnostics.extend(semantic_errors.iter().map(Diagnostic::from_semantic_error));

    log::debug!(
        "checked {} tokens, {} statements, {} diagnostics",
        token_count,
        statements.len(),
        diagnostics.len()
    );

    AnalysisReport {
        success: diagnostics.is_empty(),
        stats: ReportStats {
            token_count,
            statement_count: statements.len(),
            lex_error_count,
            parse_error_count: parse_errors.len(),
            semantic_error_count: semantic_errors.len(),
        },
        diagnostics,
    }
}
