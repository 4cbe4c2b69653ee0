//! Compile error helpers

use core_types::{CompileError, ErrorSite};

use crate::scanner::{Token, TokenKind};

/// Build a diagnostic located at `token`
///
/// Error tokens carry their own message, so no site is shown for them.
pub fn error_at_token(token: &Token<'_>, message: impl Into<String>) -> CompileError {
    let site = match token.kind {
        TokenKind::Eof => ErrorSite::End,
        TokenKind::Error => ErrorSite::None,
        _ => ErrorSite::Lexeme(token.lexeme.to_string()),
    };
    CompileError {
        line: token.line,
        site,
        message: message.into(),
    }
}
