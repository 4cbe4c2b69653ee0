//! Pratt parse table
//!
//! Each token kind maps to an optional prefix handler, an optional infix
//! handler, and the precedence at which it binds as an infix operator.

use crate::compiler::Compiler;
use crate::scanner::TokenKind;

/// Binding power, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Not an operator
    None,
    /// `=`
    Assignment,
    /// `or`
    Or,
    /// `and`
    And,
    /// `==` `!=`
    Equality,
    /// `<` `>` `<=` `>=`
    Comparison,
    /// `+` `-`
    Term,
    /// `*` `/`
    Factor,
    /// `!` `-`
    Unary,
    /// `.` `()`
    Call,
    /// Literals and grouping
    Primary,
}

impl Precedence {
    /// The next-higher level, used for the right operand of a
    /// left-associative binary operator
    pub fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// Handler invoked with `can_assign`
pub(crate) type ParseFn<'src, 'h> = fn(&mut Compiler<'src, 'h>, bool);

/// One row of the parse table
pub(crate) struct ParseRule<'src, 'h> {
    pub prefix: Option<ParseFn<'src, 'h>>,
    pub infix: Option<ParseFn<'src, 'h>>,
    pub precedence: Precedence,
}

impl<'src, 'h> ParseRule<'src, 'h> {
    fn new(
        prefix: Option<ParseFn<'src, 'h>>,
        infix: Option<ParseFn<'src, 'h>>,
        precedence: Precedence,
    ) -> Self {
        Self {
            prefix,
            infix,
            precedence,
        }
    }
}

/// Parse table lookup
pub(crate) fn rule<'src, 'h>(kind: TokenKind) -> ParseRule<'src, 'h> {
    use Precedence as P;
    use TokenKind as T;

    match kind {
        T::LeftParen => ParseRule::new(Some(Compiler::grouping), Some(Compiler::call), P::Call),
        T::Dot => ParseRule::new(None, Some(Compiler::dot), P::Call),
        T::Minus => ParseRule::new(Some(Compiler::unary), Some(Compiler::binary), P::Term),
        T::Plus => ParseRule::new(None, Some(Compiler::binary), P::Term),
        T::Slash | T::Star => ParseRule::new(None, Some(Compiler::binary), P::Factor),
        T::Bang => ParseRule::new(Some(Compiler::unary), None, P::None),
        T::BangEqual | T::EqualEqual => ParseRule::new(None, Some(Compiler::binary), P::Equality),
        T::Greater | T::GreaterEqual | T::Less | T::LessEqual => {
            ParseRule::new(None, Some(Compiler::binary), P::Comparison)
        }
        T::Identifier => ParseRule::new(Some(Compiler::variable), None, P::None),
        T::String => ParseRule::new(Some(Compiler::string), None, P::None),
        T::Number => ParseRule::new(Some(Compiler::number), None, P::None),
        T::And => ParseRule::new(None, Some(Compiler::and), P::And),
        T::Or => ParseRule::new(None, Some(Compiler::or), P::Or),
        T::False | T::Nil | T::True => ParseRule::new(Some(Compiler::literal), None, P::None),
        _ => ParseRule::new(None, None, P::None),
    }
}
