//! Single-pass compiler
//!
//! Parses Lox source with a Pratt parser and emits bytecode as it goes; no
//! syntax tree is built. Nested `fun` bodies compile under their own
//! [`FunctionState`], chained to the enclosing one. On error the compiler
//! records the diagnostic, suppresses follow-on reports until the next
//! statement boundary, and keeps parsing so that one pass reports every
//! independent error.

use std::rc::Rc;

use bytecode_system::{disassemble_chunk, ChunkError, OpCode};
use core_types::{CompileError, CompileErrors, ObjRef, Value};
use memory_manager::{Heap, HeapObject, ObjFunction, Roots, Tracer};

use crate::error::error_at_token;
use crate::rules::{rule, Precedence};
use crate::scanner::{Scanner, Token, TokenKind};
use crate::scope::{FunctionKind, FunctionState};

/// Maximum call arguments and function parameters
pub const MAX_ARITY: usize = u8::MAX as usize;

/// Roots held by the compiler: the functions under construction plus
/// whatever the caller holds.
struct CompilerRoots<'a, 'src> {
    current: &'a FunctionState<'src>,
    enclosing: &'a [FunctionState<'src>],
    outer: &'a dyn Roots,
}

impl Roots for CompilerRoots<'_, '_> {
    fn trace_roots(&self, tracer: &mut Tracer<'_>) {
        for state in self.enclosing.iter().chain(std::iter::once(self.current)) {
            if let Some(name) = state.name {
                tracer.mark_object(name);
            }
            for constant in state.chunk.constants() {
                tracer.mark_value(*constant);
            }
        }
        self.outer.trace_roots(tracer);
    }
}

/// Compile `source` into a top-level script function stored in `heap`.
///
/// `roots` are the handles the caller needs kept alive across any
/// collection triggered while compiling. The returned function is not
/// rooted; the caller must make it reachable before allocating again.
///
/// # Errors
///
/// Returns every compile error found, in source order.
///
/// # Example
///
/// ```
/// use memory_manager::{Heap, NoRoots};
///
/// let mut heap = Heap::new();
/// let script = parser::compile("print 1 + 2;", &mut heap, &NoRoots).unwrap();
/// assert_eq!(heap.format_value(script.into()), "<script>");
///
/// let errors = parser::compile("print ;", &mut heap, &NoRoots).unwrap_err();
/// assert_eq!(errors.to_string(), "[line 1] Error at ';': Expect expression.");
/// ```
pub fn compile(source: &str, heap: &mut Heap, roots: &dyn Roots) -> Result<ObjRef, CompileErrors> {
    let mut compiler = Compiler::new(source, heap, roots);
    compiler.advance();
    while !compiler.match_token(TokenKind::Eof) {
        compiler.declaration();
    }
    compiler.finish()
}

/// Compiler state for one compile call
pub struct Compiler<'src, 'h> {
    scanner: Scanner<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    panic_mode: bool,
    errors: Vec<CompileError>,
    function: FunctionState<'src>,
    enclosing: Vec<FunctionState<'src>>,
    heap: &'h mut Heap,
    roots: &'h dyn Roots,
}

impl<'src, 'h> Compiler<'src, 'h> {
    fn new(source: &'src str, heap: &'h mut Heap, roots: &'h dyn Roots) -> Self {
        Self {
            scanner: Scanner::new(source),
            current: Token::synthetic(TokenKind::Eof, ""),
            previous: Token::synthetic(TokenKind::Eof, ""),
            panic_mode: false,
            errors: Vec::new(),
            function: FunctionState::new(FunctionKind::Script, None),
            enclosing: Vec::new(),
            heap,
            roots,
        }
    }

    fn finish(mut self) -> Result<ObjRef, CompileErrors> {
        if !self.errors.is_empty() {
            return Err(CompileErrors(self.errors));
        }
        Ok(self.end_function())
    }

    // ---- token stream ----

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = self.current.lexeme;
            self.error_at_current(message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    // ---- diagnostics ----

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.errors.push(error_at_token(&token, message));
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => self.advance(),
            }
        }
    }

    // ---- emission ----

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.function.chunk.write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op.into());
    }

    fn emit_op_operand(&mut self, op: OpCode, operand: u8) {
        self.emit_op(op);
        self.emit_byte(operand);
    }

    fn emit_return(&mut self) {
        self.emit_op(OpCode::Nil);
        self.emit_op(OpCode::Return);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        match self.function.chunk.add_constant(value) {
            Ok(index) => index,
            Err(err) => {
                self.error(&err.to_string());
                0
            }
        }
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_op_operand(OpCode::Constant, index);
    }

    /// Emit a forward jump with a placeholder operand; returns the operand
    /// offset for [`Compiler::patch_jump`].
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.function.chunk.len() - 2
    }

    fn patch_jump(&mut self, operand_offset: usize) {
        if let Err(err) = self.function.chunk.patch_jump(operand_offset) {
            let message = match err {
                ChunkError::JumpTooLarge(_) => "Too much code to jump over.".to_string(),
                other => other.to_string(),
            };
            self.error(&message);
        }
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::Loop);
        let distance = match self.function.chunk.loop_distance(loop_start) {
            Ok(distance) => distance,
            Err(_) => {
                self.error("Loop body too large.");
                0
            }
        };
        let [hi, lo] = distance.to_be_bytes();
        self.emit_byte(hi);
        self.emit_byte(lo);
    }

    // ---- heap access ----

    fn intern(&mut self, chars: &str) -> ObjRef {
        let roots = CompilerRoots {
            current: &self.function,
            enclosing: &self.enclosing,
            outer: self.roots,
        };
        self.heap.intern(chars, &roots)
    }

    fn identifier_constant(&mut self, name: &str) -> u8 {
        let string = self.intern(name);
        self.make_constant(Value::Obj(string))
    }

    /// Finish the current function, move it into the heap and return to the
    /// enclosing state.
    fn end_function(&mut self) -> ObjRef {
        self.emit_return();

        let outer = self
            .enclosing
            .pop()
            .unwrap_or_else(|| FunctionState::new(FunctionKind::Script, None));
        let finished = std::mem::replace(&mut self.function, outer);

        if log::log_enabled!(log::Level::Debug) && self.errors.is_empty() {
            let name = finished
                .name
                .map(|name| self.heap.describe(name))
                .unwrap_or_else(|| "<script>".to_string());
            log::debug!("\n{}", disassemble_chunk(&finished.chunk, &name, &*self.heap));
        }

        let function = HeapObject::Function(ObjFunction {
            name: finished.name,
            arity: finished.arity.min(MAX_ARITY) as u8,
            chunk: Rc::new(finished.chunk),
        });
        let roots = CompilerRoots {
            current: &self.function,
            enclosing: &self.enclosing,
            outer: self.roots,
        };
        self.heap.alloc(function, &roots)
    }

    // ---- declarations ----

    fn declaration(&mut self) {
        if self.match_token(TokenKind::Class) {
            self.class_declaration();
        } else if self.match_token(TokenKind::Fun) {
            self.fun_declaration();
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn class_declaration(&mut self) {
        self.consume(TokenKind::Identifier, "Expect class name.");
        let name = self.previous.lexeme;
        let name_constant = self.identifier_constant(name);
        self.declare_variable();

        self.emit_op_operand(OpCode::Class, name_constant);
        self.define_variable(name_constant);

        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.");
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.");
    }

    fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        // A function may refer to itself in its body.
        self.function.mark_initialized();
        self.function_body(FunctionKind::Function);
        self.define_variable(global);
    }

    fn function_body(&mut self, kind: FunctionKind) {
        let name = self.previous.lexeme;
        let name = self.intern(name);
        let enclosing = std::mem::replace(&mut self.function, FunctionState::new(kind, Some(name)));
        self.enclosing.push(enclosing);
        self.function.begin_scope();

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.");
        if !self.check(TokenKind::RightParen) {
            loop {
                self.function.arity += 1;
                if self.function.arity > MAX_ARITY {
                    self.error_at_current("Can't have more than 255 parameters.");
                }
                let constant = self.parse_variable("Expect parameter name.");
                self.define_variable(constant);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.");
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.");
        self.block();

        // No end_scope: the frame is discarded wholesale on return.
        let function = self.end_function();
        self.emit_constant(Value::Obj(function));
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");

        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        );

        self.define_variable(global);
    }

    /// Consume a name and declare it. Returns the global name constant, or
    /// 0 for locals.
    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::Identifier, message);

        self.declare_variable();
        if self.function.scope_depth > 0 {
            return 0;
        }

        let name = self.previous.lexeme;
        self.identifier_constant(name)
    }

    fn declare_variable(&mut self) {
        if self.function.scope_depth == 0 {
            return;
        }
        let name = self.previous.lexeme;
        if let Err(message) = self.function.declare_local(name) {
            self.error(message);
        }
    }

    fn define_variable(&mut self, global: u8) {
        if self.function.scope_depth > 0 {
            self.function.mark_initialized();
            return;
        }
        self.emit_op_operand(OpCode::DefineGlobal, global);
    }

    // ---- statements ----

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::For) {
            self.for_statement();
        } else if self.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.match_token(TokenKind::Return) {
            self.return_statement();
        } else if self.match_token(TokenKind::While) {
            self.while_statement();
        } else if self.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn begin_scope(&mut self) {
        self.function.begin_scope();
    }

    fn end_scope(&mut self) {
        match self.function.end_scope() {
            0 => {}
            1 => self.emit_op(OpCode::Pop),
            n => self.emit_op_operand(OpCode::PopN, n as u8),
        }
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    fn return_statement(&mut self) {
        if self.function.kind == FunctionKind::Script {
            self.error("Can't return from top-level code.");
        }

        if self.match_token(TokenKind::Semicolon) {
            self.emit_return();
        } else {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after return value.");
            self.emit_op(OpCode::Return);
        }
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();

        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);

        if self.match_token(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.function.chunk.len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");
        if self.match_token(TokenKind::Semicolon) {
            // No initializer.
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.function.chunk.len();
        let mut exit_jump = None;
        if !self.match_token(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");

            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        }

        if !self.match_token(TokenKind::RightParen) {
            let body_jump = self.emit_jump(OpCode::Jump);
            let increment_start = self.function.chunk.len();
            self.expression();
            self.emit_op(OpCode::Pop);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::Pop);
        }

        self.end_scope();
    }

    // ---- expressions ----

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = rule(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };

        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = rule(self.previous.kind).infix {
                infix(self, can_assign);
            }
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    pub(crate) fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    pub(crate) fn number(&mut self, _can_assign: bool) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::Number(value)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    pub(crate) fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let contents = &lexeme[1..lexeme.len() - 1];
        let string = self.intern(contents);
        self.emit_constant(Value::Obj(string));
    }

    pub(crate) fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            TokenKind::True => self.emit_op(OpCode::True),
            _ => {}
        }
    }

    pub(crate) fn variable(&mut self, can_assign: bool) {
        let name = self.previous.lexeme;
        self.named_variable(name, can_assign);
    }

    fn named_variable(&mut self, name: &'src str, can_assign: bool) {
        let (get_op, set_op, operand) = match self.function.resolve_local(name) {
            Ok(Some(slot)) => (OpCode::GetLocal, OpCode::SetLocal, slot),
            Ok(None) => {
                let constant = self.identifier_constant(name);
                (OpCode::GetGlobal, OpCode::SetGlobal, constant)
            }
            Err(message) => {
                self.error(message);
                (OpCode::GetLocal, OpCode::SetLocal, 0)
            }
        };

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op_operand(set_op, operand);
        } else {
            self.emit_op_operand(get_op, operand);
        }
    }

    pub(crate) fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);

        match operator {
            TokenKind::Bang => self.emit_op(OpCode::Not),
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            _ => {}
        }
    }

    pub(crate) fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(rule(operator).precedence.next());

        match operator {
            TokenKind::BangEqual => {
                self.emit_op(OpCode::Equal);
                self.emit_op(OpCode::Not);
            }
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => {
                self.emit_op(OpCode::Less);
                self.emit_op(OpCode::Not);
            }
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => {
                self.emit_op(OpCode::Greater);
                self.emit_op(OpCode::Not);
            }
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            _ => {}
        }
    }

    pub(crate) fn call(&mut self, _can_assign: bool) {
        let arg_count = self.argument_list();
        self.emit_op_operand(OpCode::Call, arg_count);
    }

    fn argument_list(&mut self) -> u8 {
        let mut arg_count: usize = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                self.expression();
                if arg_count == MAX_ARITY {
                    self.error("Can't have more than 255 arguments.");
                }
                arg_count += 1;
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.");
        arg_count.min(MAX_ARITY) as u8
    }

    pub(crate) fn dot(&mut self, can_assign: bool) {
        self.consume(TokenKind::Identifier, "Expect property name after '.'.");
        let name = self.previous.lexeme;
        let name = self.identifier_constant(name);

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op_operand(OpCode::SetProperty, name);
        } else {
            self.emit_op_operand(OpCode::GetProperty, name);
        }
    }

    pub(crate) fn and(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);

        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);

        self.patch_jump(end_jump);
    }

    pub(crate) fn or(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);

        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);

        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }
}
