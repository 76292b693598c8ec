//! # Single-Pass Compiler
//!
//! Parses source directly into bytecode with no intermediate AST. A
//! [`Compiler`] owns an explicit stack of [`FunctionCompiler`] frames (one
//! per nested `func`) rather than recursing through a linked `enclosing`
//! pointer — this "compiler chain" is what lets the top-level driver
//! enumerate every in-progress function's constants as GC roots (see
//! `maybe_collect`) without unsafe pointer-walking.
//!
//! `rules` holds the Pratt parsing table and every expression-parsing
//! method; this module holds the driver, statement/declaration parsing, and
//! scope/local/upvalue bookkeeping.

mod rules;

use std::collections::HashMap;

use crate::chunk::{Chunk, OpCode};
use crate::error::{CompileError, CompileErrorKind};
use crate::gc;
use crate::heap::Heap;
use crate::object::{ObjFunction, ObjId, UpvalueDesc};
use crate::scanner::{Scanner, Token, TokenKind};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Script,
    Function,
}

struct Local {
    name: String,
    /// -1 while the initializer is still being compiled.
    depth: i32,
    is_captured: bool,
}

struct LoopCtx {
    loop_start: usize,
    scope_depth: i32,
    break_jumps: Vec<usize>,
}

struct FunctionCompiler {
    function: ObjFunction,
    kind: FunctionKind,
    locals: Vec<Local>,
    upvalues: Vec<UpvalueDesc>,
    scope_depth: i32,
    loops: Vec<LoopCtx>,
}

impl FunctionCompiler {
    fn new(function: ObjFunction, kind: FunctionKind) -> Self {
        // Slot 0 is reserved for the running closure itself: frame base
        // slot 0 holds the callee.
        let locals = vec![Local {
            name: String::new(),
            depth: 0,
            is_captured: false,
        }];
        FunctionCompiler {
            function,
            kind,
            locals,
            upvalues: Vec::new(),
            scope_depth: 0,
            loops: Vec::new(),
        }
    }
}

/// Drives scanning and parsing to produce the top-level script's
/// [`ObjFunction`]. Borrows the shared [`Heap`] (for interning strings and
/// allocating nested function objects) and a read-only view of the VM's
/// global table (so a compile-time collection can't sweep a global a
/// previous REPL line defined).
pub struct Compiler<'h> {
    scanner: Scanner<'h>,
    previous: Token,
    current: Token,
    had_error: bool,
    panic_mode: bool,
    errors: Vec<CompileError>,
    stack: Vec<FunctionCompiler>,
    heap: &'h mut Heap,
    globals: &'h HashMap<ObjId, Value>,
}

impl<'h> Compiler<'h> {
    fn new(source: &'h str, heap: &'h mut Heap, globals: &'h HashMap<ObjId, Value>) -> Self {
        let scanner = Scanner::new(source);
        let placeholder = Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            line: 0,
            column: 0,
        };
        let mut compiler = Compiler {
            scanner,
            previous: placeholder.clone(),
            current: placeholder,
            had_error: false,
            panic_mode: false,
            errors: Vec::new(),
            stack: vec![FunctionCompiler::new(ObjFunction::new(None), FunctionKind::Script)],
            heap,
            globals,
        };
        compiler.advance();
        compiler
    }

    fn current_fc(&self) -> &FunctionCompiler {
        self.stack.last().expect("compiler stack never empty")
    }

    fn current_fc_mut(&mut self) -> &mut FunctionCompiler {
        self.stack.last_mut().expect("compiler stack never empty")
    }

    fn current_chunk_mut(&mut self) -> &mut Chunk {
        &mut self.current_fc_mut().function.chunk
    }

    // ---- token stream -----------------------------------------------

    fn advance(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Err {
                break;
            }
            let message = self.current.lexeme.clone();
            self.error_at_current_raw(&message);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_tok(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    // ---- error reporting ----------------------------------------------

    fn error_at_current(&mut self, message: &str) {
        let kind = CompileErrorKind::Expected(message.to_string());
        self.error_at(self.current.clone(), kind);
    }

    fn error_at_current_raw(&mut self, message: &str) {
        let kind = if message == "Unterminated string." {
            CompileErrorKind::UnterminatedString
        } else {
            CompileErrorKind::UnexpectedCharacter
        };
        self.error_at(self.current.clone(), kind);
    }

    fn error(&mut self, message: &str) {
        let kind = CompileErrorKind::Expected(message.to_string());
        self.error_at(self.previous.clone(), kind);
    }

    fn error_kind(&mut self, kind: CompileErrorKind) {
        self.error_at(self.previous.clone(), kind);
    }

    fn error_at(&mut self, token: Token, kind: CompileErrorKind) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        let lexeme = if token.kind == TokenKind::Eof {
            String::new()
        } else {
            token.lexeme
        };
        self.errors.push(CompileError {
            kind,
            line: token.line,
            column: token.column,
            lexeme,
        });
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Func
                | TokenKind::Let
                | TokenKind::For
                | TokenKind::While
                | TokenKind::If
                | TokenKind::Output
                | TokenKind::Return
                | TokenKind::Block
                | TokenKind::Break
                | TokenKind::Continue => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ---- bytecode emission ---------------------------------------------

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.current_chunk_mut().write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op as u8);
    }

    fn emit_bytes(&mut self, op: OpCode, operand: u8) {
        self.emit_op(op);
        self.emit_byte(operand);
    }

    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.current_chunk_mut().code.len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let jump = self.current_chunk_mut().code.len() - offset - 2;
        if jump > u16::MAX as usize {
            self.error_kind(CompileErrorKind::JumpTooLarge);
        }
        let chunk = self.current_chunk_mut();
        chunk.code[offset] = ((jump >> 8) & 0xff) as u8;
        chunk.code[offset + 1] = (jump & 0xff) as u8;
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::Loop);
        let offset = self.current_chunk_mut().code.len() - loop_start + 2;
        if offset > u16::MAX as usize {
            self.error_kind(CompileErrorKind::LoopBodyTooLarge);
        }
        self.emit_byte(((offset >> 8) & 0xff) as u8);
        self.emit_byte((offset & 0xff) as u8);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let idx = self.current_chunk_mut().add_constant(value);
        if idx > u8::MAX as usize {
            self.error_kind(CompileErrorKind::TooManyConstants);
            return 0;
        }
        idx as u8
    }

    // ---- compile-time heap access (with a GC safe point on every call) --

    fn intern(&mut self, s: String) -> ObjId {
        let id = self.heap.alloc_string(s);
        self.maybe_collect();
        id
    }

    /// Checks the allocation threshold after every compile-time heap write
    /// and, if crossed, runs a collection rooted at the persistent globals
    /// plus every function still under construction in every active
    /// compiler frame.
    fn maybe_collect(&mut self) {
        if !self.heap.should_collect() {
            return;
        }
        let mut value_roots: Vec<Value> = self.globals.values().copied().collect();
        let mut object_roots: Vec<ObjId> = self.globals.keys().copied().collect();
        for fc in &self.stack {
            if let Some(name) = fc.function.name {
                object_roots.push(name);
            }
            for c in &fc.function.chunk.constants {
                value_roots.push(*c);
            }
        }
        gc::mark_roots_and_collect(self.heap, &value_roots, &object_roots);
    }

    // ---- scope / local / upvalue bookkeeping ----------------------------

    fn begin_scope(&mut self) {
        self.current_fc_mut().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        let fc = self.current_fc_mut();
        fc.scope_depth -= 1;
        let depth = fc.scope_depth;
        while let Some(local) = fc.locals.last() {
            if local.depth <= depth {
                break;
            }
            let captured = local.is_captured;
            fc.locals.pop();
            if captured {
                self.emit_op(OpCode::CloseUpvalue);
            } else {
                self.emit_op(OpCode::Pop);
            }
        }
    }

    fn declare_variable(&mut self, name: &str) {
        if self.current_fc().scope_depth == 0 {
            return;
        }
        let depth = self.current_fc().scope_depth;
        let mut duplicate = None;
        for local in self.current_fc().locals.iter().rev() {
            if local.depth != -1 && local.depth < depth {
                break;
            }
            if local.name == name {
                duplicate = Some(name.to_string());
                break;
            }
        }
        if let Some(dup) = duplicate {
            self.error_kind(CompileErrorKind::DuplicateLocal(dup));
            return;
        }
        let fc = self.current_fc_mut();
        if fc.locals.len() >= 256 {
            self.error_kind(CompileErrorKind::TooManyLocals);
            return;
        }
        self.current_fc_mut().locals.push(Local {
            name: name.to_string(),
            depth: -1,
            is_captured: false,
        });
    }

    fn mark_initialized(&mut self) {
        let fc = self.current_fc_mut();
        if fc.scope_depth == 0 {
            return;
        }
        let depth = fc.scope_depth;
        if let Some(local) = fc.locals.last_mut() {
            local.depth = depth;
        }
    }

    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::Ident, message);
        let name = self.previous.lexeme.clone();
        self.declare_variable(&name);
        if self.current_fc().scope_depth > 0 {
            return 0;
        }
        let id = self.intern(name);
        self.make_constant(Value::Object(id))
    }

    fn define_variable(&mut self, global: u8) {
        if self.current_fc().scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_bytes(OpCode::DefineGlobal, global);
    }

    fn resolve_local(&mut self, fc_index: usize, name: &str) -> Option<u8> {
        let fc = &self.stack[fc_index];
        for (i, local) in fc.locals.iter().enumerate().rev() {
            if local.name == name {
                if local.depth == -1 {
                    self.error_kind(CompileErrorKind::ReadInOwnInitializer);
                }
                return Some(i as u8);
            }
        }
        None
    }

    fn resolve_upvalue(&mut self, fc_index: usize, name: &str) -> Option<u8> {
        if fc_index == 0 {
            return None;
        }
        if let Some(local_idx) = self.resolve_local(fc_index - 1, name) {
            self.stack[fc_index - 1].locals[local_idx as usize].is_captured = true;
            return Some(self.add_upvalue(fc_index, local_idx, true));
        }
        if let Some(up_idx) = self.resolve_upvalue(fc_index - 1, name) {
            return Some(self.add_upvalue(fc_index, up_idx, false));
        }
        None
    }

    fn add_upvalue(&mut self, fc_index: usize, index: u8, is_local: bool) -> u8 {
        let fc = &mut self.stack[fc_index];
        for (i, uv) in fc.upvalues.iter().enumerate() {
            if uv.index == index && uv.is_local == is_local {
                return i as u8;
            }
        }
        if fc.upvalues.len() >= 256 {
            self.error_kind(CompileErrorKind::TooManyUpvalues);
            return 0;
        }
        fc.upvalues.push(UpvalueDesc { is_local, index });
        fc.function.upvalue_count = fc.upvalues.len() as u8;
        (fc.upvalues.len() - 1) as u8
    }

    // ---- loop bookkeeping (break/continue) -----------------------------

    fn push_loop(&mut self, loop_start: usize) {
        let depth = self.current_fc().scope_depth;
        self.current_fc_mut().loops.push(LoopCtx {
            loop_start,
            scope_depth: depth,
            break_jumps: Vec::new(),
        });
    }

    fn pop_loop_patch_breaks(&mut self) {
        let ctx = self.current_fc_mut().loops.pop().expect("loop stack underflow");
        for offset in ctx.break_jumps {
            self.patch_jump(offset);
        }
    }

    // ---- declarations & statements --------------------------------------

    fn declaration(&mut self) {
        if self.match_tok(TokenKind::Func) {
            self.func_declaration();
        } else if self.match_tok(TokenKind::Let) {
            self.finish_let_declaration();
        } else {
            self.statement();
        }
        if self.panic_mode {
            self.synchronize();
        }
    }

    fn func_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        self.mark_initialized();
        self.compile_function(FunctionKind::Function);
        self.define_variable(global);
    }

    fn compile_function(&mut self, kind: FunctionKind) {
        let name = self.previous.lexeme.clone();
        let name_id = self.intern(name);
        self.stack
            .push(FunctionCompiler::new(ObjFunction::new(Some(name_id)), kind));
        self.begin_scope();

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.");
        let mut arity: usize = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                arity += 1;
                if arity > 255 {
                    self.error_kind(CompileErrorKind::TooManyParameters);
                }
                let constant = self.parse_variable("Expect parameter name.");
                self.define_variable(constant);
                if !self.match_tok(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.");
        self.current_fc_mut().function.arity = arity.min(255) as u8;

        while !self.check(TokenKind::Endfunc) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::Endfunc, "Expect 'endfunc'.");
        self.emit_op(OpCode::Null);
        self.emit_op(OpCode::Return);

        let fc = self.stack.pop().expect("pushed function compiler above");
        let upvalues = fc.upvalues.clone();
        let func_id = self.heap.alloc_function(fc.function);
        self.maybe_collect();
        let const_idx = self.make_constant(Value::Object(func_id));
        self.emit_bytes(OpCode::Closure, const_idx);
        for uv in &upvalues {
            self.emit_byte(if uv.is_local { 1 } else { 0 });
            self.emit_byte(uv.index);
        }
    }

    fn finish_let_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");
        if self.match_tok(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Null);
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.");
        self.define_variable(global);
    }

    fn statement(&mut self) {
        if self.match_tok(TokenKind::Output) {
            self.output_statement();
        } else if self.match_tok(TokenKind::Return) {
            self.return_statement();
        } else if self.match_tok(TokenKind::Continue) {
            self.continue_statement();
        } else if self.match_tok(TokenKind::Break) {
            self.break_statement();
        } else if self.match_tok(TokenKind::For) {
            self.for_statement();
        } else if self.match_tok(TokenKind::While) {
            self.while_statement();
        } else if self.match_tok(TokenKind::If) {
            self.if_statement();
        } else if self.match_tok(TokenKind::Block) {
            self.block_statement();
        } else {
            self.expression_statement();
        }
    }

    fn output_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(OpCode::Output);
    }

    fn return_statement(&mut self) {
        if self.current_fc().kind == FunctionKind::Script {
            self.error_kind(CompileErrorKind::ReturnFromTopLevel);
        }
        if self.match_tok(TokenKind::Semicolon) {
            self.emit_op(OpCode::Null);
            self.emit_op(OpCode::Return);
            return;
        }
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.");
        self.emit_op(OpCode::Return);
    }

    fn continue_statement(&mut self) {
        self.consume(TokenKind::Semicolon, "Expect ';' after 'continue'.");
        if self.current_fc().loops.is_empty() {
            self.error_kind(CompileErrorKind::ContinueOutsideLoop);
            return;
        }
        self.pop_locals_above_loop_scope();
        let loop_start = self.current_fc().loops.last().unwrap().loop_start;
        self.emit_loop(loop_start);
    }

    fn break_statement(&mut self) {
        self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.");
        if self.current_fc().loops.is_empty() {
            self.error_kind(CompileErrorKind::BreakOutsideLoop);
            return;
        }
        self.pop_locals_above_loop_scope();
        let offset = self.emit_jump(OpCode::Jump);
        self.current_fc_mut().loops.last_mut().unwrap().break_jumps.push(offset);
    }

    /// Pops (via `OP_POP`/`OP_CLOSE_UPVALUE`) every local declared since the
    /// innermost loop started, without touching the compiler's own `locals`
    /// bookkeeping — `break`/`continue` jump out of/back to a point where
    /// those locals logically go out of scope, but the surrounding block's
    /// `end_scope` still owns removing them from the compiler's view.
    fn pop_locals_above_loop_scope(&mut self) {
        let loop_depth = self.current_fc().loops.last().unwrap().scope_depth;
        let count = self
            .current_fc()
            .locals
            .iter()
            .rev()
            .take_while(|l| l.depth > loop_depth)
            .count();
        let captured: Vec<bool> = {
            let fc = self.current_fc();
            let len = fc.locals.len();
            (len - count..len).map(|i| fc.locals[i].is_captured).collect()
        };
        for is_captured in captured.into_iter().rev() {
            if is_captured {
                self.emit_op(OpCode::CloseUpvalue);
            } else {
                self.emit_op(OpCode::Pop);
            }
        }
    }

    fn block_statement(&mut self) {
        self.begin_scope();
        while !self.check(TokenKind::Endblock) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::Endblock, "Expect 'endblock'.");
        self.end_scope();
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        if self.match_tok(TokenKind::Then) {
            let else_jump = self.emit_jump(OpCode::JumpIfFalse);
            self.emit_op(OpCode::Pop);
            self.statement();
            self.patch_jump(else_jump);
            self.emit_op(OpCode::Pop);
            return;
        }

        let mut end_jumps = Vec::new();
        loop {
            let else_jump = self.emit_jump(OpCode::JumpIfFalse);
            self.emit_op(OpCode::Pop);
            while !self.check(TokenKind::Elseif)
                && !self.check(TokenKind::Else)
                && !self.check(TokenKind::Endif)
                && !self.check(TokenKind::Eof)
            {
                self.declaration();
            }
            end_jumps.push(self.emit_jump(OpCode::Jump));
            self.patch_jump(else_jump);
            self.emit_op(OpCode::Pop);
            if self.match_tok(TokenKind::Elseif) {
                self.consume(TokenKind::LeftParen, "Expect '(' after 'elseif'.");
                self.expression();
                self.consume(TokenKind::RightParen, "Expect ')' after condition.");
                continue;
            }
            break;
        }
        if self.match_tok(TokenKind::Else) {
            while !self.check(TokenKind::Endif) && !self.check(TokenKind::Eof) {
                self.declaration();
            }
        }
        self.consume(TokenKind::Endif, "Expect 'endif'.");
        for offset in end_jumps {
            self.patch_jump(offset);
        }
    }

    fn while_statement(&mut self) {
        let loop_start = self.current_chunk_mut().code.len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.push_loop(loop_start);

        if self.match_tok(TokenKind::Then) {
            self.statement();
        } else {
            while !self.check(TokenKind::Endwhile) && !self.check(TokenKind::Eof) {
                self.declaration();
            }
            self.consume(TokenKind::Endwhile, "Expect 'endwhile'.");
        }
        self.emit_loop(loop_start);
        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
        self.pop_loop_patch_breaks();
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");

        if self.match_tok(TokenKind::Semicolon) {
            // no initializer
        } else if self.match_tok(TokenKind::Let) {
            self.finish_let_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.current_chunk_mut().code.len();
        let mut exit_jump = None;
        if !self.check(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");
            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        } else {
            self.advance();
        }

        if !self.check(TokenKind::RightParen) {
            let body_jump = self.emit_jump(OpCode::Jump);
            let increment_start = self.current_chunk_mut().code.len();
            self.expression();
            self.emit_op(OpCode::Pop);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.");
            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        } else {
            self.advance();
        }

        self.push_loop(loop_start);
        if self.match_tok(TokenKind::Then) {
            self.statement();
        } else {
            while !self.check(TokenKind::Endfor) && !self.check(TokenKind::Eof) {
                self.declaration();
            }
            self.consume(TokenKind::Endfor, "Expect 'endfor'.");
        }
        self.emit_loop(loop_start);
        if let Some(offset) = exit_jump {
            self.patch_jump(offset);
            self.emit_op(OpCode::Pop);
        }
        self.pop_loop_patch_breaks();
        self.end_scope();
    }
}

/// Compiles `source` into the top-level script's [`ObjFunction`].
///
/// `globals` lets a compile-time collection (triggered by string interning
/// or nested-function allocation, see [`Compiler::maybe_collect`]) see every
/// value a previous REPL line has already defined, so it isn't swept out
/// from under the program.
pub fn compile(
    source: &str,
    heap: &mut Heap,
    globals: &HashMap<ObjId, Value>,
) -> Result<ObjFunction, Vec<CompileError>> {
    let mut compiler = Compiler::new(source, heap, globals);
    while !compiler.match_tok(TokenKind::Eof) {
        compiler.declaration();
    }
    compiler.emit_op(OpCode::Null);
    compiler.emit_op(OpCode::Return);

    if compiler.had_error {
        Err(compiler.errors)
    } else {
        let fc = compiler.stack.pop().expect("script compiler frame");
        Ok(fc.function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_src(source: &str) -> Result<ObjFunction, Vec<CompileError>> {
        let mut heap = Heap::new();
        let globals = HashMap::new();
        compile(source, &mut heap, &globals)
    }

    #[test]
    fn simple_expression_statement_compiles() {
        assert!(compile_src("output 1 + 2;").is_ok());
    }

    #[test]
    fn more_than_255_parameters_is_a_compile_error() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("func f({}) return 0; endfunc", params.join(", "));
        let errors = compile_src(&source).expect_err("256 parameters must fail to compile");
        assert!(errors
            .iter()
            .any(|e| e.kind == CompileErrorKind::TooManyParameters));
    }

    #[test]
    fn exactly_255_parameters_compiles() {
        let params: Vec<String> = (0..255).map(|i| format!("p{}", i)).collect();
        let source = format!("func f({}) return 0; endfunc", params.join(", "));
        assert!(compile_src(&source).is_ok());
    }

    #[test]
    fn reading_local_in_its_own_initializer_is_a_compile_error() {
        let errors = compile_src("block let x = x; endblock")
            .expect_err("self-referential initializer must fail to compile");
        assert!(errors
            .iter()
            .any(|e| e.kind == CompileErrorKind::ReadInOwnInitializer));
    }

    #[test]
    fn break_outside_loop_is_a_compile_error() {
        let errors = compile_src("break;").expect_err("break outside a loop must fail to compile");
        assert!(errors
            .iter()
            .any(|e| e.kind == CompileErrorKind::BreakOutsideLoop));
    }
}
