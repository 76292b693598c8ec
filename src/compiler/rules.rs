//! Pratt parsing table and expression-parsing methods. Precedence ladder:
//! `ASSIGNMENT < OR < AND < EQUALITY < COMPARISON < TERM < FACTOR < POWER
//! < UNARY < CALL < PRIMARY`, with `POWER` right-associative.

use super::Compiler;
use crate::chunk::OpCode;
use crate::error::CompileErrorKind;
use crate::scanner::{Token, TokenKind};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Power,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Power,
            Precedence::Power => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => Precedence::Primary,
        }
    }
}

type ParseFn = for<'h> fn(&mut Compiler<'h>, bool);

struct ParseRule {
    prefix: Option<ParseFn>,
    infix: Option<ParseFn>,
    precedence: Precedence,
}

fn rule(kind: TokenKind) -> ParseRule {
    use TokenKind::*;
    match kind {
        LeftParen => ParseRule {
            prefix: Some(Compiler::grouping),
            infix: Some(Compiler::call),
            precedence: Precedence::Call,
        },
        Dot => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Term,
        },
        Minus => ParseRule {
            prefix: Some(Compiler::unary),
            infix: Some(Compiler::binary),
            precedence: Precedence::Term,
        },
        Plus => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Term,
        },
        Slash | Star | Percent => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Factor,
        },
        Caret => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Power,
        },
        Bang => ParseRule {
            prefix: Some(Compiler::unary),
            infix: None,
            precedence: Precedence::None,
        },
        BangEqual | EqualEqual => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Equality,
        },
        Greater | GreaterEqual | Less | LessEqual => ParseRule {
            prefix: None,
            infix: Some(Compiler::binary),
            precedence: Precedence::Comparison,
        },
        Number => ParseRule {
            prefix: Some(Compiler::number),
            infix: None,
            precedence: Precedence::None,
        },
        String => ParseRule {
            prefix: Some(Compiler::string),
            infix: None,
            precedence: Precedence::None,
        },
        Ident => ParseRule {
            prefix: Some(Compiler::variable),
            infix: None,
            precedence: Precedence::None,
        },
        True | False | Null => ParseRule {
            prefix: Some(Compiler::literal),
            infix: None,
            precedence: Precedence::None,
        },
        And => ParseRule {
            prefix: None,
            infix: Some(Compiler::and),
            precedence: Precedence::And,
        },
        Or => ParseRule {
            prefix: None,
            infix: Some(Compiler::or),
            precedence: Precedence::Or,
        },
        _ => ParseRule {
            prefix: None,
            infix: None,
            precedence: Precedence::None,
        },
    }
}

impl<'h> Compiler<'h> {
    pub(super) fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let prefix = rule(self.previous.kind).prefix;
        let prefix = match prefix {
            Some(f) => f,
            None => {
                self.error("Expect expression.");
                return;
            }
        };
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= rule(self.current.kind).precedence {
            self.advance();
            let infix = rule(self.previous.kind).infix.expect("infix rule must exist");
            infix(self, can_assign);
        }

        if can_assign && self.match_tok(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn number(&mut self, _can_assign: bool) {
        let value: f64 = self.previous.lexeme.parse().unwrap_or(0.0);
        self.emit_constant(Value::Number(value));
    }

    fn string(&mut self, _can_assign: bool) {
        let contents = self.previous.lexeme.clone();
        let id = self.intern(contents);
        self.emit_constant(Value::Object(id));
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::True => self.emit_op(OpCode::True),
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Null => self.emit_op(OpCode::Null),
            _ => unreachable!("literal() called on non-literal token"),
        }
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!("unary() called on non-unary token"),
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        let r = rule(operator);
        // `^` is right-associative: parse the RHS at the same precedence
        // rather than one level higher.
        let next = if operator == TokenKind::Caret {
            r.precedence
        } else {
            r.precedence.next()
        };
        self.parse_precedence(next);
        match operator {
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            TokenKind::Percent => self.emit_op(OpCode::Modulo),
            TokenKind::Caret => self.emit_op(OpCode::Exponent),
            TokenKind::Dot => self.emit_op(OpCode::Concat),
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::BangEqual => {
                self.emit_op(OpCode::Equal);
                self.emit_op(OpCode::Not);
            }
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_op(OpCode::GreaterEqual),
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => self.emit_op(OpCode::LessEqual),
            _ => unreachable!("binary() called on non-operator token"),
        }
    }

    fn and(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn call(&mut self, _can_assign: bool) {
        let argc = self.argument_list();
        self.emit_bytes(OpCode::Call, argc);
    }

    fn argument_list(&mut self) -> u8 {
        let mut count: u32 = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                self.expression();
                if count == 255 {
                    self.error_kind(CompileErrorKind::TooManyArguments);
                }
                count += 1;
                if !self.match_tok(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.");
        count.min(255) as u8
    }

    fn variable(&mut self, can_assign: bool) {
        let name = self.previous.clone();
        self.named_variable(name, can_assign);
    }

    fn named_variable(&mut self, name: Token, can_assign: bool) {
        enum Target {
            Local(u8),
            Upvalue(u8),
            Global(u8),
        }

        let fc_index = self.stack.len() - 1;
        let target = if let Some(slot) = self.resolve_local(fc_index, &name.lexeme) {
            Target::Local(slot)
        } else if let Some(idx) = self.resolve_upvalue(fc_index, &name.lexeme) {
            Target::Upvalue(idx)
        } else {
            let id = self.intern(name.lexeme.clone());
            Target::Global(self.make_constant(Value::Object(id)))
        };

        if can_assign && self.match_tok(TokenKind::Equal) {
            self.expression();
            match target {
                Target::Local(slot) => self.emit_bytes(OpCode::SetLocal, slot),
                Target::Upvalue(idx) => self.emit_bytes(OpCode::SetUpvalue, idx),
                Target::Global(idx) => self.emit_bytes(OpCode::SetGlobal, idx),
            }
        } else {
            match target {
                Target::Local(slot) => self.emit_bytes(OpCode::GetLocal, slot),
                Target::Upvalue(idx) => self.emit_bytes(OpCode::GetUpvalue, idx),
                Target::Global(idx) => self.emit_bytes(OpCode::GetGlobal, idx),
            }
        }
    }

    fn emit_constant(&mut self, value: Value) {
        let idx = self.make_constant(value);
        self.emit_bytes(OpCode::Constant, idx);
    }
}
