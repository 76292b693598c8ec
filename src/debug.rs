//! # Bytecode Disassembler
//!
//! Renders a [`Chunk`] back to a human-readable instruction listing, used
//! by the CLI's `-d`/`-dd` debug flags. Needs a [`Heap`] reference (not
//! just the `Chunk`) because printing a `CLOSURE` line requires resolving
//! the constant to the `Function` object it names, to read its upvalue
//! count and each upvalue's (local|upvalue) descriptor pair.

use crate::chunk::{Chunk, OpCode};
use crate::heap::Heap;
use crate::object::Obj;

/// Prints every instruction in `chunk` under a `== name ==` header.
pub fn disassemble_chunk(heap: &Heap, chunk: &Chunk, name: &str) {
    println!("== {} ==", name);
    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(heap, chunk, offset);
    }
}

/// Prints one instruction at `offset` as `NNNN [LINE| |] MNEM OPERAND(s)`
/// and returns the offset of the next instruction.
pub fn disassemble_instruction(heap: &Heap, chunk: &Chunk, offset: usize) -> usize {
    print!("{:04} ", offset);
    let line = chunk.get_line(offset);
    if offset > 0 && line == chunk.get_line(offset - 1) {
        print!("   | ");
    } else {
        print!("{:4} ", line);
    }

    let byte = chunk.code[offset];
    let op = match OpCode::from_u8(byte) {
        Some(op) => op,
        None => {
            println!("Unknown opcode {}", byte);
            return offset + 1;
        }
    };

    match op {
        OpCode::Constant => constant_instruction("CONSTANT", heap, chunk, offset),
        OpCode::True => simple_instruction("TRUE", offset),
        OpCode::False => simple_instruction("FALSE", offset),
        OpCode::Null => simple_instruction("NULL", offset),
        OpCode::Pop => simple_instruction("POP", offset),
        OpCode::GetLocal => byte_instruction("GET_LOCAL", chunk, offset),
        OpCode::SetLocal => byte_instruction("SET_LOCAL", chunk, offset),
        OpCode::GetGlobal => constant_instruction("GET_GLOBAL", heap, chunk, offset),
        OpCode::DefineGlobal => constant_instruction("DEFINE_GLOBAL", heap, chunk, offset),
        OpCode::SetGlobal => constant_instruction("SET_GLOBAL", heap, chunk, offset),
        OpCode::GetUpvalue => byte_instruction("GET_UPVALUE", chunk, offset),
        OpCode::SetUpvalue => byte_instruction("SET_UPVALUE", chunk, offset),
        OpCode::CloseUpvalue => simple_instruction("CLOSE_UPVALUE", offset),
        OpCode::Equal => simple_instruction("EQUAL", offset),
        OpCode::Greater => simple_instruction("GREATER", offset),
        OpCode::GreaterEqual => simple_instruction("GREATER_EQUAL", offset),
        OpCode::Less => simple_instruction("LESS", offset),
        OpCode::LessEqual => simple_instruction("LESS_EQUAL", offset),
        OpCode::Add => simple_instruction("ADD", offset),
        OpCode::Subtract => simple_instruction("SUBTRACT", offset),
        OpCode::Multiply => simple_instruction("MULTIPLY", offset),
        OpCode::Divide => simple_instruction("DIVIDE", offset),
        OpCode::Modulo => simple_instruction("MODULO", offset),
        OpCode::Exponent => simple_instruction("EXPONENT", offset),
        OpCode::Concat => simple_instruction("CONCAT", offset),
        OpCode::Not => simple_instruction("NOT", offset),
        OpCode::Negate => simple_instruction("NEGATE", offset),
        OpCode::Output => simple_instruction("OUTPUT", offset),
        OpCode::Jump => jump_instruction("JUMP", 1, chunk, offset),
        OpCode::JumpIfFalse => jump_instruction("JUMP_IF_FALSE", 1, chunk, offset),
        OpCode::Loop => jump_instruction("LOOP", -1, chunk, offset),
        OpCode::Call => byte_instruction("CALL", chunk, offset),
        OpCode::Closure => closure_instruction(heap, chunk, offset),
        OpCode::Return => simple_instruction("RETURN", offset),
    }
}

fn simple_instruction(name: &str, offset: usize) -> usize {
    println!("{}", name);
    offset + 1
}

fn byte_instruction(name: &str, chunk: &Chunk, offset: usize) -> usize {
    let slot = chunk.code[offset + 1];
    println!("{:<16} {:4}", name, slot);
    offset + 2
}

fn constant_instruction(name: &str, heap: &Heap, chunk: &Chunk, offset: usize) -> usize {
    let idx = chunk.code[offset + 1] as usize;
    let value = chunk.constants[idx];
    println!("{:<16} {:4} '{}'", name, idx, render_value(heap, value));
    offset + 2
}

fn jump_instruction(name: &str, sign: i32, chunk: &Chunk, offset: usize) -> usize {
    let hi = chunk.code[offset + 1] as u16;
    let lo = chunk.code[offset + 2] as u16;
    let jump = (hi << 8) | lo;
    let target = if sign < 0 {
        offset as isize + 3 - jump as isize
    } else {
        offset as isize + 3 + jump as isize
    };
    println!("{:<16} {:4} -> {}", name, offset, target);
    offset + 3
}

fn closure_instruction(heap: &Heap, chunk: &Chunk, offset: usize) -> usize {
    let idx = chunk.code[offset + 1] as usize;
    let value = chunk.constants[idx];
    println!("{:<16} {:4} '{}'", "CLOSURE", idx, render_value(heap, value));

    let mut pos = offset + 2;
    let upvalue_count = match value.as_object().map(|id| heap.get(id)) {
        Some(Obj::Function(f)) => f.upvalue_count,
        _ => 0,
    };
    for _ in 0..upvalue_count {
        let is_local = chunk.code[pos];
        let index = chunk.code[pos + 1];
        let kind = if is_local == 1 { "local" } else { "upvalue" };
        println!("{:04}      |                     ({}) {}", pos, kind, index);
        pos += 2;
    }
    pos
}

fn render_value(heap: &Heap, value: crate::value::Value) -> String {
    use crate::value::Value;
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(id) => match heap.get(id) {
            Obj::String(s) => s.chars.clone(),
            Obj::Function(f) => format!(
                "<fn {}>",
                f.name
                    .and_then(|n| match heap.get(n) {
                        Obj::String(s) => Some(s.chars.clone()),
                        _ => None,
                    })
                    .unwrap_or_else(|| "script".to_string())
            ),
            other => format!("<{}>", other.kind_name()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use std::collections::HashMap;

    /// Every opcode's operand width must match its declared arity: walking
    /// `disassemble_instruction` from 0 must land exactly on
    /// `chunk.code.len()`, never short or long, for any compiled program.
    fn assert_disassembles_cleanly(source: &str) {
        let mut heap = Heap::new();
        let globals = HashMap::new();
        let function = compile(source, &mut heap, &globals).expect("source must compile");

        let mut offset = 0;
        while offset < function.chunk.code.len() {
            let next = disassemble_instruction(&heap, &function.chunk, offset);
            assert!(next > offset, "disassembler made no progress at {}", offset);
            offset = next;
        }
        assert_eq!(offset, function.chunk.code.len());
    }

    #[test]
    fn disassembles_arithmetic_and_globals_cleanly() {
        assert_disassembles_cleanly("let x = 1 + 2 * 3; output x;");
    }

    #[test]
    fn disassembles_control_flow_cleanly() {
        assert_disassembles_cleanly(
            r#"
            let total = 0;
            for (let i = 0; i < 5; i = i + 1)
                if (i < 2) then total = total + i; endif
            endfor
            output total;
            "#,
        );
    }

    #[test]
    fn disassembles_closures_cleanly() {
        assert_disassembles_cleanly(
            r#"
            func makeCounter()
                let n = 0;
                func step()
                    n = n + 1;
                    return n;
                endfunc
                return step;
            endfunc
            let c = makeCounter();
            output c();
            "#,
        );
    }
}
