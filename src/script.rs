//! Purpose: Parse harness scripts into stack operations and encode integer items.
//! Exports: `Op`, `Step`, `parse_script`, `check_element_width`, `encode_item`, `decode_item`.
//! Role: Binary-private front end; the whole script is validated before anything runs.
//! Invariants: Items are little-endian signed integers exactly `element_size` bytes wide.
//! Invariants: Line numbers are 1-based and count blank and comment lines.

use linkstack::api::{Error, ErrorKind};

pub(crate) const MAX_ITEM_WIDTH: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Op {
    /// `None` is a null element reference.
    Push(Option<i64>),
    Emplace(Option<i64>),
    Pop,
    Peek,
    Size,
    Empty,
    Print,
    Destroy,
}

impl Op {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Op::Push(_) => "push",
            Op::Emplace(_) => "emplace",
            Op::Pop => "pop",
            Op::Peek => "peek",
            Op::Size => "size",
            Op::Empty => "empty",
            Op::Print => "print",
            Op::Destroy => "destroy",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Step {
    pub line: usize,
    pub op: Op,
}

pub(crate) fn check_element_width(element_size: usize) -> Result<(), Error> {
    if (1..=MAX_ITEM_WIDTH).contains(&element_size) {
        return Ok(());
    }
    Err(Error::new(ErrorKind::Usage)
        .with_message(format!(
            "element size {element_size} is not supported for integer items"
        ))
        .with_hint(format!("Use --element-size between 1 and {MAX_ITEM_WIDTH}.")))
}

pub(crate) fn parse_script(text: &str, element_size: usize) -> Result<Vec<Step>, Error> {
    check_element_width(element_size)?;
    let mut steps = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let op = parse_line(content, element_size).map_err(|err| err.with_line(line))?;
        steps.push(Step { line, op });
    }
    Ok(steps)
}

fn parse_line(content: &str, element_size: usize) -> Result<Op, Error> {
    let mut tokens = content.split_whitespace();
    let word = tokens.next().unwrap_or_default().to_ascii_lowercase();
    let arg = tokens.next();
    if let Some(extra) = tokens.next() {
        return Err(usage(format!("unexpected token `{extra}`")));
    }

    let op = match word.as_str() {
        "push" => Op::Push(parse_item(arg, element_size, "push")?),
        "emplace" => Op::Emplace(parse_item(arg, element_size, "emplace")?),
        "pop" => Op::Pop,
        "peek" => Op::Peek,
        "size" => Op::Size,
        "empty" => Op::Empty,
        "print" => Op::Print,
        "destroy" => Op::Destroy,
        other => {
            return Err(usage(format!("unknown operation `{other}`")).with_hint(
                "Known operations: push, emplace, pop, peek, size, empty, print, destroy.",
            ));
        }
    };
    if arg.is_some() && !matches!(op, Op::Push(_) | Op::Emplace(_)) {
        return Err(usage(format!("`{}` takes no argument", op.name())));
    }
    Ok(op)
}

fn parse_item(arg: Option<&str>, element_size: usize, op: &str) -> Result<Option<i64>, Error> {
    let Some(arg) = arg else {
        return Err(usage(format!("`{op}` needs an integer item or `null`")));
    };
    if arg.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let value: i64 = arg
        .parse()
        .map_err(|err| usage(format!("invalid integer item `{arg}`")).with_source(err))?;
    if !item_fits(value, element_size) {
        return Err(usage(format!(
            "item {value} does not fit in {element_size} byte(s)"
        ))
        .with_hint("Raise --element-size or use a smaller item."));
    }
    Ok(Some(value))
}

fn item_fits(value: i64, width: usize) -> bool {
    if width >= MAX_ITEM_WIDTH {
        return true;
    }
    let bits = (width * 8) as u32;
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    (min..=max).contains(&value)
}

pub(crate) fn encode_item(value: i64, width: usize) -> Vec<u8> {
    value.to_le_bytes()[..width].to_vec()
}

/// Sign-extends a little-endian item of up to eight bytes.
pub(crate) fn decode_item(bytes: &[u8]) -> i64 {
    let negative = bytes.last().is_some_and(|byte| byte & 0x80 != 0);
    let mut buf = if negative { [0xFF; 8] } else { [0; 8] };
    let len = bytes.len().min(MAX_ITEM_WIDTH);
    buf[..len].copy_from_slice(&bytes[..len]);
    i64::from_le_bytes(buf)
}

fn usage(message: String) -> Error {
    Error::new(ErrorKind::Usage).with_message(message)
}
