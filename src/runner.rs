//! Purpose: Execute parsed script steps against a `ByteStack`.
//! Exports: `Outcome`, `execute`.
//! Role: The only place the harness mutates a stack.
//! Invariants: A failed operation is recorded as an event and never stops the script.

use linkstack::api::{ByteStack, Error, ErrorKind};

use crate::report::Event;
use crate::script::{Op, Step, decode_item, encode_item};

#[derive(Debug, Default)]
pub(crate) struct Outcome {
    pub events: Vec<Event>,
    pub first_failure: Option<ErrorKind>,
}

pub(crate) fn execute(stack: &mut ByteStack, steps: &[Step]) -> Outcome {
    let mut outcome = Outcome::default();
    for step in steps {
        tracing::trace!(line = step.line, op = step.op.name(), "step");
        match apply(stack, step.op) {
            Ok(Some(event)) => outcome.events.push(event),
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(line = step.line, error = %err, "operation failed");
                outcome.first_failure.get_or_insert(err.kind());
                outcome.events.push(Event::Failed {
                    target: step.op.name(),
                    kind: format!("{:?}", err.kind()),
                    message: err.message().unwrap_or("failed").to_string(),
                    line: step.line,
                });
            }
        }
    }
    outcome
}

fn apply(stack: &mut ByteStack, op: Op) -> Result<Option<Event>, Error> {
    let width = stack.element_size();
    match op {
        Op::Push(item) => {
            let bytes = item.map(|value| encode_item(value, width));
            stack.push(bytes.as_deref())?;
            Ok(None)
        }
        Op::Emplace(item) => {
            let buf = item.map(|value| encode_item(value, width).into_boxed_slice());
            stack.emplace(buf)?;
            Ok(None)
        }
        Op::Pop => {
            stack.pop()?;
            Ok(None)
        }
        Op::Destroy => {
            stack.destroy();
            Ok(None)
        }
        Op::Peek => Ok(Some(Event::Peek { top: top(stack) })),
        Op::Size => Ok(Some(Event::Size { size: stack.len() })),
        Op::Empty => Ok(Some(Event::Empty {
            empty: stack.is_empty(),
        })),
        Op::Print => Ok(Some(Event::Print {
            element_size: width,
            size: stack.len(),
            top: top(stack),
        })),
    }
}

fn top(stack: &ByteStack) -> Option<i64> {
    stack.peek().map(decode_item)
}
