// entities.rs — entity lump text parser.
//
// The entity lump is a flat text blob of `{ "key" "value" ... }` blocks,
// one keyvalue per line. Quoted strings may contain braces, so brace depth
// is only tracked outside quotes. Values may contain quotes too: compilers
// never escape them, so only a quote at its line's end closes a value. An
// unbalanced lump is a decode error rather than a best-effort partial
// result.

use crate::error::{BspError, Result};
use unbsp_common::map::Entity;

/// Values with this many commas are I/O connections, not plain keyvalues.
/// Source entity outputs are comma-separated five-tuples; newer branches
/// use an ESC separator instead.
const CONNECTION_MIN_COMMAS: usize = 4;
const CONNECTION_SEPARATOR: char = '\x1b';

pub fn parse_entities(bytes: &[u8]) -> Result<Vec<Entity>> {
    let text = String::from_utf8_lossy(bytes);
    let mut entities = Vec::new();

    let mut current: Option<Entity> = None;
    let mut pending_key: Option<String> = None;
    let mut in_quote = false;
    let mut token = String::new();

    for (offset, ch) in text.char_indices() {
        if in_quote {
            if ch == '"' {
                // Inside a value, an interior quote is literal text; the
                // closing quote is the one that ends the line.
                if pending_key.is_some() && !ends_line(&text[offset + 1..]) {
                    token.push(ch);
                    continue;
                }
                in_quote = false;
                match (&mut current, pending_key.take()) {
                    (Some(entity), Some(key)) => {
                        push_pair(entity, key, std::mem::take(&mut token));
                    }
                    (Some(_), None) => pending_key = Some(std::mem::take(&mut token)),
                    // Tokens outside any block are compiler padding; drop them.
                    (None, _) => token.clear(),
                }
            } else {
                token.push(ch);
            }
            continue;
        }
        match ch {
            '"' => in_quote = true,
            '{' => {
                if current.is_some() {
                    return Err(BspError::BraceMismatch { offset });
                }
                current = Some(Entity::default());
            }
            '}' => {
                let Some(entity) = current.take() else {
                    return Err(BspError::BraceMismatch { offset });
                };
                pending_key = None;
                entities.push(entity);
            }
            // NUL padding after the final block is routine.
            _ => {}
        }
    }
    if in_quote || current.is_some() {
        return Err(BspError::BraceMismatch { offset: bytes.len() });
    }
    Ok(entities)
}

/// True when nothing but trailing whitespace or NUL padding separates this
/// position from the next line break (or the end of the lump).
fn ends_line(rest: &str) -> bool {
    for ch in rest.chars() {
        match ch {
            ' ' | '\t' | '\r' | '\0' => {}
            '\n' => return true,
            _ => return false,
        }
    }
    true
}

fn push_pair(entity: &mut Entity, key: String, value: String) {
    if is_connection(&value) {
        entity.connections.push(format!("{key}\t{value}"));
    } else {
        entity.set(&key, value);
    }
}

fn is_connection(value: &str) -> bool {
    value.contains(CONNECTION_SEPARATOR)
        || value.matches(',').count() >= CONNECTION_MIN_COMMAS
}
