//! Normalization of upstream Memos responses.
//!
//! Two API generations are in the wild. The current one wraps lists in
//! `memos`, names notes `memos/<token>` and uses `createTime`/`updateTime`;
//! the legacy one wraps everything in `data`, uses numeric `id`s and
//! `createdTs`/`updatedTs`. Each field is resolved on its own through an
//! ordered list of sources, so a payload mixing both generations still
//! normalizes field by field.

use serde_json::{Map, Value};

use crate::models::{CreatedNote, Note};

const LIST_KEYS: [&str; 2] = ["memos", "data"];
const SINGLE_KEYS: [&str; 2] = ["memo", "data"];
const IDENTIFIER_KEYS: [&str; 2] = ["name", "id"];
const CREATED_KEYS: [&str; 2] = ["createTime", "createdTs"];
const UPDATED_KEYS: [&str; 2] = ["updateTime", "updatedTs"];

const UNKNOWN_CREATOR: &str = "Unknown";

// Empty strings, zero, false and null count as absent
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn first_present<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| is_present(value))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Note list under `memos`, else `data`, else empty
pub fn extract_note_list(response: &Value) -> &[Value] {
    LIST_KEYS
        .iter()
        .find_map(|key| response.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Single note under `memo`, else `data`, else an empty object
pub fn extract_single_note(response: &Value) -> Map<String, Value> {
    SINGLE_KEYS
        .iter()
        .find_map(|key| response.get(*key).and_then(Value::as_object))
        .cloned()
        .unwrap_or_default()
}

/// Note carried by a create/get response.
///
/// The current API returns the note object itself rather than wrapping it,
/// so a response with its own `name`, `id` or `content` is taken as-is.
pub fn unwrap_note_payload(response: &Value) -> Map<String, Value> {
    match response.as_object() {
        Some(object)
            if ["name", "id", "content"]
                .iter()
                .any(|key| object.get(*key).is_some_and(|v| !v.is_null())) =>
        {
            object.clone()
        }
        _ => extract_single_note(response),
    }
}

pub fn note_identifier(raw: &Value) -> String {
    first_present(raw, &IDENTIFIER_KEYS)
        .and_then(scalar_text)
        .unwrap_or_default()
}

pub fn note_content(raw: &Value) -> String {
    raw.get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn note_created_at(raw: &Value) -> String {
    first_present(raw, &CREATED_KEYS)
        .and_then(scalar_text)
        .unwrap_or_default()
}

pub fn note_updated_at(raw: &Value) -> String {
    first_present(raw, &UPDATED_KEYS)
        .and_then(scalar_text)
        .unwrap_or_default()
}

pub fn note_visibility(raw: &Value) -> Option<String> {
    raw.get("visibility")
        .filter(|v| is_present(v))
        .and_then(scalar_text)
}

/// Creator as a plain string (current) or an object with `nickname` (legacy)
pub fn note_creator(raw: &Value) -> String {
    let creator = match raw.get("creator") {
        Some(Value::Object(object)) => object
            .get("nickname")
            .filter(|v| is_present(v))
            .and_then(scalar_text),
        Some(value) if is_present(value) => scalar_text(value),
        _ => None,
    };
    creator.unwrap_or_else(|| UNKNOWN_CREATOR.to_string())
}

/// Tags as bare strings or as objects with a `name`, flattened to strings
pub fn note_tags(raw: &Value) -> Vec<String> {
    let Some(tags) = raw.get("tags").and_then(Value::as_array) else {
        return Vec::new();
    };

    tags.iter()
        .filter_map(|tag| match tag {
            Value::Object(object) => object.get("name").and_then(scalar_text),
            other => scalar_text(other),
        })
        .filter(|name| !name.is_empty())
        .collect()
}

pub fn to_canonical_note(raw: &Value) -> Note {
    Note {
        identifier: note_identifier(raw),
        content: note_content(raw),
        visibility: note_visibility(raw),
        created_at: note_created_at(raw),
        updated_at: note_updated_at(raw),
        creator: note_creator(raw),
        tags: note_tags(raw),
    }
}

pub fn to_canonical_notes(raw_notes: &[Value]) -> Vec<Note> {
    raw_notes.iter().map(to_canonical_note).collect()
}

pub fn to_create_response(raw: &Value) -> CreatedNote {
    CreatedNote {
        identifier: note_identifier(raw),
        created_at: note_created_at(raw),
        content: note_content(raw),
    }
}
