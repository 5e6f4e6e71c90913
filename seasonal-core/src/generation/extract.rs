//! Pull a single JSON artifact out of free-form model output.
//!
//! Extraction is two steps: find a balanced `{...}` span that parses as a JSON
//! object, then deserialize it into the expected shape and run the shape's
//! structural checks. Either step failing is an invalid artifact.

use super::GenerateError;
use crate::types::{MealPlan, Recipe};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Iterator over balanced `{...}` spans, skipping braces inside JSON strings.
struct BraceSpans<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for BraceSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let bytes = self.text.as_bytes();
        loop {
            let start = self.pos + self.text.get(self.pos..)?.find('{')?;
            match balanced_end(&bytes[start..]) {
                Some(len) => {
                    self.pos = start + len;
                    return Some(&self.text[start..start + len]);
                }
                // Unclosed brace: try the next one
                None => self.pos = start + 1,
            }
        }
    }
}

/// Length of the balanced span starting at `bytes[0] == b'{'`, if it closes.
fn balanced_end(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Find the first top-level brace span in `text` that is a JSON object.
pub fn find_json_object(text: &str) -> Option<Map<String, Value>> {
    BraceSpans { text, pos: 0 }.find_map(|span| match serde_json::from_str(span) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    })
}

fn parse_shape<T, V>(text: &str, what: &str, validate: V) -> Result<T, GenerateError>
where
    T: DeserializeOwned,
    V: Fn(&T) -> Result<(), String>,
{
    let object = find_json_object(text).ok_or_else(|| {
        GenerateError::InvalidArtifact(format!("no JSON object found in {} response", what))
    })?;

    let parsed: T = serde_json::from_value(Value::Object(object)).map_err(|e| {
        GenerateError::InvalidArtifact(format!("{} response has the wrong shape: {}", what, e))
    })?;

    validate(&parsed).map_err(|reason| {
        GenerateError::InvalidArtifact(format!("{} failed validation: {}", what, reason))
    })?;

    Ok(parsed)
}

pub fn parse_recipe(text: &str) -> Result<Recipe, GenerateError> {
    parse_shape(text, "recipe", Recipe::validate)
}

pub fn parse_meal_plan(text: &str) -> Result<MealPlan, GenerateError> {
    parse_shape(text, "meal plan", MealPlan::validate)
}
