//! Name validation and canonical caseless keys.
//!
//! Block codes, frame codes, item names, categories, and table keys are all
//! compared through [`normalize`]: canonical decomposition, lowercase fold,
//! canonical composition. Two names are "the same" iff their normalized forms
//! are equal.

use unicode_normalization::UnicodeNormalization;

use crate::status::{CifError, Result};

/// Canonical caseless form of `s`, used as the uniqueness key.
pub fn normalize(s: &str) -> String {
    let folded: String = s.nfd().flat_map(char::to_lowercase).collect();
    folded.nfc().collect()
}

/// `true` if two names compare equal under normalization and case folding.
pub fn same(a: &str, b: &str) -> bool {
    a == b || normalize(a) == normalize(b)
}

/// Characters that may not appear in any CIF name or key.
fn is_disallowed(c: char) -> bool {
    (c.is_control() && c != '\t' && c != '\n' && c != '\r') || c == '\u{FFFE}' || c == '\u{FFFF}'
}

fn is_code_char(c: char) -> bool {
    !c.is_whitespace() && !is_disallowed(c)
}

/// Validate a data block code, returning its normalized key.
pub(crate) fn block_code(code: &str) -> Result<String> {
    if code.is_empty() || !code.chars().all(is_code_char) {
        return Err(CifError::InvalidBlockCode(code.to_string()));
    }
    Ok(normalize(code))
}

/// Validate a save frame code, returning its normalized key.
pub(crate) fn frame_code(code: &str) -> Result<String> {
    if code.is_empty() || !code.chars().all(is_code_char) {
        return Err(CifError::InvalidFrameCode(code.to_string()));
    }
    Ok(normalize(code))
}

/// Validate a data name (`_` followed by at least one non-blank character),
/// returning its normalized key.
pub(crate) fn item_name(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = chars.next() == Some('_')
        && name.len() > 1
        && chars.all(is_code_char);
    if !valid {
        return Err(CifError::InvalidItemName(name.to_string()));
    }
    Ok(normalize(name))
}

/// Validate a table key, returning its normalized form.
pub(crate) fn table_key(key: &str) -> Result<String> {
    if key.chars().any(|c| is_disallowed(c) || c == '\r') {
        return Err(CifError::InvalidIndex(key.to_string()));
    }
    Ok(normalize(key))
}
