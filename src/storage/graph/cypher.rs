//! Cypher identifier escaping.
//!
//! Labels, relationship types and property keys cannot be passed as query
//! parameters, so they are interpolated as backtick-quoted identifiers.
//! Embedded backticks are doubled, which is the only escape Cypher accepts
//! inside a quoted identifier. Values never go through this module; they are
//! always bound as parameters.

use crate::{Error, Result};

/// Maximum identifier length accepted from clients.
const MAX_IDENTIFIER_LEN: usize = 256;

/// Quotes `name` as a Cypher identifier.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the name is blank, too long, or
/// contains control characters.
pub fn escape_identifier(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("identifier must not be empty".to_string()));
    }
    if name.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(Error::InvalidInput(format!(
            "identifier exceeds {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(Error::InvalidInput(
            "identifier must not contain control characters".to_string(),
        ));
    }
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Renders a label list as `:`A`:`B``.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if any label is invalid.
pub fn label_expression<S: AsRef<str>>(labels: &[S]) -> Result<String> {
    labels.iter().try_fold(String::new(), |mut acc, label| {
        acc.push(':');
        acc.push_str(&escape_identifier(label.as_ref())?);
        Ok(acc)
    })
}

/// Splits a comma-separated label list, dropping blanks.
#[must_use]
pub fn split_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(ToString::to_string)
        .collect()
}
