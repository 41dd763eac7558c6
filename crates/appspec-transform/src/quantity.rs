//! Kubernetes quantity validation
//!
//! `k8s_openapi`'s [`Quantity`] is a plain string wrapper, so sizes written by
//! users are checked here against the apimachinery grammar before they end up
//! in a PVC:
//!
//! ```text
//! <quantity> ::= <sign>? <digits> ( "." <digits>? )? <suffix>
//!              | <sign>? "." <digits> <suffix>
//! <suffix>   ::= "Ki" | "Mi" | "Gi" | "Ti" | "Pi" | "Ei"
//!              | "n" | "u" | "m" | "" | "k" | "M" | "G" | "T" | "P" | "E"
//!              | ("e" | "E") <sign>? <digits>
//! ```

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use thiserror::Error;

const BINARY_SI_SUFFIXES: &[&str] = &["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const DECIMAL_SI_SUFFIXES: &[&str] = &["", "n", "u", "m", "k", "M", "G", "T", "P", "E"];

/// A string that is not a valid Kubernetes quantity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quantity {input:?}: {reason}")]
pub struct QuantityError {
    input: String,
    reason: &'static str,
}

impl QuantityError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }

    /// The rejected input
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Why it was rejected
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

/// Parse a quantity string such as `1Gi`, `500M`, `0.5` or `2e3`.
///
/// The accepted string is returned unchanged inside a [`Quantity`]; the API
/// server canonicalizes it on admission.
pub fn parse_quantity(input: &str) -> Result<Quantity, QuantityError> {
    if input.is_empty() {
        return Err(QuantityError::new(input, "empty quantity"));
    }
    if input.trim() != input {
        return Err(QuantityError::new(input, "surrounding whitespace"));
    }

    let unsigned = input
        .strip_prefix('+')
        .or_else(|| input.strip_prefix('-'))
        .unwrap_or(input);

    let mantissa_len = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (mantissa, suffix) = unsigned.split_at(mantissa_len);

    if !mantissa.chars().any(|c| c.is_ascii_digit()) {
        return Err(QuantityError::new(input, "missing numeric part"));
    }
    if mantissa.matches('.').count() > 1 {
        return Err(QuantityError::new(input, "more than one decimal point"));
    }

    if BINARY_SI_SUFFIXES.contains(&suffix)
        || DECIMAL_SI_SUFFIXES.contains(&suffix)
        || is_decimal_exponent(suffix)
    {
        Ok(Quantity(input.to_string()))
    } else {
        Err(QuantityError::new(input, "unknown suffix"))
    }
}

fn is_decimal_exponent(suffix: &str) -> bool {
    let Some(exponent) = suffix
        .strip_prefix('e')
        .or_else(|| suffix.strip_prefix('E'))
    else {
        return false;
    };
    let digits = exponent
        .strip_prefix('+')
        .or_else(|| exponent.strip_prefix('-'))
        .unwrap_or(exponent);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
