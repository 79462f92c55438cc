//! Field validators shared by tags, users and recipes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

/// Latin letters, digits, `-` and `_`.
pub static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

/// Word characters plus `.`, `@`, `+` and `-`.
pub static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap());

/// Largest value a positive small integer column holds.
pub const MAX_SMALL_INT: i32 = 32767;

pub const MIN_AMOUNT_MESSAGE: &str = "Minimum amount is 1";
pub const MIN_COOKING_TIME_MESSAGE: &str = "Minimum cooking time is 1 minute";

/// Accepts `#rgb` and `#rrggbb`, case-insensitive.
pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    if HEX_COLOR_RE.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("hex_color");
        err.message = Some(Cow::from("The color can only be recorded in HEX format"));
        Err(err)
    }
}

/// Checks one ingredient amount.
pub fn validate_amount(amount: i32) -> Result<(), &'static str> {
    if amount < 1 {
        Err(MIN_AMOUNT_MESSAGE)
    } else if amount > MAX_SMALL_INT {
        Err("Maximum amount is 32767")
    } else {
        Ok(())
    }
}
