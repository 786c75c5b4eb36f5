//! Round-robin access token rotation.
//!
//! A [`TokenRotator`] is owned by the API client and shared by reference;
//! concurrent callers each receive a token in turn.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Errors from building a token rotator.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No tokens were supplied.
    #[error("at least one access token is required")]
    Empty,

    /// A supplied token was blank.
    #[error("access token #{0} is empty")]
    Blank(usize),
}

/// Hands out access tokens in round-robin order.
pub struct TokenRotator {
    tokens: Vec<String>,
    cursor: AtomicUsize,
}

impl TokenRotator {
    /// Build a rotator over `tokens`, rejecting an empty list or blank entries.
    pub fn new(tokens: Vec<String>) -> Result<Self, TokenError> {
        if tokens.is_empty() {
            return Err(TokenError::Empty);
        }
        if let Some(index) = tokens.iter().position(|t| t.trim().is_empty()) {
            return Err(TokenError::Blank(index));
        }
        Ok(Self {
            tokens,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Return the current token and advance the cursor.
    pub fn next(&self) -> &str {
        let len = self.tokens.len();
        let index = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| {
                Some(i.saturating_add(1).checked_rem(len).unwrap_or(0))
            })
            .unwrap_or(0);
        self.tokens.get(index).map(String::as_str).unwrap_or_default()
    }

    /// Number of tokens in rotation, never zero.
    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }
}

impl fmt::Debug for TokenRotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRotator")
            .field("tokens", &format_args!("[__REDACTED__; {}]", self.tokens.len()))
            .field("cursor", &self.cursor.load(Ordering::Relaxed))
            .finish()
    }
}
