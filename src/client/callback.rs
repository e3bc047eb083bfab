//! Detection and one-shot consumption of a pending login callback.
//!
//! After the identity provider redirects back, the location carries `code`
//! and `state` query parameters. Presence is tested on the raw query string;
//! the code is only parsed out to key the [`CallbackGuard`].

use std::cell::RefCell;

/// A login callback waiting to be processed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackContext {
    key: String,
}

impl CallbackContext {
    /// Returns the context if `search` contains both `code=` and `state=`.
    pub fn detect(search: &str) -> Option<Self> {
        if !(search.contains("code=") && search.contains("state=")) {
            return None;
        }

        let query = search.strip_prefix('?').unwrap_or(search);
        let code = url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == "code")
            .map(|(_, value)| value.into_owned());

        Some(Self {
            key: code.unwrap_or_else(|| search.to_string()),
        })
    }

    /// The authorization code, or the raw query when no `code` pair parses.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Remembers the last callback claimed.
///
/// Claiming is synchronous, so two overlapping `handle_callback` calls
/// observing the same location cannot both exchange the code. A page only
/// ever carries one callback, so the last key is all that is kept.
#[derive(Debug, Default)]
pub struct CallbackGuard {
    last_claimed: RefCell<Option<String>>,
}

impl CallbackGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `context` is claimed, false afterwards.
    pub fn claim(&self, context: &CallbackContext) -> bool {
        let mut last = self.last_claimed.borrow_mut();
        if last.as_deref() == Some(context.key.as_str()) {
            return false;
        }
        *last = Some(context.key.clone());
        true
    }

    pub fn is_consumed(&self, context: &CallbackContext) -> bool {
        self.last_claimed.borrow().as_deref() == Some(context.key.as_str())
    }
}
