//! Browser location and storage as injected capabilities.
//!
//! The adapter and the Auth0 client never touch `window` directly. They are
//! handed a [`Location`] and a [`Storage`], which lets the same state machine
//! run in the browser (`WindowLocation`, `LocalStorage`) and natively or in
//! tests (`MemoryLocation`, `MemoryStorage`).

use crate::error::BrowserError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use url::Url;

/// The current page location.
pub trait Location {
    /// Full URL of the current page.
    fn href(&self) -> String;

    /// Scheme, host and port of the current page, e.g. `https://app.example.com`.
    fn origin(&self) -> String;

    /// Query string including the leading `?`, or an empty string.
    fn search(&self) -> String;

    /// Full-page navigation to `url`.
    fn assign(&self, url: &str) -> Result<(), BrowserError>;

    /// Rewrites the current URL without navigating.
    fn replace_state(&self, url: &str) -> Result<(), BrowserError>;

    /// Reloads the current page.
    fn reload(&self) -> Result<(), BrowserError>;
}

/// String key/value storage surviving page loads.
///
/// Write failures (quota, private mode) are not surfaced, mirroring how the
/// browser storage is used elsewhere: persistence is best effort.
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// In-memory [`Location`] that records navigations instead of performing them.
#[derive(Debug)]
pub struct MemoryLocation {
    href: RefCell<Url>,
    navigations: RefCell<Vec<String>>,
    reloads: Cell<usize>,
}

impl MemoryLocation {
    /// Creates a location pointing at `href`.
    pub fn new(href: &str) -> Result<Self, BrowserError> {
        let href = Url::parse(href).map_err(|e| BrowserError(e.to_string()))?;
        Ok(Self {
            href: RefCell::new(href),
            navigations: RefCell::new(Vec::new()),
            reloads: Cell::new(0),
        })
    }

    /// Moves the page to `href`, as the identity provider redirecting back would.
    pub fn set_href(&self, href: &str) -> Result<(), BrowserError> {
        let url = Url::parse(href).map_err(|e| BrowserError(e.to_string()))?;
        *self.href.borrow_mut() = url;
        Ok(())
    }

    /// URLs passed to [`Location::assign`], oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.borrow().clone()
    }

    /// The most recent navigation, if any.
    pub fn last_navigation(&self) -> Option<String> {
        self.navigations.borrow().last().cloned()
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.get()
    }

    fn resolve(&self, url: &str) -> Result<Url, BrowserError> {
        self.href
            .borrow()
            .join(url)
            .map_err(|e| BrowserError(e.to_string()))
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> String {
        self.href.borrow().to_string()
    }

    fn origin(&self) -> String {
        self.href.borrow().origin().ascii_serialization()
    }

    fn search(&self) -> String {
        self.href
            .borrow()
            .query()
            .map(|q| format!("?{}", q))
            .unwrap_or_default()
    }

    fn assign(&self, url: &str) -> Result<(), BrowserError> {
        let target = self.resolve(url)?;
        tracing::trace!("Navigating to {}", target);
        self.navigations.borrow_mut().push(target.to_string());
        *self.href.borrow_mut() = target;
        Ok(())
    }

    fn replace_state(&self, url: &str) -> Result<(), BrowserError> {
        let target = self.resolve(url)?;
        *self.href.borrow_mut() = target;
        Ok(())
    }

    fn reload(&self) -> Result<(), BrowserError> {
        self.reloads.set(self.reloads.get() + 1);
        Ok(())
    }
}

/// In-memory [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.borrow_mut().remove(key);
    }
}

/// [`Location`] backed by `window.location` and `window.history`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowLocation;

#[cfg(target_arch = "wasm32")]
impl WindowLocation {
    fn location() -> Result<web_sys::Location, BrowserError> {
        web_sys::window()
            .map(|w| w.location())
            .ok_or_else(|| BrowserError("window is not available".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error(value: wasm_bindgen::JsValue) -> BrowserError {
    BrowserError(format!("{:?}", value))
}

#[cfg(target_arch = "wasm32")]
impl Location for WindowLocation {
    fn href(&self) -> String {
        Self::location()
            .ok()
            .and_then(|l| l.href().ok())
            .unwrap_or_default()
    }

    fn origin(&self) -> String {
        match Self::location().ok().and_then(|l| l.origin().ok()) {
            Some(origin) => origin,
            None => {
                tracing::warn!("window.location.origin is not available");
                String::new()
            }
        }
    }

    fn search(&self) -> String {
        Self::location()
            .ok()
            .and_then(|l| l.search().ok())
            .unwrap_or_default()
    }

    fn assign(&self, url: &str) -> Result<(), BrowserError> {
        tracing::trace!("Navigating to {}", url);
        Self::location()?.set_href(url).map_err(js_error)
    }

    fn replace_state(&self, url: &str) -> Result<(), BrowserError> {
        let history = web_sys::window()
            .ok_or_else(|| BrowserError("window is not available".to_string()))?
            .history()
            .map_err(js_error)?;
        history
            .replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(url))
            .map_err(js_error)
    }

    fn reload(&self) -> Result<(), BrowserError> {
        Self::location()?.reload().map_err(js_error)
    }
}

/// [`Storage`] backed by `window.localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set_item(&self, key: &str, value: &str) {
        match Self::storage() {
            Some(storage) => {
                if storage.set_item(key, value).is_err() {
                    tracing::warn!("Failed to write {} to localStorage", key);
                }
            }
            None => tracing::warn!("localStorage is not available"),
        }
    }

    fn remove_item(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}
