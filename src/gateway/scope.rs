//! Per-request context shared between gateway layers.
//!
//! # Responsibilities
//! - Hold the routing-relevant view of a request (path, raw path, root path)
//! - Track which application currently owns the request
//! - Allow layers to fork an independent copy before rewriting it
//!
//! # Design Decisions
//! - `Scope` is a handle: cloning it shares the same context, `fork` copies it
//! - The lock is never held across an `.await`

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Kind of connection a scope describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Http,
    Lifespan,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Http => write!(f, "http"),
            ScopeKind::Lifespan => write!(f, "lifespan"),
        }
    }
}

/// Opaque reference to the application responsible for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppRef(Arc<str>);

impl AppRef {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plain field set of a request context.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeState {
    pub kind: ScopeKind,
    pub method: Method,
    /// Decoded path as seen by the current layer.
    pub path: String,
    /// Path bytes exactly as they arrived on the wire.
    pub raw_path: Bytes,
    /// Prefix already consumed by enclosing mounts.
    pub root_path: String,
    pub query_string: Bytes,
    pub headers: HeaderMap,
    pub path_params: BTreeMap<String, String>,
    pub app: AppRef,
}

impl ScopeState {
    /// HTTP scope for `path`, owned by `app`.
    pub fn http(method: Method, path: impl Into<String>, app: AppRef) -> Self {
        let path = path.into();
        Self {
            kind: ScopeKind::Http,
            method,
            raw_path: Bytes::copy_from_slice(path.as_bytes()),
            path,
            root_path: String::new(),
            query_string: Bytes::new(),
            headers: HeaderMap::new(),
            path_params: BTreeMap::new(),
            app,
        }
    }

    /// Path relative to the enclosing mounts.
    pub fn route_path(&self) -> &str {
        self.path
            .strip_prefix(self.root_path.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(&self.path)
    }
}

/// Shared handle to a request context.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<Mutex<ScopeState>>,
}

impl Scope {
    pub fn new(state: ScopeState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Copy of the current field values.
    pub fn snapshot(&self) -> ScopeState {
        self.inner.lock().clone()
    }

    /// Independent context with the same field values.
    pub fn fork(&self) -> Scope {
        Scope::new(self.snapshot())
    }

    /// Mutate the context in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut ScopeState) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn read<R>(&self, f: impl FnOnce(&ScopeState) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn kind(&self) -> ScopeKind {
        self.read(|s| s.kind)
    }

    pub fn path(&self) -> String {
        self.read(|s| s.path.clone())
    }

    pub fn raw_path(&self) -> Bytes {
        self.read(|s| s.raw_path.clone())
    }

    pub fn app(&self) -> AppRef {
        self.read(|s| s.app.clone())
    }

    pub fn set_app(&self, app: AppRef) {
        self.update(|s| s.app = app);
    }

    /// Whether both handles point at the same context.
    pub fn same_context(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scope").field(&*self.inner.lock()).finish()
    }
}

impl From<ScopeState> for Scope {
    fn from(state: ScopeState) -> Self {
        Scope::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(path: &str) -> Scope {
        Scope::new(ScopeState::http(Method::GET, path, AppRef::new("host")))
    }

    #[test]
    fn test_fork_is_independent() {
        let original = scope("/users");
        let forked = original.fork();
        assert!(!original.same_context(&forked));

        forked.update(|s| s.path = "/admin/users".into());
        assert_eq!(original.path(), "/users");
        assert_eq!(forked.path(), "/admin/users");
    }

    #[test]
    fn test_clone_shares_context() {
        let original = scope("/users");
        let shared = original.clone();
        shared.set_app(AppRef::new("admin"));
        assert_eq!(original.app(), AppRef::new("admin"));
        assert!(original.same_context(&shared));
    }

    #[test]
    fn test_route_path_strips_root() {
        let mut state = ScopeState::http(Method::GET, "/admin/users/list", AppRef::new("host"));
        state.root_path = "/admin".into();
        assert_eq!(state.route_path(), "/users/list");

        state.path = "/administrator".into();
        assert_eq!(state.route_path(), "/administrator");
    }
}
