//! Trailing-slash normalization in front of the toolkit router.
//!
//! The host hands over paths with or without slashes in arbitrary places;
//! the toolkit router expects the admin root as `/admin/` and every other
//! page without a trailing slash. [`PathFix`] rewrites the scope for the
//! duration of the downstream call and puts the original values back before
//! anything above it can look at the scope again.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::gateway::{
    Application, BoxApp, GatewayError, Message, Middleware, Receive, Scope, Transmit,
};

/// Normalize `path` for a router whose admin root is `base_url`.
///
/// `base_url` must already have its trailing slashes removed.
pub fn normalize_path(path: &str, base_url: &str) -> String {
    let trimmed = path.trim_start_matches('/').trim_end_matches('/');
    let mut normalized = format!("/{trimmed}");
    if normalized == base_url {
        normalized.push('/');
    }
    normalized
}

/// Middleware factory for [`normalize_path`].
#[derive(Debug, Clone)]
pub struct PathFix {
    base_url: String,
}

impl PathFix {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Middleware for PathFix {
    fn wrap(&self, next: BoxApp) -> BoxApp {
        Arc::new(PathFixApp {
            next,
            base_url: self.base_url.clone(),
        })
    }

    fn name(&self) -> &str {
        "PathFix"
    }
}

struct PathFixApp {
    next: BoxApp,
    base_url: String,
}

#[derive(Debug, Clone)]
struct OriginalPath {
    path: String,
    raw_path: Bytes,
}

impl OriginalPath {
    fn capture(scope: &Scope) -> Self {
        scope.read(|s| Self {
            path: s.path.clone(),
            raw_path: s.raw_path.clone(),
        })
    }

    fn restore(&self, scope: &Scope) {
        scope.update(|s| {
            s.path.clone_from(&self.path);
            s.raw_path = self.raw_path.clone();
        });
    }
}

/// Puts the original path back when dropped, whatever way the call ends.
struct RestoreOnDrop<'a> {
    scope: &'a Scope,
    original: &'a OriginalPath,
}

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        self.original.restore(self.scope);
    }
}

/// Restores the original path before each message reaches the host.
struct RestoringTransmit<'a> {
    inner: &'a mut dyn Transmit,
    scope: &'a Scope,
    original: &'a OriginalPath,
}

#[async_trait]
impl Transmit for RestoringTransmit<'_> {
    async fn send(&mut self, message: Message) -> Result<(), GatewayError> {
        self.original.restore(self.scope);
        self.inner.send(message).await
    }
}

#[async_trait]
impl Application for PathFixApp {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Transmit,
    ) -> Result<(), GatewayError> {
        let original = OriginalPath::capture(scope);
        let normalized = normalize_path(&original.path, &self.base_url);
        tracing::trace!(from = %original.path, to = %normalized, "Normalized admin path");

        scope.update(|s| {
            s.raw_path = Bytes::copy_from_slice(normalized.as_bytes());
            s.path = normalized;
        });
        let _restore = RestoreOnDrop {
            scope,
            original: &original,
        };

        let mut send = RestoringTransmit {
            inner: send,
            scope,
            original: &original,
        };
        self.next.call(scope, receive, &mut send).await
    }
}
