//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bind address parses)
//! - Check the admin base URL and view identities
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{ServerConfig, Setting};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("admin.base_url '{0}' must be an absolute path without query or fragment")]
    BaseUrl(String),

    #[error("admin view identity '{0}' must be a non-empty path segment")]
    ViewIdentity(String),

    #[error("admin view identity '{0}' is registered twice")]
    DuplicateView(String),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if let Setting::Set(base_url) = &config.admin.base_url {
        if !is_valid_base_url(base_url) {
            errors.push(ValidationError::BaseUrl(base_url.clone()));
        }
    }

    if let Setting::Set(views) = &config.admin.views {
        let mut seen = HashSet::new();
        for view in views {
            if view.identity.is_empty() || view.identity.contains('/') {
                errors.push(ValidationError::ViewIdentity(view.identity.clone()));
            } else if !seen.insert(view.identity.as_str()) {
                errors.push(ValidationError::DuplicateView(view.identity.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Absolute path; no query, fragment, or host router pattern syntax.
fn is_valid_base_url(base_url: &str) -> bool {
    base_url.starts_with('/')
        && !base_url.contains("//")
        && !base_url.contains(['?', '#', '{', '}', '*'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::views::ViewConfig;

    fn view(identity: &str) -> ViewConfig {
        ViewConfig {
            identity: identity.into(),
            name: identity.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_base_url_rules() {
        assert!(is_valid_base_url("/admin"));
        assert!(is_valid_base_url("/admin/"));
        assert!(is_valid_base_url("/"));
        assert!(!is_valid_base_url("admin"));
        assert!(!is_valid_base_url("//admin"));
        assert!(!is_valid_base_url("/admin?x=1"));
        assert!(!is_valid_base_url("/a/{*rest}"));
        assert!(!is_valid_base_url("/{x}"));
        assert!(!is_valid_base_url("/admin*"));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ServerConfig::default();
        config.timeouts.request_secs = 0;
        config.admin.base_url = Setting::Set("admin".into());
        config.admin.views = Setting::Set(vec![view("user"), view("user"), view("a/b")]);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::RequestTimeout,
                ValidationError::BaseUrl("admin".into()),
                ValidationError::DuplicateView("user".into()),
                ValidationError::ViewIdentity("a/b".into()),
            ]
        );
    }
}
