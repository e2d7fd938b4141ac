//! Application and middleware contracts of the gateway protocol.
//!
//! An [`Application`] is called once per request with the shared [`Scope`],
//! a [`Receive`] channel for inbound events and a [`Transmit`] channel for
//! outbound events. Middleware wraps one application into another.

use async_trait::async_trait;
use std::sync::{Arc, OnceLock};

use crate::gateway::error::GatewayError;
use crate::gateway::message::Message;
use crate::gateway::scope::{AppRef, Scope};
use crate::routing::Router;

/// Source of inbound events.
#[async_trait]
pub trait Receive: Send {
    async fn receive(&mut self) -> Result<Message, GatewayError>;
}

/// Sink for outbound events.
#[async_trait]
pub trait Transmit: Send {
    async fn send(&mut self, message: Message) -> Result<(), GatewayError>;
}

/// A gateway protocol handler.
#[async_trait]
pub trait Application: Send + Sync + 'static {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Transmit,
    ) -> Result<(), GatewayError>;
}

pub type BoxApp = Arc<dyn Application>;

#[async_trait]
impl<A: Application + ?Sized> Application for Arc<A> {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Transmit,
    ) -> Result<(), GatewayError> {
        (**self).call(scope, receive, send).await
    }
}

/// Wraps the next application in the chain.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxApp) -> BoxApp;

    /// Middleware name for debugging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Toolkit application: a router behind a middleware stack.
///
/// Claims ownership of every request it sees by writing its own [`AppRef`]
/// into the scope.
pub struct GatewayApp {
    id: AppRef,
    router: Arc<Router>,
    middleware: Vec<Arc<dyn Middleware>>,
    stack: OnceLock<BoxApp>,
}

impl GatewayApp {
    pub fn new(id: AppRef, router: Router) -> Self {
        Self {
            id,
            router: Arc::new(router),
            middleware: Vec::new(),
            stack: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &AppRef {
        &self.id
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Mutable router access; discards a stack built by an earlier call.
    pub fn router_mut(&mut self) -> &mut Router {
        self.stack.take();
        Arc::make_mut(&mut self.router)
    }

    /// Add a middleware. The last one added runs first.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        tracing::debug!(app = %self.id, middleware = middleware.name(), "Middleware added");
        self.stack.take();
        self.middleware.push(middleware);
    }

    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    fn build_stack(&self) -> BoxApp {
        let mut app: BoxApp = self.router.clone();
        for middleware in &self.middleware {
            app = middleware.wrap(app);
        }
        app
    }
}

impl Clone for GatewayApp {
    /// The copy shares routes and middleware but builds its own stack.
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            router: self.router.clone(),
            middleware: self.middleware.clone(),
            stack: OnceLock::new(),
        }
    }
}

#[async_trait]
impl Application for GatewayApp {
    async fn call(
        &self,
        scope: &Scope,
        receive: &mut dyn Receive,
        send: &mut dyn Transmit,
    ) -> Result<(), GatewayError> {
        scope.set_app(self.id.clone());
        let stack = self.stack.get_or_init(|| self.build_stack());
        stack.call(scope, receive, send).await
    }
}
