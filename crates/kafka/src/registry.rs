//! Type-identifier to handler routing.

use std::collections::HashMap;
use std::future::Future;

use kafka_types::{KafkaMessage, Record};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::context::MessageContext;
use crate::handler::Handler;

/// Outcome of dispatching one record.
#[derive(Debug)]
pub enum Dispatch {
    /// A handler registered for the record's type identifier ran.
    Handled(anyhow::Result<()>),
    /// No handler matched and the fallback ran.
    Fallback(anyhow::Result<()>),
    /// No handler matched and no fallback is registered; the record is dropped.
    Dropped,
}

impl Dispatch {
    /// The handler's result; a dropped record is not an error.
    pub fn into_result(self) -> anyhow::Result<()> {
        match self {
            Dispatch::Handled(result) | Dispatch::Fallback(result) => result,
            Dispatch::Dropped => Ok(()),
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Dispatch::Dropped)
    }
}

/// Handlers keyed by type identifier, plus an optional fallback.
///
/// Lookup is an exact string match on the record's `@type` header. A record
/// without the header is looked up under the empty identifier. Records that
/// match nothing go to the fallback, or are dropped when there is none.
///
/// The registry is filled during setup and read-only while consuming: every
/// mutating method takes `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
    fallback: Option<Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `message_type`.
    ///
    /// The last registration for a key wins; the replaced handler is returned.
    pub fn add_handler(
        &mut self,
        message_type: impl Into<String>,
        handler: Handler,
    ) -> Option<Handler> {
        let message_type = message_type.into();
        let replaced = self.handlers.insert(message_type.clone(), handler);
        if replaced.is_some() {
            warn!("Replacing handler already registered for message type '{message_type}'");
        }
        replaced
    }

    /// Register a typed callback under `T::message_type()`.
    pub fn add_handler_for<T, F, Fut>(&mut self, callback: F) -> Option<Handler>
    where
        T: KafkaMessage + Send + 'static,
        F: Fn(MessageContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.add_handler(T::message_type(), Handler::typed(callback))
    }

    /// Set the fallback for records no handler matches.
    ///
    /// The fallback receives the payload undecoded. Returns the previous
    /// fallback, if any.
    pub fn add_fallback(&mut self, handler: Handler) -> Option<Handler> {
        let replaced = self.fallback.replace(handler);
        if replaced.is_some() {
            warn!("Replacing previously registered fallback handler");
        }
        replaced
    }

    /// Handler registered for exactly `message_type`.
    pub fn resolve(&self, message_type: &str) -> Option<&Handler> {
        self.handlers.get(message_type)
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Registered type identifiers, in no particular order.
    pub fn message_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// `true` when no keyed handler is registered; the fallback is not counted.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route `record` to its handler and run it.
    ///
    /// The handler gets a [`MessageContext`] for the record whose cancellation
    /// token is a child of `shutdown`.
    pub async fn dispatch(&self, record: Record, shutdown: &CancellationToken) -> Dispatch {
        let context = MessageContext::for_record(&record, shutdown.child_token());
        let message_type = record.message_type().unwrap_or_default();

        if let Some(handler) = self.resolve(message_type) {
            return Dispatch::Handled(handler.call(context, record.value).await);
        }

        match &self.fallback {
            Some(fallback) => Dispatch::Fallback(fallback.call(context, record.value).await),
            None => Dispatch::Dropped,
        }
    }
}
