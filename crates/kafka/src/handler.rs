//! Handler adapters.
//!
//! A [`Handler`] is the uniform shape every registered callback is stored as:
//! an async function of `(MessageContext, payload bytes)`. Typed callbacks are
//! wrapped by [`Handler::typed`], which decodes the payload with the message
//! type's codec before calling them.

use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use kafka_types::KafkaMessage;

use crate::context::MessageContext;
use crate::error::Error;

/// Future returned by a handler invocation.
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

type HandlerFn = dyn Fn(MessageContext, Vec<u8>) -> HandlerFuture + Send + Sync;

/// A raw-bytes callback, cheap to clone and safe to call from any task.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap a typed callback.
    ///
    /// The payload is decoded with `T`'s codec first. A decode failure is
    /// returned as [`Error::Decode`] without calling `callback`; an error from
    /// `callback` is returned as it was produced.
    pub fn typed<T, F, Fut>(callback: F) -> Self
    where
        T: KafkaMessage + Send + 'static,
        F: Fn(MessageContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |context: MessageContext, payload: Vec<u8>| -> HandlerFuture {
                match kafka_types::decode::<T>(&payload) {
                    Ok(message) => callback(context, message).boxed(),
                    Err(e) => future::ready(Err(anyhow::Error::new(Error::Decode(e)))).boxed(),
                }
            }),
        }
    }

    /// Wrap a callback that takes the payload bytes as they were published.
    pub fn raw<F, Fut>(callback: F) -> Self
    where
        F: Fn(MessageContext, Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |context: MessageContext, payload: Vec<u8>| -> HandlerFuture {
                callback(context, payload).boxed()
            }),
        }
    }

    pub fn call(&self, context: MessageContext, payload: Vec<u8>) -> HandlerFuture {
        (self.inner)(context, payload)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

/// Shorthand for [`Handler::typed`].
pub fn handler<T, F, Fut>(callback: F) -> Handler
where
    T: KafkaMessage + Send + 'static,
    F: Fn(MessageContext, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Handler::typed(callback)
}
