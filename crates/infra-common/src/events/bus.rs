//! A small typed event bus over `tokio::sync::broadcast`.
//!
//! Publishers never block: slow subscribers lose the oldest events and are
//! told how many they missed (logged at `warn`). A bus with no subscribers
//! silently drops events.

use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::errors::types::{InfraError, Result};

/// Default number of buffered events per subscriber
pub const DEFAULT_CAPACITY: usize = 1024;

/// Typed broadcast event bus
#[derive(Debug, Clone)]
pub struct EventBus<T: Clone + Send + 'static> {
    sender: broadcast::Sender<T>,
    name: &'static str,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    pub fn new(name: &'static str) -> Self {
        Self::with_capacity(name, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, name }
    }

    /// Publish an event, returning how many subscribers will see it
    pub fn publish(&self, event: T) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("Event bus '{}' has no subscribers, event dropped", self.name);
                0
            }
        }
    }

    pub fn subscribe(&self) -> EventSubscription<T> {
        EventSubscription {
            receiver: self.sender.subscribe(),
            name: self.name,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A single subscriber's view of an [`EventBus`]
#[derive(Debug)]
pub struct EventSubscription<T: Clone + Send + 'static> {
    receiver: broadcast::Receiver<T>,
    name: &'static str,
}

impl<T: Clone + Send + 'static> EventSubscription<T> {
    /// Wait for the next event, skipping over any lag gap.
    ///
    /// Returns an error once the bus has been dropped.
    pub async fn recv(&mut self) -> Result<T> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Subscriber on '{}' lagged, {} events missed", self.name, missed);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(InfraError::EventBus(format!("Event bus '{}' closed", self.name)));
                }
            }
        }
    }

    /// Turn the subscription into a stream that ends when the bus closes
    pub fn into_stream(self) -> impl Stream<Item = T> + Send + Unpin {
        let name = self.name;
        BroadcastStream::new(self.receiver).filter_map(move |item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                warn!("Subscriber on '{}' lagged, {} events missed", name, missed);
                None
            }
        })
    }
}
