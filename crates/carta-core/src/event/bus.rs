// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::{Mutex, PoisonError};

/// A thread-safe, fan-out event channel.
///
/// Every subscriber gets its own `flume` receiver and sees every event published
/// after it subscribed. Subscribers whose receiver was dropped are pruned on the
/// next publication.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + 'static> {
    subscribers: Mutex<Vec<flume::Sender<T>>>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        log::trace!("EventBus initialized.");
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a new subscriber.
    ///
    /// ## Returns
    /// The receiving end of an unbounded channel fed by this bus.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        let (sender, receiver) = flume::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    /// Sends `event` to every live subscriber.
    ///
    /// ## Returns
    /// The number of subscribers that received the event.
    pub fn publish(&self, event: T) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        if subscribers.is_empty() {
            log::trace!("EventBus: event published with no live subscriber.");
        }
        subscribers.len()
    }

    /// Number of subscribers that were live at the last publication.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Evicted(u32),
        Cleared,
    }

    #[test]
    fn test_every_subscriber_receives_every_event() {
        let bus = EventBus::<TestEvent>::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        assert_eq!(bus.publish(TestEvent::Evicted(1)), 2);
        assert_eq!(bus.publish(TestEvent::Cleared), 2);

        for rx in [&a, &b] {
            assert_eq!(rx.try_recv(), Ok(TestEvent::Evicted(1)));
            assert_eq!(rx.try_recv(), Ok(TestEvent::Cleared));
            assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        }
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::<TestEvent>::new();
        bus.publish(TestEvent::Cleared);
        let rx = bus.subscribe();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::<TestEvent>::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.publish(TestEvent::Evicted(2)), 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(TestEvent::Evicted(2)));
    }

    #[test]
    fn test_publish_from_thread() {
        let bus = std::sync::Arc::new(EventBus::<TestEvent>::new());
        let rx = bus.subscribe();
        let publisher = std::sync::Arc::clone(&bus);
        thread::spawn(move || {
            publisher.publish(TestEvent::Evicted(9));
        })
        .join()
        .expect("publisher thread panicked");
        assert_eq!(rx.try_recv(), Ok(TestEvent::Evicted(9)));
    }
}
