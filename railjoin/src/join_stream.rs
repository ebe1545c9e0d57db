// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::stream::{FusedStream, Stream, StreamExt};
use railjoin_core::{StreamItem, Subscriber, Subscription};
use railjoin_error::RailJoinError;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

pub(crate) enum Signal<T> {
    Next(T),
    Error(RailJoinError),
    Complete,
}

struct ChannelSubscriber<T> {
    sender: UnboundedSender<Signal<T>>,
    prefetch: u64,
}

impl<T: Send> Subscriber<T> for ChannelSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        subscription.request(self.prefetch);
    }

    fn on_next(&self, value: T) {
        let _ = self.sender.unbounded_send(Signal::Next(value));
    }

    fn on_error(&self, error: RailJoinError) {
        let _ = self.sender.unbounded_send(Signal::Error(error));
    }

    fn on_complete(&self) {
        let _ = self.sender.unbounded_send(Signal::Complete);
    }
}

/// Merged output of a [`SortedJoin`](crate::SortedJoin) pulled as a stream.
///
/// Yields `StreamItem::Value` for every merged value. A failed join yields one
/// `StreamItem::Error` and then ends. Demand is replenished after 75% of each batch
/// has been consumed; dropping the stream cancels the join.
pub struct JoinStream<T> {
    receiver: UnboundedReceiver<Signal<T>>,
    subscription: Arc<dyn Subscription>,
    limit: u64,
    consumed: u64,
    done: bool,
}

impl<T: Send + 'static> JoinStream<T> {
    pub(crate) fn channel(
        prefetch: u64,
    ) -> (Arc<dyn Subscriber<T>>, UnboundedReceiver<Signal<T>>) {
        let (sender, receiver) = unbounded();
        (Arc::new(ChannelSubscriber { sender, prefetch }), receiver)
    }

    pub(crate) fn new(
        receiver: UnboundedReceiver<Signal<T>>,
        subscription: Arc<dyn Subscription>,
        limit: u64,
    ) -> Self {
        Self {
            receiver,
            subscription,
            limit,
            consumed: 0,
            done: false,
        }
    }
}

impl<T> Stream for JoinStream<T> {
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = Pin::into_inner(self);
        if this.done {
            return Poll::Ready(None);
        }

        match this.receiver.poll_next_unpin(cx) {
            Poll::Ready(Some(Signal::Next(value))) => {
                this.consumed += 1;
                if this.consumed == this.limit {
                    this.consumed = 0;
                    this.subscription.request(this.limit);
                }
                Poll::Ready(Some(StreamItem::Value(value)))
            }
            Poll::Ready(Some(Signal::Error(error))) => {
                this.done = true;
                Poll::Ready(Some(StreamItem::Error(error)))
            }
            Poll::Ready(Some(Signal::Complete) | None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> FusedStream for JoinStream<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl<T> Drop for JoinStream<T> {
    fn drop(&mut self) {
        if !self.done {
            self.subscription.cancel();
        }
    }
}
