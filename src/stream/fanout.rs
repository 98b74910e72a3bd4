// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use futures::future::BoxFuture;
use futures::stream::{Fuse, FuturesUnordered, Stream};
use futures::StreamExt;
use std::pin::Pin;
use std::task::{Context, Poll};

use super::call::OpStream;
use crate::bag::AttrBag;
use crate::error::StorageResult;

/// Run a stream of operations with at most `concurrency` in flight.
///
/// Each inner operation's outcome, success or error, becomes exactly one
/// output item; a failing operation never aborts its siblings. The output
/// ends only once the input is exhausted and every in-flight operation has
/// completed. Completion order is whatever the operations finish in, so the
/// output order is unspecified for `concurrency > 1`.
///
/// `concurrency` is clamped to at least 1.
pub fn fan_out<S>(ops: S, concurrency: usize) -> FanOut<S>
where
    S: Stream<Item = OpStream> + Unpin,
{
    FanOut {
        ops: ops.fuse(),
        in_flight: FuturesUnordered::new(),
        concurrency: concurrency.max(1),
    }
}

/// Stream returned by [`fan_out`].
pub struct FanOut<S> {
    ops: Fuse<S>,
    in_flight: FuturesUnordered<BoxFuture<'static, Option<StorageResult<AttrBag>>>>,
    concurrency: usize,
}

impl<S> Stream for FanOut<S>
where
    S: Stream<Item = OpStream> + Unpin,
{
    type Item = StorageResult<AttrBag>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            // Start operations until the concurrency limit is reached or the
            // input has nothing ready.
            while this.in_flight.len() < this.concurrency && !this.ops.is_done() {
                match Pin::new(&mut this.ops).poll_next(cx) {
                    Poll::Ready(Some(mut op)) => {
                        this.in_flight.push(Box::pin(async move { op.next().await }));
                    }
                    Poll::Ready(None) | Poll::Pending => break,
                }
            }

            match Pin::new(&mut this.in_flight).poll_next(cx) {
                Poll::Ready(Some(Some(item))) => return Poll::Ready(Some(item)),
                // An operation that produced no item frees its slot.
                Poll::Ready(Some(None)) => continue,
                Poll::Ready(None) => {
                    if this.ops.is_done() {
                        return Poll::Ready(None);
                    }
                    // Nothing in flight; the input poll above registered the waker.
                    return Poll::Pending;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::fields;
    use crate::error::{BackendError, StorageError};
    use futures::stream;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Tracks the number of operations currently running and the highest
    /// level observed.
    #[derive(Default)]
    struct InFlightGauge {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl InFlightGauge {
        fn enter(&self) {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(active, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn gauged_op(gauge: Arc<InFlightGauge>, key: String, fail: bool) -> OpStream {
        OpStream::new(move || {
            Box::pin(async move {
                gauge.enter();
                tokio::time::sleep(Duration::from_millis(5)).await;
                gauge.exit();
                if fail {
                    Err(StorageError::Backend(BackendError::new(
                        "InternalError",
                        format!("{key} failed"),
                    )))
                } else {
                    Ok(AttrBag::new().with(fields::KEY, key))
                }
            })
        })
    }

    #[tokio::test]
    async fn test_every_input_produces_one_output() {
        let gauge = Arc::new(InFlightGauge::default());
        let ops: Vec<OpStream> = (0..20)
            .map(|i| gauged_op(Arc::clone(&gauge), format!("itemKey{i}"), i % 5 == 0))
            .collect();

        let outcomes: Vec<_> = fan_out(stream::iter(ops), 3).collect().await;

        assert_eq!(outcomes.len(), 20);
        let failures = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        assert_eq!(failures, 4);

        let keys: HashSet<String> = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok())
            .map(|bag| bag.str_field(fields::KEY).unwrap().to_string())
            .collect();
        assert_eq!(keys.len(), 16);
    }

    #[tokio::test]
    async fn test_concurrency_bound_is_respected() {
        let gauge = Arc::new(InFlightGauge::default());
        let ops: Vec<OpStream> = (0..12)
            .map(|i| gauged_op(Arc::clone(&gauge), format!("k{i}"), false))
            .collect();

        let outcomes: Vec<_> = fan_out(stream::iter(ops), 3).collect().await;

        assert_eq!(outcomes.len(), 12);
        let peak = gauge.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "observed {peak} operations in flight");
        assert!(peak >= 2, "operations never overlapped");
    }

    #[tokio::test]
    async fn test_sequential_when_concurrency_is_one() {
        let gauge = Arc::new(InFlightGauge::default());
        let ops: Vec<OpStream> = (0..4)
            .map(|i| gauged_op(Arc::clone(&gauge), format!("k{i}"), false))
            .collect();

        let outcomes: Vec<_> = fan_out(stream::iter(ops), 1).collect().await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let ops = vec![OpStream::ready(Ok(AttrBag::new()))];
        let outcomes: Vec<_> = fan_out(stream::iter(ops), 0).collect().await;
        assert_eq!(outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_siblings() {
        let ops = vec![
            OpStream::ready(Err(StorageError::Backend(BackendError::new("A", "a")))),
            OpStream::ready(Ok(AttrBag::new().with(fields::KEY, "survivor"))),
            OpStream::ready(Err(StorageError::Backend(BackendError::new("B", "b")))),
        ];

        let outcomes: Vec<_> = fan_out(stream::iter(ops), 2).collect().await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.is_err()).count(), 2);
        assert!(outcomes.iter().any(|o| {
            o.as_ref()
                .is_ok_and(|bag| bag.str_field(fields::KEY) == Some("survivor"))
        }));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let outcomes: Vec<_> = fan_out(stream::iter(Vec::<OpStream>::new()), 4)
            .collect()
            .await;
        assert!(outcomes.is_empty());
    }
}
