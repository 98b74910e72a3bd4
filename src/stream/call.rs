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
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::bag::AttrBag;
use crate::error::StorageResult;

type OpCall = Box<dyn FnOnce() -> BoxFuture<'static, StorageResult<AttrBag>> + Send>;

enum OpState {
    /// The call has not been issued yet.
    Pending(OpCall),
    InFlight(BoxFuture<'static, StorageResult<AttrBag>>),
    Finished,
}

/// A lazy single-item sequence over a one-shot backend call.
///
/// The wrapped call is not issued until the stream is first polled. It then
/// produces exactly one item, the call's success value or its error, and
/// ends. No retries happen at this layer; retry policy belongs to the
/// backend client.
pub struct OpStream {
    state: OpState,
}

impl OpStream {
    /// Wrap a deferred call. `call` is invoked on the first poll.
    pub fn new<F>(call: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, StorageResult<AttrBag>> + Send + 'static,
    {
        Self {
            state: OpState::Pending(Box::new(call)),
        }
    }

    /// A stream over an already-resolved outcome.
    ///
    /// Useful for threading an upstream error into a fan-out as a regular
    /// one-item sequence.
    pub fn ready(result: StorageResult<AttrBag>) -> Self {
        Self::new(move || Box::pin(async move { result }))
    }
}

impl Stream for OpStream {
    type Item = StorageResult<AttrBag>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                OpState::Pending(_) => {
                    let OpState::Pending(call) =
                        std::mem::replace(&mut this.state, OpState::Finished)
                    else {
                        continue;
                    };
                    this.state = OpState::InFlight(call());
                }
                OpState::InFlight(future) => match future.as_mut().poll(cx) {
                    Poll::Ready(item) => {
                        this.state = OpState::Finished;
                        return Poll::Ready(Some(item));
                    }
                    Poll::Pending => return Poll::Pending,
                },
                OpState::Finished => return Poll::Ready(None),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            OpState::Finished => (0, Some(0)),
            _ => (0, Some(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::fields;
    use crate::error::{BackendError, StorageError};
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counted_stream(calls: Arc<AtomicUsize>) -> OpStream {
        OpStream::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(AttrBag::new().with(fields::KEY, "k")) })
        })
    }

    #[tokio::test]
    async fn test_call_is_not_issued_until_first_poll() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut stream = counted_stream(Arc::clone(&calls));

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let item = stream.next().await.unwrap().unwrap();
        assert_eq!(item.str_field(fields::KEY), Some("k"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exactly_one_item_then_end() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut stream = counted_stream(Arc::clone(&calls));

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_the_single_item() {
        let mut stream = OpStream::new(|| {
            Box::pin(async { Err(StorageError::Backend(BackendError::new("Boom", "boom"))) })
        });

        let item = stream.next().await.unwrap();
        match item {
            Err(StorageError::Backend(err)) => assert_eq!(err.code, "Boom"),
            other => panic!("Expected backend error, got {other:?}"),
        }
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_ready_stream() {
        let mut stream = OpStream::ready(Ok(AttrBag::new().with(fields::BUCKET, "b")));
        let item = stream.next().await.unwrap().unwrap();
        assert_eq!(item.str_field(fields::BUCKET), Some("b"));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_size_hint() {
        let mut stream = OpStream::ready(Ok(AttrBag::new()));
        assert_eq!(stream.size_hint(), (0, Some(1)));
        let _ = stream.next().await;
        assert_eq!(stream.size_hint(), (0, Some(0)));
    }
}
