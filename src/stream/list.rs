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
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

use crate::backend::{ObjectPage, PageCursor};
use crate::bag::AttrBag;
use crate::error::{BackendError, StorageError};

/// Fetches one page: `None` for the first page, then the previous page's
/// continuation cursor.
pub type PageFetch =
    Box<dyn FnMut(Option<PageCursor>) -> BoxFuture<'static, Result<ObjectPage, BackendError>> + Send>;

enum ListState {
    /// No request issued yet; the first poll starts the enumeration.
    Idle,
    Requesting(BoxFuture<'static, Result<ObjectPage, BackendError>>),
    /// Entries buffered from the current page, handed out one per pull.
    Emitting {
        entries: VecDeque<AttrBag>,
        next: Option<PageCursor>,
    },
    /// Terminal error pending emission; no further requests are issued.
    Errored(BackendError),
    Exhausted,
}

/// A lazy stream over a paged backend enumeration.
///
/// Page boundaries are invisible to the consumer: entries are emitted one at
/// a time in the backend's reported order, continuation requests are issued
/// transparently whenever the current page drains, and the stream ends once
/// the backend stops returning a cursor. A page-fetch error is emitted as
/// the stream's final item; the enumeration is then over.
///
/// Production is pull-driven, so a slow consumer simply leaves the current
/// page buffered; nothing is dropped or reordered.
pub struct ListingStream {
    fetch: PageFetch,
    state: ListState,
}

impl ListingStream {
    pub fn new<F>(fetch: F) -> Self
    where
        F: FnMut(Option<PageCursor>) -> BoxFuture<'static, Result<ObjectPage, BackendError>>
            + Send
            + 'static,
    {
        Self {
            fetch: Box::new(fetch),
            state: ListState::Idle,
        }
    }
}

impl Stream for ListingStream {
    type Item = Result<AttrBag, StorageError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                ListState::Idle => {
                    this.state = ListState::Requesting((this.fetch)(None));
                }
                ListState::Requesting(request) => match request.as_mut().poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        debug!(
                            entries = page.entries.len(),
                            has_more = page.next.is_some(),
                            "Fetched listing page"
                        );
                        this.state = ListState::Emitting {
                            entries: page.entries.into(),
                            next: page.next,
                        };
                    }
                    Poll::Ready(Err(err)) => {
                        this.state = ListState::Errored(err);
                    }
                    Poll::Pending => return Poll::Pending,
                },
                ListState::Emitting { entries, next } => {
                    if let Some(entry) = entries.pop_front() {
                        return Poll::Ready(Some(Ok(entry)));
                    }
                    match next.take() {
                        // An empty page with a cursor just continues the enumeration.
                        Some(cursor) => {
                            this.state = ListState::Requesting((this.fetch)(Some(cursor)));
                        }
                        None => {
                            this.state = ListState::Exhausted;
                            return Poll::Ready(None);
                        }
                    }
                }
                ListState::Errored(_) => {
                    if let ListState::Errored(err) =
                        std::mem::replace(&mut this.state, ListState::Exhausted)
                    {
                        return Poll::Ready(Some(Err(StorageError::Backend(err))));
                    }
                }
                ListState::Exhausted => return Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::fields;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn entry(key: &str) -> AttrBag {
        AttrBag::new().with(fields::KEY, key)
    }

    fn page(keys: &[&str], next: Option<&str>) -> ObjectPage {
        ObjectPage {
            entries: keys.iter().map(|key| entry(key)).collect(),
            next: next.map(PageCursor::new),
        }
    }

    /// A fetch function that serves a script of page results and counts calls.
    fn scripted(
        pages: Vec<Result<ObjectPage, BackendError>>,
    ) -> (ListingStream, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_fetch = Arc::clone(&calls);
        let script = Arc::new(Mutex::new(VecDeque::from(pages)));

        let stream = ListingStream::new(move |_cursor| {
            calls_in_fetch.fetch_add(1, Ordering::SeqCst);
            let result = script
                .lock()
                .unwrap()
                .pop_front()
                .expect("Fetch called past the end of the script");
            Box::pin(async move { result })
        });

        (stream, calls)
    }

    #[tokio::test]
    async fn test_no_request_before_first_poll() {
        let (stream, calls) = scripted(vec![Ok(page(&[], None))]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let items: Vec<_> = stream.collect().await;
        assert!(items.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entries_cross_pages_in_order() {
        let (stream, calls) = scripted(vec![
            Ok(page(&["a", "b"], Some("b"))),
            Ok(page(&["c"], Some("c"))),
            Ok(page(&["d", "e"], None)),
        ]);

        let keys: Vec<String> = stream
            .map(|item| item.unwrap().str_field(fields::KEY).unwrap().to_string())
            .collect()
            .await;

        assert_eq!(keys, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cursor_threading() {
        let cursors = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&cursors);
        let script = Arc::new(Mutex::new(VecDeque::from(vec![
            Ok(page(&["a"], Some("after-a"))),
            Ok(page(&["b"], None)),
        ])));

        let stream = ListingStream::new(move |cursor| {
            seen.lock()
                .unwrap()
                .push(cursor.map(|c| c.as_str().to_string()));
            let result: Result<ObjectPage, BackendError> =
                script.lock().unwrap().pop_front().unwrap();
            Box::pin(async move { result })
        });

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(
            *cursors.lock().unwrap(),
            vec![None, Some("after-a".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_page_with_cursor_continues() {
        let (stream, calls) = scripted(vec![
            Ok(page(&[], Some("more"))),
            Ok(page(&["a"], None)),
        ]);

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_ends_stream_after_buffered_entries() {
        let (mut stream, calls) = scripted(vec![
            Ok(page(&["a", "b"], Some("b"))),
            Err(BackendError::new("InternalError", "page fetch failed")),
        ]);

        assert_eq!(
            stream.next().await.unwrap().unwrap().str_field(fields::KEY),
            Some("a")
        );
        assert_eq!(
            stream.next().await.unwrap().unwrap().str_field(fields::KEY),
            Some("b")
        );

        match stream.next().await.unwrap() {
            Err(StorageError::Backend(err)) => assert_eq!(err.code, "InternalError"),
            other => panic!("Expected backend error, got {other:?}"),
        }

        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
        // No request is issued after the failing one.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_page_error() {
        let (stream, _) = scripted(vec![Err(BackendError::new("AccessDenied", "denied"))]);
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
