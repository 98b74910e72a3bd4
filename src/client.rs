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

//! Stream-oriented wrapper around a storage backend.
//!
//! [`StreamClient`] re-expresses each backend operation as a lazy stream:
//! single-shot calls become one-item [`OpStream`]s, listings become
//! [`ListingStream`]s with transparent continuation, and
//! [`purge_bucket`](StreamClient::purge_bucket) composes the two through a
//! bounded [`fan_out`].
//!
//! Every single-shot operation follows the same shape: the caller's bag is
//! narrowed to the operation's whitelist, the backend is called with the
//! narrowed request, and the emitted item is the caller's full bag with the
//! backend's response fields merged in. Response fields are only added where
//! the caller did not supply the field; caller fields always win.

use futures::future::BoxFuture;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::debug;

use crate::backend::{ObjectPage, PageCursor, StorageBackend};
use crate::bag::{fields, AttrBag, Value};
use crate::error::{BackendError, StorageResult};
use crate::handle::ObjectHandle;
use crate::params::{sanitize, OperationKind};
use crate::stream::{fan_out, ListingStream, OpStream};
use crate::vfile::{object_key, VirtualFile};

/// A stream wrapper around a storage backend client.
///
/// The backend instance is shared, never mutated, and injected at
/// construction; cloning the client is cheap and every clone talks to the
/// same backend.
#[derive(Clone, Debug)]
pub struct StreamClient {
    backend: Arc<dyn StorageBackend>,
}

impl StreamClient {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// A stream wrapper around the create-bucket call.
    pub fn create_bucket(&self, params: AttrBag) -> OpStream {
        let backend = Arc::clone(&self.backend);
        let request = sanitize(&params, OperationKind::CreateBucket);
        OpStream::new(move || {
            Box::pin(async move {
                let response = backend.create_bucket(&request).await?;
                Ok(extend_with_response(params, response))
            })
        })
    }

    /// A stream wrapper around the delete-bucket call. The bucket must be
    /// empty.
    pub fn delete_bucket(&self, params: AttrBag) -> OpStream {
        let backend = Arc::clone(&self.backend);
        let request = sanitize(&params, OperationKind::DeleteBucket);
        OpStream::new(move || {
            Box::pin(async move {
                let response = backend.delete_bucket(&request).await?;
                Ok(extend_with_response(params, response))
            })
        })
    }

    /// Upload an object.
    ///
    /// The request is narrowed to the fields the put call accepts, so bags
    /// piped in from other sources may carry arbitrary extra fields; the
    /// emitted item is the full original bag extended with whatever the
    /// backend reported (e.g. `ETag`).
    pub fn put_object(&self, params: AttrBag) -> OpStream {
        let backend = Arc::clone(&self.backend);
        let request = sanitize(&params, OperationKind::PutObject);
        OpStream::new(move || {
            Box::pin(async move {
                let response = backend.put_object(&request).await?;
                Ok(extend_with_response(params, response))
            })
        })
    }

    /// Delete an object.
    ///
    /// The emitted item is the original bag extended with the fields the
    /// backend reported (e.g. `DeleteMarker`, `VersionId`).
    pub fn delete_object(&self, params: AttrBag) -> OpStream {
        let backend = Arc::clone(&self.backend);
        let request = sanitize(&params, OperationKind::DeleteObject);
        OpStream::new(move || {
            Box::pin(async move {
                let response = backend.delete_object(&request).await?;
                Ok(extend_with_response(params, response))
            })
        })
    }

    /// Upload a [`VirtualFile`], deriving the storage key from its base and
    /// path when the descriptor does not name one.
    ///
    /// Fails before any backend call when the key cannot be derived.
    pub fn put_file_object<F>(&self, file: &F) -> StorageResult<OpStream>
    where
        F: VirtualFile + ?Sized,
    {
        let key = object_key(file)?;
        let mut params = file.params();
        params.insert(fields::KEY, key);
        params.insert(fields::BODY, file.contents());
        Ok(self.put_object(params))
    }

    /// Stream every object in a bucket.
    ///
    /// Continuation requests are issued transparently until the backend's
    /// enumeration is exhausted. Each item is an [`ObjectHandle`] whose bag
    /// holds the entity's listing metadata, the owning `Bucket`, and a null
    /// `Body`; listing never fetches content.
    pub fn stream_bucket_contents(&self, params: AttrBag) -> ObjectStream {
        let backend = Arc::clone(&self.backend);
        let request = sanitize(&params, OperationKind::ListObjects);
        let bucket = request.str_field(fields::BUCKET).map(str::to_string);
        debug!(bucket = bucket.as_deref().unwrap_or(""), "Streaming bucket contents");

        let fetch = move |cursor: Option<PageCursor>| -> BoxFuture<'static, Result<ObjectPage, BackendError>> {
            let backend = Arc::clone(&backend);
            let request = request.clone();
            let bucket = bucket.clone();
            Box::pin(async move {
                let page = backend.list_objects_page(&request, cursor.as_ref()).await?;
                let entries = page
                    .entries
                    .into_iter()
                    .map(|entity| decorate_entity(entity, bucket.as_deref()))
                    .collect();
                Ok(ObjectPage {
                    entries,
                    next: page.next,
                })
            })
        };

        ObjectStream {
            inner: ListingStream::new(fetch),
            backend: Arc::clone(&self.backend),
        }
    }

    /// Stream all buckets as `{Name, CreationDate}` bags.
    ///
    /// Map items through [`name_to_bucket`] before piping them into calls
    /// that expect a `Bucket` parameter.
    pub fn stream_buckets(&self) -> ListingStream {
        let backend = Arc::clone(&self.backend);
        ListingStream::new(move |cursor| {
            let backend = Arc::clone(&backend);
            Box::pin(async move { backend.list_buckets_page(cursor.as_ref()).await })
        })
    }

    /// Delete every object in a bucket, running up to `concurrency` deletes
    /// at a time.
    ///
    /// Emits one outcome per object; a failed delete surfaces as an error
    /// item and does not stop the rest. A listing failure also surfaces as a
    /// single error item. Outcome order is unspecified for
    /// `concurrency > 1`.
    pub fn purge_bucket(
        &self,
        params: AttrBag,
        concurrency: usize,
    ) -> impl Stream<Item = StorageResult<AttrBag>> + Send + Unpin {
        use futures::StreamExt;

        let ops = self.stream_bucket_contents(params).map(|item| match item {
            Ok(handle) => handle.delete(),
            Err(err) => OpStream::ready(Err(err)),
        });
        fan_out(ops, concurrency)
    }
}

/// `{Name: "my-bucket", CreationDate: ...}` => `{Bucket: "my-bucket"}`.
///
/// Useful for mapping the stream returned from
/// [`StreamClient::stream_buckets`] before passing items to calls that
/// expect a `Bucket` parameter. Ownership and timestamp metadata are
/// discarded.
pub fn name_to_bucket(bucket: &AttrBag) -> AttrBag {
    let mut params = AttrBag::new();
    if let Some(name) = bucket.str_field(fields::NAME) {
        params.insert(fields::BUCKET, name);
    }
    params
}

/// Merge a backend response onto the caller's bag; the caller's fields win.
fn extend_with_response(mut params: AttrBag, response: AttrBag) -> AttrBag {
    params.merge_missing(&response);
    params
}

/// Attach the owning bucket and a null body to an enumerated entity.
fn decorate_entity(entity: AttrBag, bucket: Option<&str>) -> AttrBag {
    let mut decorated = AttrBag::new();
    if let Some(bucket) = bucket {
        decorated.insert(fields::BUCKET, bucket);
    }
    decorated.merge_missing(&entity);
    if !decorated.contains(fields::BODY) {
        decorated.insert(fields::BODY, Value::Null);
    }
    decorated
}

/// Stream of [`ObjectHandle`]s produced by
/// [`StreamClient::stream_bucket_contents`].
pub struct ObjectStream {
    inner: ListingStream,
    backend: Arc<dyn StorageBackend>,
}

impl Stream for ObjectStream {
    type Item = StorageResult<ObjectHandle>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(bag))) => Poll::Ready(Some(Ok(ObjectHandle::new(
                bag,
                Arc::clone(&this.backend),
            )))),
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
