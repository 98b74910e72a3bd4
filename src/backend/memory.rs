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

//! In-process backend keeping buckets and objects in a sorted map.
//!
//! Mirrors the observable shape of a real object store: lexicographic key
//! order, paged listings, and the usual error codes (`NoSuchBucket`,
//! `BucketAlreadyExists`, `BucketNotEmpty`). Useful for tests and demos.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use tokio::sync::Mutex;

use super::{require_str, ObjectPage, PageCursor, StorageBackend};
use crate::bag::{fields, AttrBag, Value};
use crate::error::BackendError;

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    etag: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug)]
struct BucketState {
    created: DateTime<Utc>,
    objects: BTreeMap<String, StoredObject>,
}

/// A complete in-memory storage backend.
#[derive(Debug)]
pub struct InMemoryBackend {
    buckets: Mutex<BTreeMap<String, BucketState>>,
    page_size: usize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Cap the number of entries returned per listing page.
    ///
    /// Small page sizes force multi-page listings, which is what tests
    /// usually want from this backend.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn no_such_bucket(bucket: &str) -> BackendError {
        BackendError::new(
            "NoSuchBucket",
            format!("The specified bucket does not exist: {bucket}"),
        )
    }

    fn etag_for(body: &Bytes) -> String {
        let mut hasher = DefaultHasher::new();
        body.hash(&mut hasher);
        format!("\"{:016x}\"", hasher.finish())
    }

    fn object_entry(key: &str, object: &StoredObject) -> AttrBag {
        AttrBag::new()
            .with(fields::KEY, key)
            .with(fields::SIZE, object.body.len() as i64)
            .with(fields::LAST_MODIFIED, object.last_modified)
            .with(fields::ETAG, object.etag.clone())
            .with(fields::STORAGE_CLASS, "STANDARD")
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn create_bucket(&self, request: &AttrBag) -> Result<AttrBag, BackendError> {
        let bucket = require_str(request, fields::BUCKET)?;
        let mut buckets = self.buckets.lock().await;

        if buckets.contains_key(bucket) {
            return Err(BackendError::new(
                "BucketAlreadyExists",
                format!("The requested bucket name is not available: {bucket}"),
            ));
        }

        buckets.insert(
            bucket.to_string(),
            BucketState {
                created: Utc::now(),
                objects: BTreeMap::new(),
            },
        );

        Ok(AttrBag::new().with(fields::LOCATION, format!("/{bucket}")))
    }

    async fn delete_bucket(&self, request: &AttrBag) -> Result<AttrBag, BackendError> {
        let bucket = require_str(request, fields::BUCKET)?;
        let mut buckets = self.buckets.lock().await;

        let state = buckets
            .get(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        if !state.objects.is_empty() {
            return Err(BackendError::new(
                "BucketNotEmpty",
                format!("The bucket you tried to delete is not empty: {bucket}"),
            ));
        }

        buckets.remove(bucket);
        Ok(AttrBag::new())
    }

    async fn put_object(&self, request: &AttrBag) -> Result<AttrBag, BackendError> {
        let bucket = require_str(request, fields::BUCKET)?;
        let key = require_str(request, fields::KEY)?;
        let body = request
            .get(fields::BODY)
            .and_then(Value::as_body)
            .unwrap_or_default();

        let mut buckets = self.buckets.lock().await;
        let state = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        let etag = Self::etag_for(&body);
        state.objects.insert(
            key.to_string(),
            StoredObject {
                body,
                etag: etag.clone(),
                last_modified: Utc::now(),
            },
        );

        Ok(AttrBag::new().with(fields::ETAG, etag))
    }

    async fn delete_object(&self, request: &AttrBag) -> Result<AttrBag, BackendError> {
        let bucket = require_str(request, fields::BUCKET)?;
        let key = require_str(request, fields::KEY)?;

        let mut buckets = self.buckets.lock().await;
        let state = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        // Deleting an absent key succeeds, matching object-store semantics.
        state.objects.remove(key);
        Ok(AttrBag::new())
    }

    async fn list_objects_page(
        &self,
        request: &AttrBag,
        cursor: Option<&PageCursor>,
    ) -> Result<ObjectPage, BackendError> {
        let bucket = require_str(request, fields::BUCKET)?;
        let prefix = request.str_field(fields::PREFIX).unwrap_or("");
        // The caller's Marker seeds the first page; cursors take over after.
        let start_after = cursor
            .map(PageCursor::as_str)
            .or_else(|| request.str_field(fields::MARKER));
        let limit = request
            .get(fields::MAX_KEYS)
            .and_then(Value::as_i64)
            .map(|n| n.max(1) as usize)
            .unwrap_or(self.page_size)
            .min(self.page_size);

        let buckets = self.buckets.lock().await;
        let state = buckets
            .get(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;

        let mut entries = Vec::new();
        let mut truncated = false;
        for (key, object) in state
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| start_after.is_none_or(|after| key.as_str() > after))
        {
            if entries.len() == limit {
                truncated = true;
                break;
            }
            entries.push(Self::object_entry(key, object));
        }

        let next = if truncated {
            entries
                .last()
                .and_then(|entry| entry.str_field(fields::KEY))
                .map(PageCursor::new)
        } else {
            None
        };

        Ok(ObjectPage { entries, next })
    }

    async fn list_buckets_page(
        &self,
        cursor: Option<&PageCursor>,
    ) -> Result<ObjectPage, BackendError> {
        let start_after = cursor.map(PageCursor::as_str);
        let buckets = self.buckets.lock().await;

        let mut entries = Vec::new();
        let mut truncated = false;
        for (name, state) in buckets
            .iter()
            .filter(|(name, _)| start_after.is_none_or(|after| name.as_str() > after))
        {
            if entries.len() == self.page_size {
                truncated = true;
                break;
            }
            entries.push(
                AttrBag::new()
                    .with(fields::NAME, name.clone())
                    .with(fields::CREATION_DATE, state.created),
            );
        }

        let next = if truncated {
            entries
                .last()
                .and_then(|entry| entry.str_field(fields::NAME))
                .map(PageCursor::new)
        } else {
            None
        };

        Ok(ObjectPage { entries, next })
    }
}
