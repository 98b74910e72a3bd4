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

//! Storage backend contract.
//!
//! A backend owns everything below the request/response schema: transport,
//! signing, credentials, and its own retry policy. This layer talks to it
//! through [`StorageBackend`] only. Single-shot operations take a request bag
//! and report one response bag or one error; listing is paged, with an opaque
//! [`PageCursor`] carrying the continuation between page requests.

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::bag::AttrBag;
use crate::error::BackendError;

/// Opaque continuation token for a paged listing.
///
/// Lives only within one listing operation; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a listing: the entries reported by the backend plus the cursor
/// for the next page, if any.
#[derive(Debug, Default)]
pub struct ObjectPage {
    pub entries: Vec<AttrBag>,
    pub next: Option<PageCursor>,
}

/// Contract every storage backend fulfils.
///
/// Requests arrive already narrowed to the fields the operation accepts.
/// Errors are reported with the backend's own code and message; callers see
/// them verbatim.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend identifier used in diagnostics (e.g. `"s3"`).
    fn kind(&self) -> &'static str;

    async fn create_bucket(&self, request: &AttrBag) -> Result<AttrBag, BackendError>;

    async fn delete_bucket(&self, request: &AttrBag) -> Result<AttrBag, BackendError>;

    async fn put_object(&self, request: &AttrBag) -> Result<AttrBag, BackendError>;

    async fn delete_object(&self, request: &AttrBag) -> Result<AttrBag, BackendError>;

    /// Fetch one page of object entries for the bucket/prefix in `request`.
    ///
    /// `cursor` is `None` for the first page and the previous page's `next`
    /// cursor afterwards. Entry order within and across pages is the
    /// backend's enumeration order and is treated as authoritative.
    async fn list_objects_page(
        &self,
        request: &AttrBag,
        cursor: Option<&PageCursor>,
    ) -> Result<ObjectPage, BackendError>;

    /// Fetch one page of bucket descriptors (`Name`, `CreationDate`).
    async fn list_buckets_page(&self, cursor: Option<&PageCursor>)
        -> Result<ObjectPage, BackendError>;
}

impl Debug for dyn StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "StorageBackend(kind={})", self.kind())
    }
}

/// Pull a required string field out of a request bag.
pub(crate) fn require_str<'a>(request: &'a AttrBag, field: &str) -> Result<&'a str, BackendError> {
    request
        .str_field(field)
        .ok_or_else(|| BackendError::new("MissingParameter", format!("'{field}' is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::fields;

    #[test]
    fn test_require_str() {
        let bag = AttrBag::new().with(fields::BUCKET, "b");
        assert_eq!(require_str(&bag, fields::BUCKET).unwrap(), "b");

        let err = require_str(&bag, fields::KEY).unwrap_err();
        assert_eq!(err.code, "MissingParameter");
        assert!(err.message.contains(fields::KEY));
    }

    #[test]
    fn test_page_cursor_round_trip() {
        let cursor = PageCursor::new("token-1");
        assert_eq!(cursor.as_str(), "token-1");
        assert_eq!(cursor, PageCursor::new(String::from("token-1")));
    }
}
