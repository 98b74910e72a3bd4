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

//! Request and entity attribute bags.
//!
//! Every request handed to a backend and every entity it reports back is an
//! [`AttrBag`]: an insertion-ordered collection of named [`Value`]s using the
//! backend's native field names (`Bucket`, `Key`, `Body`, ...). Bags have no
//! fixed schema; callers may carry any extra fields through an operation and
//! get them back on the emitted result.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Field names understood by the backend request/response schema.
pub mod fields {
    pub const BUCKET: &str = "Bucket";
    pub const KEY: &str = "Key";
    pub const BODY: &str = "Body";
    pub const ACL: &str = "ACL";
    pub const NAME: &str = "Name";
    pub const CREATION_DATE: &str = "CreationDate";
    pub const LOCATION: &str = "Location";
    pub const SIZE: &str = "Size";
    pub const LAST_MODIFIED: &str = "LastModified";
    pub const ETAG: &str = "ETag";
    pub const STORAGE_CLASS: &str = "StorageClass";
    pub const VERSION_ID: &str = "VersionId";
    pub const DELETE_MARKER: &str = "DeleteMarker";
    pub const MFA: &str = "MFA";
    pub const PREFIX: &str = "Prefix";
    pub const MARKER: &str = "Marker";
    pub const DELIMITER: &str = "Delimiter";
    pub const MAX_KEYS: &str = "MaxKeys";
    pub const ENCODING_TYPE: &str = "EncodingType";
    pub const CACHE_CONTROL: &str = "CacheControl";
    pub const CONTENT_DISPOSITION: &str = "ContentDisposition";
    pub const CONTENT_ENCODING: &str = "ContentEncoding";
    pub const CONTENT_LANGUAGE: &str = "ContentLanguage";
    pub const CONTENT_LENGTH: &str = "ContentLength";
    pub const CONTENT_MD5: &str = "ContentMD5";
    pub const CONTENT_TYPE: &str = "ContentType";
    pub const EXPIRES: &str = "Expires";
    pub const GRANT_FULL_CONTROL: &str = "GrantFullControl";
    pub const GRANT_READ: &str = "GrantRead";
    pub const GRANT_READ_ACP: &str = "GrantReadACP";
    pub const GRANT_WRITE_ACP: &str = "GrantWriteACP";
    pub const METADATA: &str = "Metadata";
    pub const SSE_CUSTOMER_ALGORITHM: &str = "SSECustomerAlgorithm";
    pub const SSE_CUSTOMER_KEY: &str = "SSECustomerKey";
    pub const SSE_CUSTOMER_KEY_MD5: &str = "SSECustomerKeyMD5";
    pub const SSE_KMS_KEY_ID: &str = "SSEKMSKeyId";
    pub const SERVER_SIDE_ENCRYPTION: &str = "ServerSideEncryption";
    pub const WEBSITE_REDIRECT_LOCATION: &str = "WebsiteRedirectLocation";
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Bytes(Bytes),
    Time(DateTime<Utc>),
    Map(HashMap<String, String>),
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, String>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Coerces string and byte values into a payload; `None` for everything else.
    pub fn as_body(&self) -> Option<Bytes> {
        match self {
            Value::Bytes(b) => Some(b.clone()),
            Value::Str(s) => Some(Bytes::from(s.clone().into_bytes())),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Time(value)
    }
}

impl From<HashMap<String, String>> for Value {
    fn from(value: HashMap<String, String>) -> Self {
        Value::Map(value)
    }
}

/// An insertion-ordered bag of named attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrBag {
    entries: IndexMap<String, Value>,
}

impl AttrBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert) for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Shorthand for string-typed fields.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Add every field of `other` that this bag does not already carry.
    ///
    /// This is the merge direction used for backend responses: response fields
    /// are appended, caller-supplied fields always win on conflict.
    pub fn merge_missing(&mut self, other: &AttrBag) {
        for (name, value) in other.iter() {
            if !self.contains(name) {
                self.insert(name, value.clone());
            }
        }
    }
}

impl FromIterator<(String, Value)> for AttrBag {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
