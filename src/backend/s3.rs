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

//! Backend over the AWS S3 SDK client.
//!
//! Requests are translated field-by-field onto the SDK's operation builders;
//! responses and errors come back with the SDK's own codes and values. Retry
//! and timeout policy live in the SDK client configuration, not here.

use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SdkDateTime};
use aws_sdk_s3::types::{
    BucketCannedAcl, EncodingType, Object, ObjectCannedAcl, ServerSideEncryption, StorageClass,
};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{require_str, ObjectPage, PageCursor, StorageBackend};
use crate::bag::{fields, AttrBag, Value};
use crate::error::BackendError;

/// Storage backend backed by an `aws_sdk_s3::Client`.
///
/// The client is injected by the caller; credential resolution, signing, and
/// transport behavior are entirely its concern.
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn kind(&self) -> &'static str {
        "s3"
    }

    async fn create_bucket(&self, request: &AttrBag) -> Result<AttrBag, BackendError> {
        let bucket = require_str(request, fields::BUCKET)?;
        let mut req = self.client.create_bucket().bucket(bucket);
        if let Some(acl) = request.str_field(fields::ACL) {
            req = req.acl(BucketCannedAcl::from(acl));
        }

        let out = req.send().await.map_err(sdk_error)?;

        let mut response = AttrBag::new();
        if let Some(location) = out.location() {
            response.insert(fields::LOCATION, location);
        }
        Ok(response)
    }

    async fn delete_bucket(&self, request: &AttrBag) -> Result<AttrBag, BackendError> {
        let bucket = require_str(request, fields::BUCKET)?;
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(AttrBag::new())
    }

    async fn put_object(&self, request: &AttrBag) -> Result<AttrBag, BackendError> {
        let mut req = self.client.put_object();

        for (name, value) in request.iter() {
            match name {
                fields::BUCKET => req = req.bucket(expect_str(value)),
                fields::KEY => req = req.key(expect_str(value)),
                fields::BODY => {
                    let body = value.as_body().unwrap_or_default();
                    req = req.body(ByteStream::from(body));
                }
                fields::ACL => req = req.acl(ObjectCannedAcl::from(expect_str(value))),
                fields::CACHE_CONTROL => req = req.cache_control(expect_str(value)),
                fields::CONTENT_DISPOSITION => req = req.content_disposition(expect_str(value)),
                fields::CONTENT_ENCODING => req = req.content_encoding(expect_str(value)),
                fields::CONTENT_LANGUAGE => req = req.content_language(expect_str(value)),
                fields::CONTENT_LENGTH => {
                    if let Some(length) = value.as_i64() {
                        req = req.content_length(length);
                    }
                }
                fields::CONTENT_MD5 => req = req.content_md5(expect_str(value)),
                fields::CONTENT_TYPE => req = req.content_type(expect_str(value)),
                fields::EXPIRES => {
                    if let Some(expires) = value.as_time() {
                        req = req.expires(SdkDateTime::from_secs(expires.timestamp()));
                    }
                }
                fields::GRANT_FULL_CONTROL => req = req.grant_full_control(expect_str(value)),
                fields::GRANT_READ => req = req.grant_read(expect_str(value)),
                fields::GRANT_READ_ACP => req = req.grant_read_acp(expect_str(value)),
                fields::GRANT_WRITE_ACP => req = req.grant_write_acp(expect_str(value)),
                fields::METADATA => {
                    if let Some(map) = value.as_map() {
                        for (meta_key, meta_value) in map {
                            req = req.metadata(meta_key.clone(), meta_value.clone());
                        }
                    }
                }
                fields::SSE_CUSTOMER_ALGORITHM => {
                    req = req.sse_customer_algorithm(expect_str(value))
                }
                fields::SSE_CUSTOMER_KEY => req = req.sse_customer_key(expect_str(value)),
                fields::SSE_CUSTOMER_KEY_MD5 => req = req.sse_customer_key_md5(expect_str(value)),
                fields::SSE_KMS_KEY_ID => req = req.ssekms_key_id(expect_str(value)),
                fields::SERVER_SIDE_ENCRYPTION => {
                    req = req.server_side_encryption(ServerSideEncryption::from(expect_str(value)))
                }
                fields::STORAGE_CLASS => {
                    req = req.storage_class(StorageClass::from(expect_str(value)))
                }
                fields::WEBSITE_REDIRECT_LOCATION => {
                    req = req.website_redirect_location(expect_str(value))
                }
                _ => debug!("Skipping put_object field not supported by the SDK: {name}"),
            }
        }

        let out = req.send().await.map_err(sdk_error)?;

        let mut response = AttrBag::new();
        if let Some(etag) = out.e_tag() {
            response.insert(fields::ETAG, etag);
        }
        if let Some(version_id) = out.version_id() {
            response.insert(fields::VERSION_ID, version_id);
        }
        if let Some(sse) = out.server_side_encryption() {
            response.insert(fields::SERVER_SIDE_ENCRYPTION, sse.as_str());
        }
        Ok(response)
    }

    async fn delete_object(&self, request: &AttrBag) -> Result<AttrBag, BackendError> {
        let bucket = require_str(request, fields::BUCKET)?;
        let key = require_str(request, fields::KEY)?;

        let mut req = self.client.delete_object().bucket(bucket).key(key);
        if let Some(mfa) = request.str_field(fields::MFA) {
            req = req.mfa(mfa);
        }
        if let Some(version_id) = request.str_field(fields::VERSION_ID) {
            req = req.version_id(version_id);
        }

        let out = req.send().await.map_err(sdk_error)?;

        let mut response = AttrBag::new();
        if let Some(marker) = out.delete_marker() {
            response.insert(fields::DELETE_MARKER, marker);
        }
        if let Some(version_id) = out.version_id() {
            response.insert(fields::VERSION_ID, version_id);
        }
        Ok(response)
    }

    async fn list_objects_page(
        &self,
        request: &AttrBag,
        cursor: Option<&PageCursor>,
    ) -> Result<ObjectPage, BackendError> {
        let bucket = require_str(request, fields::BUCKET)?;

        let mut req = self.client.list_objects_v2().bucket(bucket);
        if let Some(prefix) = request.str_field(fields::PREFIX) {
            req = req.prefix(prefix);
        }
        if let Some(delimiter) = request.str_field(fields::DELIMITER) {
            req = req.delimiter(delimiter);
        }
        if let Some(encoding) = request.str_field(fields::ENCODING_TYPE) {
            req = req.encoding_type(EncodingType::from(encoding));
        }
        if let Some(max_keys) = request.get(fields::MAX_KEYS).and_then(Value::as_i64) {
            req = req.max_keys(max_keys as i32);
        }
        match cursor {
            Some(cursor) => req = req.continuation_token(cursor.as_str()),
            // The caller's Marker seeds the enumeration start on the first page.
            None => {
                if let Some(marker) = request.str_field(fields::MARKER) {
                    req = req.start_after(marker);
                }
            }
        }

        let out = req.send().await.map_err(sdk_error)?;

        let entries = out.contents().iter().map(object_entry).collect();
        let next = out.next_continuation_token().map(PageCursor::new);
        Ok(ObjectPage { entries, next })
    }

    async fn list_buckets_page(
        &self,
        _cursor: Option<&PageCursor>,
    ) -> Result<ObjectPage, BackendError> {
        let out = self.client.list_buckets().send().await.map_err(sdk_error)?;

        let entries = out
            .buckets()
            .iter()
            .map(|bucket| {
                let mut entry = AttrBag::new();
                if let Some(name) = bucket.name() {
                    entry.insert(fields::NAME, name);
                }
                if let Some(created) = bucket.creation_date().and_then(to_chrono) {
                    entry.insert(fields::CREATION_DATE, created);
                }
                entry
            })
            .collect();

        Ok(ObjectPage {
            entries,
            next: None,
        })
    }
}

fn object_entry(object: &Object) -> AttrBag {
    let mut entry = AttrBag::new();
    if let Some(key) = object.key() {
        entry.insert(fields::KEY, key);
    }
    if let Some(size) = object.size() {
        entry.insert(fields::SIZE, size);
    }
    if let Some(modified) = object.last_modified().and_then(to_chrono) {
        entry.insert(fields::LAST_MODIFIED, modified);
    }
    if let Some(etag) = object.e_tag() {
        entry.insert(fields::ETAG, etag);
    }
    if let Some(class) = object.storage_class() {
        entry.insert(fields::STORAGE_CLASS, class.as_str());
    }
    entry
}

fn to_chrono(timestamp: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

/// String fields arrive as `Value::Str` from the sanitizer; anything else is
/// a caller bug surfaced as an empty value rather than a panic.
fn expect_str(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

fn sdk_error<E>(err: E) -> BackendError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let code = err.code().unwrap_or("Unknown").to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    BackendError::new(code, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::types::ObjectStorageClass;

    #[test]
    fn test_object_entry_maps_reported_metadata() {
        let object = Object::builder()
            .key("itemKey0")
            .size(11)
            .e_tag("\"abc\"")
            .set_storage_class(Some(ObjectStorageClass::Standard))
            .build();

        let entry = object_entry(&object);
        assert_eq!(entry.str_field(fields::KEY), Some("itemKey0"));
        assert_eq!(entry.get(fields::SIZE).and_then(Value::as_i64), Some(11));
        assert_eq!(entry.str_field(fields::ETAG), Some("\"abc\""));
        assert_eq!(entry.str_field(fields::STORAGE_CLASS), Some("STANDARD"));
    }

    #[test]
    fn test_to_chrono() {
        let converted = to_chrono(&SdkDateTime::from_secs(1_700_000_000)).unwrap();
        assert_eq!(converted.timestamp(), 1_700_000_000);
    }
}
