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

//! Per-operation parameter whitelists.
//!
//! Callers may pipe richly-decorated bags through the client; each backend
//! operation only accepts a fixed set of fields, so requests are narrowed to
//! that set before dispatch. Unrecognized fields stay on the caller's bag and
//! are re-merged onto the emitted result.

use crate::bag::{fields, AttrBag};

/// A backend operation with a fixed parameter whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateBucket,
    DeleteBucket,
    PutObject,
    DeleteObject,
    ListObjects,
}

const CREATE_BUCKET_FIELDS: &[&str] = &[fields::BUCKET, fields::ACL];

const DELETE_BUCKET_FIELDS: &[&str] = &[fields::BUCKET];

const PUT_OBJECT_FIELDS: &[&str] = &[
    fields::BUCKET,
    fields::KEY,
    fields::ACL,
    fields::BODY,
    fields::CACHE_CONTROL,
    fields::CONTENT_DISPOSITION,
    fields::CONTENT_ENCODING,
    fields::CONTENT_LANGUAGE,
    fields::CONTENT_LENGTH,
    fields::CONTENT_MD5,
    fields::CONTENT_TYPE,
    fields::EXPIRES,
    fields::GRANT_FULL_CONTROL,
    fields::GRANT_READ,
    fields::GRANT_READ_ACP,
    fields::GRANT_WRITE_ACP,
    fields::METADATA,
    fields::SSE_CUSTOMER_ALGORITHM,
    fields::SSE_CUSTOMER_KEY,
    fields::SSE_CUSTOMER_KEY_MD5,
    fields::SSE_KMS_KEY_ID,
    fields::SERVER_SIDE_ENCRYPTION,
    fields::STORAGE_CLASS,
    fields::WEBSITE_REDIRECT_LOCATION,
];

const DELETE_OBJECT_FIELDS: &[&str] = &[
    fields::BUCKET,
    fields::KEY,
    fields::MFA,
    fields::VERSION_ID,
];

const LIST_OBJECTS_FIELDS: &[&str] = &[
    fields::BUCKET,
    fields::PREFIX,
    fields::MARKER,
    fields::DELIMITER,
    fields::MAX_KEYS,
    fields::ENCODING_TYPE,
];

impl OperationKind {
    /// The fields this operation accepts.
    pub fn allowed_fields(self) -> &'static [&'static str] {
        match self {
            OperationKind::CreateBucket => CREATE_BUCKET_FIELDS,
            OperationKind::DeleteBucket => DELETE_BUCKET_FIELDS,
            OperationKind::PutObject => PUT_OBJECT_FIELDS,
            OperationKind::DeleteObject => DELETE_OBJECT_FIELDS,
            OperationKind::ListObjects => LIST_OBJECTS_FIELDS,
        }
    }

    pub fn accepts(self, field: &str) -> bool {
        self.allowed_fields().contains(&field)
    }
}

/// Narrow `bag` down to the fields `op` accepts.
///
/// Values are carried over unchanged and the input's field order is kept.
/// The input bag is untouched; an empty result is valid when no whitelisted
/// field is present.
pub fn sanitize(bag: &AttrBag, op: OperationKind) -> AttrBag {
    bag.iter()
        .filter(|(name, _)| op.accepts(name))
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::Value;

    #[test]
    fn test_sanitize_keeps_exactly_the_intersection() {
        let bag = AttrBag::new()
            .with(fields::BUCKET, "b")
            .with(fields::KEY, "k")
            .with(fields::CONTENT_TYPE, "text/plain")
            .with("Custom", "x")
            .with(fields::MFA, "123456");

        let put = sanitize(&bag, OperationKind::PutObject);
        assert_eq!(put.len(), 3);
        assert_eq!(put.str_field(fields::BUCKET), Some("b"));
        assert_eq!(put.str_field(fields::KEY), Some("k"));
        assert_eq!(put.str_field(fields::CONTENT_TYPE), Some("text/plain"));
        assert!(!put.contains("Custom"));
        assert!(!put.contains(fields::MFA));

        let del = sanitize(&bag, OperationKind::DeleteObject);
        assert_eq!(del.len(), 3);
        assert!(del.contains(fields::MFA));
        assert!(!del.contains(fields::CONTENT_TYPE));
    }

    #[test]
    fn test_sanitize_preserves_values_and_order() {
        let bag = AttrBag::new()
            .with(fields::KEY, "k")
            .with(fields::BODY, Value::from(vec![1u8, 2, 3]))
            .with(fields::BUCKET, "b");

        let put = sanitize(&bag, OperationKind::PutObject);
        let names: Vec<&str> = put.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec![fields::KEY, fields::BODY, fields::BUCKET]);
        assert_eq!(put.get(fields::BODY), bag.get(fields::BODY));
    }

    #[test]
    fn test_sanitize_empty_result_is_valid() {
        let bag = AttrBag::new().with("Custom", "x");
        let out = sanitize(&bag, OperationKind::DeleteBucket);
        assert!(out.is_empty());
    }

    #[test]
    fn test_sanitize_leaves_input_untouched() {
        let bag = AttrBag::new().with(fields::BUCKET, "b").with("Custom", "x");
        let _ = sanitize(&bag, OperationKind::DeleteBucket);
        assert_eq!(bag.len(), 2);
        assert!(bag.contains("Custom"));
    }

    #[test]
    fn test_listing_whitelist() {
        let op = OperationKind::ListObjects;
        assert!(op.accepts(fields::BUCKET));
        assert!(op.accepts(fields::PREFIX));
        assert!(op.accepts(fields::MARKER));
        assert!(op.accepts(fields::MAX_KEYS));
        assert!(!op.accepts(fields::BODY));
    }
}
