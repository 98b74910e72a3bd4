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

//! Virtual file descriptors for the upload convenience path.

use bytes::Bytes;

use crate::bag::{AttrBag, Value};
use crate::error::{StorageError, StorageResult};

/// A file-like upload source.
///
/// Anything exposing a root prefix (`base`), a full `path`, and binary
/// `contents` can be uploaded without naming a storage key explicitly: the
/// key is derived by stripping `base` off `path`. A descriptor may instead
/// carry an explicit key, which is used unchanged.
pub trait VirtualFile {
    /// Root prefix the storage key is computed relative to.
    fn base(&self) -> &str;

    /// Full path of the file.
    fn path(&self) -> &str;

    /// File payload.
    fn contents(&self) -> Bytes;

    /// Explicit storage key, skipping derivation entirely.
    fn key(&self) -> Option<&str> {
        None
    }

    /// Extra request fields to carry on the upload (e.g. `Bucket`,
    /// `ContentType`).
    fn params(&self) -> AttrBag {
        AttrBag::new()
    }
}

/// Resolve the storage key for a descriptor.
///
/// An explicit key wins. Otherwise the key is `path` with the leading `base`
/// removed; if `path` does not start with `base`, or nothing remains after
/// stripping, the derivation fails before any backend call is made.
pub fn object_key<F: VirtualFile + ?Sized>(file: &F) -> StorageResult<String> {
    if let Some(key) = file.key() {
        return Ok(key.to_string());
    }

    let base = file.base();
    let path = file.path();
    match path.strip_prefix(base) {
        Some(derived) if !derived.is_empty() => Ok(derived.to_string()),
        _ => Err(StorageError::InvalidKeyDerivation {
            base: base.to_string(),
            path: path.to_string(),
        }),
    }
}

/// A plain in-memory [`VirtualFile`].
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub base: String,
    pub path: String,
    pub contents: Bytes,
    pub key: Option<String>,
    pub params: AttrBag,
}

impl StagedFile {
    pub fn new(
        base: impl Into<String>,
        path: impl Into<String>,
        contents: impl Into<Bytes>,
    ) -> Self {
        Self {
            base: base.into(),
            path: path.into(),
            contents: contents.into(),
            key: None,
            params: AttrBag::new(),
        }
    }

    /// Set an explicit storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach an extra upload request field.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }
}

impl VirtualFile for StagedFile {
    fn base(&self) -> &str {
        &self.base
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn contents(&self) -> Bytes {
        self.contents.clone()
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn params(&self) -> AttrBag {
        self.params.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derived_from_base_and_path() {
        let file = StagedFile::new("/public/", "/public/index.html", "x");
        assert_eq!(object_key(&file).unwrap(), "index.html");
    }

    #[test]
    fn test_key_derivation_keeps_nested_path() {
        let file = StagedFile::new("/public/", "/public/css/site.css", "x");
        assert_eq!(object_key(&file).unwrap(), "css/site.css");
    }

    #[test]
    fn test_path_equal_to_base_fails() {
        let file = StagedFile::new("/public/", "/public/", "x");
        match object_key(&file) {
            Err(StorageError::InvalidKeyDerivation { base, path }) => {
                assert_eq!(base, "/public/");
                assert_eq!(path, "/public/");
            }
            other => panic!("Expected derivation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_path_outside_base_fails() {
        let file = StagedFile::new("/public/", "/other/index.html", "x");
        assert!(matches!(
            object_key(&file),
            Err(StorageError::InvalidKeyDerivation { .. })
        ));
    }

    #[test]
    fn test_explicit_key_wins() {
        let file = StagedFile::new("/public/", "/other/index.html", "x").with_key("given.html");
        assert_eq!(object_key(&file).unwrap(), "given.html");
    }
}
