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

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::backend::StorageBackend;
use crate::bag::{fields, AttrBag};
use crate::client::StreamClient;
use crate::stream::OpStream;

/// An enumerated object plus the backend it came from.
///
/// The handle's bag carries the entity's listing metadata (`Key`, `Size`,
/// `LastModified`, ...) with the owning `Bucket` merged in and a null `Body`;
/// listings never fetch content. The backend reference enables chained
/// operations without going back through the client.
#[derive(Clone)]
pub struct ObjectHandle {
    bag: AttrBag,
    backend: Arc<dyn StorageBackend>,
}

impl ObjectHandle {
    pub(crate) fn new(bag: AttrBag, backend: Arc<dyn StorageBackend>) -> Self {
        Self { bag, backend }
    }

    pub fn bag(&self) -> &AttrBag {
        &self.bag
    }

    pub fn into_bag(self) -> AttrBag {
        self.bag
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bag.str_field(fields::BUCKET)
    }

    pub fn key(&self) -> Option<&str> {
        self.bag.str_field(fields::KEY)
    }

    /// Delete this object: a lazy one-item stream over the delete call, with
    /// the handle's full bag re-attached to the emitted result.
    pub fn delete(&self) -> OpStream {
        StreamClient::new(Arc::clone(&self.backend)).delete_object(self.bag.clone())
    }
}

impl Debug for ObjectHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "ObjectHandle(bucket={:?}, key={:?})",
            self.bucket(),
            self.key()
        )
    }
}
