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

//! # Bucket Stream
//!
//! A Rust library exposing object-storage operations as lazily-evaluated,
//! composable asynchronous streams.
//!
//! Bucket Stream wraps a storage backend client (AWS S3, or an in-process
//! memory backend) and re-expresses its operations as streams: single-shot
//! calls become one-item streams that fire on first poll, paged listings
//! become flat entity streams with transparent continuation, and per-item
//! operations can be fanned out with a bounded concurrency level. Transport,
//! signing, credential resolution, and retry policy stay with the backend
//! client.
//!
//! ## Features
//!
//! - **Lazy one-shot wrappers**: create/delete bucket and put/delete object
//!   as single-item streams; nothing is sent until the stream is polled
//! - **Parameter whitelisting**: richly-decorated request bags are narrowed
//!   per operation and re-merged onto results, so extra fields pipe through
//! - **Auto-paginated listing**: one item per object, page boundaries and
//!   continuation tokens handled internally
//! - **Bounded fan-out**: apply a per-item operation across a stream with at
//!   most N calls in flight; individual failures surface as items
//! - **Upload convenience**: derive storage keys from file-like descriptors
//!   with a base/path pair
//!
//! ## Quick Start
//!
//! ### Delete every object in a bucket
//!
//! ```rust,no_run
//! use bucket_stream::{fields, AttrBag, BackendConfig, BackendFactory, StreamClient};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let backend = BackendFactory::from_config(
//!     BackendConfig::s3().with_option("region", "us-east-1"),
//! )
//! .await?;
//! let client = StreamClient::new(backend);
//!
//! let params = AttrBag::new().with(fields::BUCKET, "my-bucket");
//! let mut outcomes = client.purge_bucket(params, 3);
//! while let Some(outcome) = outcomes.next().await {
//!     match outcome {
//!         Ok(deleted) => println!("deleted {:?}", deleted.str_field(fields::KEY)),
//!         Err(err) => eprintln!("delete failed: {err}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Stream bucket contents
//!
//! ```rust,no_run
//! use bucket_stream::{fields, AttrBag, BackendConfig, BackendFactory, StreamClient};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let backend = BackendFactory::from_config(BackendConfig::s3()).await?;
//! let client = StreamClient::new(backend);
//!
//! let params = AttrBag::new()
//!     .with(fields::BUCKET, "my-bucket")
//!     .with(fields::PREFIX, "reports/");
//! let mut contents = client.stream_bucket_contents(params);
//! while let Some(object) = contents.next().await {
//!     println!("{:?}", object?.key());
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod bag;
pub mod client;
pub mod config;
pub mod error;
pub mod handle;
pub mod params;
pub mod stream;
pub mod vfile;

// Public exports
pub use backend::memory::InMemoryBackend;
pub use backend::s3::S3Backend;
pub use backend::{ObjectPage, PageCursor, StorageBackend};
pub use bag::{fields, AttrBag, Value};
pub use client::{name_to_bucket, ObjectStream, StreamClient};
pub use config::{BackendConfig, BackendFactory, BackendType};
pub use error::{BackendError, StorageError, StorageResult};
pub use handle::ObjectHandle;
pub use params::{sanitize, OperationKind};
pub use stream::{fan_out, FanOut, ListingStream, OpStream};
pub use vfile::{object_key, StagedFile, VirtualFile};
