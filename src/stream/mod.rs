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

//! Lazy sequence adapters over backend calls.
//!
//! Three building blocks compose here:
//!
//! - [`OpStream`](call::OpStream) turns a single-shot backend call into a lazy
//!   one-item stream.
//! - [`ListingStream`](list::ListingStream) drives a paged enumeration and
//!   hides page boundaries from the consumer.
//! - [`fan_out`](fanout::fan_out) runs a stream of operations with bounded
//!   concurrency, collecting every outcome.

pub mod call;
pub mod fanout;
pub mod list;

pub use call::OpStream;
pub use fanout::{fan_out, FanOut};
pub use list::ListingStream;
