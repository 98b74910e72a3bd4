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

//! Populate an in-memory bucket, stream its contents, then purge it with a
//! bounded fan-out. Runs entirely in-process.

use bucket_stream::{fields, AttrBag, BackendConfig, BackendFactory, StagedFile, StreamClient};
use futures::StreamExt;
use std::error::Error;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Small page size so the listing below actually paginates.
    let backend = BackendFactory::from_config(
        BackendConfig::memory().with_option("page_size", "4"),
    )
    .await?;
    let client = StreamClient::new(backend);

    let bucket = AttrBag::new().with(fields::BUCKET, "demo");
    client.create_bucket(bucket.clone()).next().await.unwrap()?;

    for i in 0..10 {
        let file = StagedFile::new("/public/", format!("/public/page{i}.html"), "<html></html>")
            .with_param(fields::BUCKET, "demo")
            .with_param(fields::CONTENT_TYPE, "text/html");
        let uploaded = client.put_file_object(&file)?.next().await.unwrap()?;
        info!("Uploaded key={:?}", uploaded.str_field(fields::KEY));
    }

    let mut contents = client.stream_bucket_contents(bucket.clone());
    while let Some(object) = contents.next().await {
        let object = object?;
        info!("Listed key={:?} bucket={:?}", object.key(), object.bucket());
    }

    let outcomes: Vec<_> = client.purge_bucket(bucket.clone(), 3).collect().await;
    let failures = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    info!("Purged count={} failures={}", outcomes.len(), failures);

    client.delete_bucket(bucket).next().await.unwrap()?;
    info!("Bucket removed");

    Ok(())
}
