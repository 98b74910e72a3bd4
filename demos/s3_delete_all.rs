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

//! List every bucket on the account and purge the one named on the command
//! line. Credentials come from `BUCKET_STREAM_ACCESS_KEY_ID` and
//! `BUCKET_STREAM_SECRET_ACCESS_KEY`, falling back to the SDK's default
//! provider chain when unset.

use bucket_stream::{fields, name_to_bucket, AttrBag, BackendConfig, BackendFactory, StreamClient};
use futures::StreamExt;
use std::env;
use std::error::Error;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let target = env::args().nth(1).expect("usage: s3_delete_all <bucket>");

    let mut config = BackendConfig::s3();
    if let (Ok(access_key_id), Ok(secret_access_key)) = (
        env::var("BUCKET_STREAM_ACCESS_KEY_ID"),
        env::var("BUCKET_STREAM_SECRET_ACCESS_KEY"),
    ) {
        config = config
            .with_option("access_key_id", access_key_id)
            .with_option("secret_access_key", secret_access_key);
    }
    if let Ok(region) = env::var("BUCKET_STREAM_REGION") {
        config = config.with_option("region", region);
    }

    let backend = BackendFactory::from_config(config).await?;
    let client = StreamClient::new(backend);

    let mut buckets = client.stream_buckets();
    while let Some(bucket) = buckets.next().await {
        let bucket = bucket?;
        info!("Found bucket name={:?}", bucket.str_field(fields::NAME));
    }

    let params: AttrBag = name_to_bucket(&AttrBag::new().with(fields::NAME, target.clone()));
    let mut outcomes = client.purge_bucket(params, 3);
    while let Some(outcome) = outcomes.next().await {
        match outcome {
            Ok(deleted) => info!("Deleted key={:?}", deleted.str_field(fields::KEY)),
            Err(err) => warn!("Delete failed: {err}"),
        }
    }

    client
        .delete_bucket(AttrBag::new().with(fields::BUCKET, target))
        .next()
        .await
        .unwrap()?;
    info!("Bucket removed");

    Ok(())
}
