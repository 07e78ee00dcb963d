//
// cloudfront-log-expire - removes aged CloudFront access log archives from
//                         an S3 bucket. Archives are selected by the date
//                         embedded in their filename, compared against an
//                         explicit cutoff date or a day count.
//
// Copyright (C) 2026
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

#![allow(clippy::result_large_err)]

use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::{config::Region, Client};
use chrono::Utc;
use clap::Parser;

mod config;
mod error;
mod expire;
mod matcher;

use config::Config;
use error::{ExpireError, Result};

#[derive(Debug, Parser)]
#[command(
    about = "Remove AWS CloudFront access log archives from an S3 bucket \
             before a given date or number of expiry days"
)]
struct Opt {
    /// S3 bucket holding CloudFront access log archives
    #[arg(long, value_name = "NAME")]
    s3_bucket_name: String,

    /// S3 bucket path prefix to access log archives
    #[arg(long, value_name = "PREFIX")]
    s3_bucket_log_prefix: Option<String>,

    /// Expire log archives before given date
    #[arg(long, value_name = "YYYY-MM-DD")]
    expire_before: Option<String>,

    /// Expire log archives older than X number of days
    #[arg(long, value_name = "DAY_COUNT")]
    expire_days: Option<u64>,

    /// Display progress of access log archive processing
    #[arg(long)]
    progress: bool,

    /// Delete access log archives, otherwise simulation only
    #[arg(long)]
    commit: bool,

    /// The AWS endpoint
    #[arg(long, env = "AWS_ENDPOINT")]
    endpoint: Option<String>,

    /// The AWS Region
    #[arg(long, env = "AWS_DEFAULT_REGION")]
    region: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(error) = run(Opt::parse()).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run(opt: Opt) -> Result<()> {
    // All argument validation happens before the S3 client is built.
    let config = Config::resolve(
        opt.s3_bucket_name,
        opt.s3_bucket_log_prefix,
        opt.expire_before,
        opt.expire_days,
        opt.progress,
        opt.commit,
        Utc::now().date_naive(),
    )?;

    let region_provider = RegionProviderChain::first_try(opt.region.map(Region::new))
        .or_default_provider()
        .or_else(Region::new("us-east-1"));

    let mut loader = aws_config::from_env().region(region_provider);
    if let Some(endpoint) = opt.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let shared_config = loader.load().await;
    let client = Client::new(&shared_config);

    // Probe the bucket up front so a typo or a missing permission fails
    // before any expiry decision is printed.
    client
        .head_bucket()
        .bucket(&config.bucket)
        .send()
        .await
        .map_err(|error| ExpireError::bucket_unavailable(&config.bucket, error.into()))?;

    println!("Processing S3 bucket [{}]", config.bucket);
    if let Some(prefix) = &config.prefix {
        println!("Log prefix path [{prefix}]");
    }
    println!(
        "Deleting logs prior to [{}]\n",
        config.expire_before.format("%Y-%m-%d")
    );

    let stats = expire::process_bucket(&client, &config).await?;

    println!("\nTotal archive count [{}]", stats.matched);
    if config.commit {
        println!("Archives deleted [{}]", stats.deleted);
    } else {
        println!("Archives deleted [{}] (DRY RUN)", stats.selected);
    }
    println!("Remaining [{}]", stats.matched - stats.selected);

    Ok(())
}
