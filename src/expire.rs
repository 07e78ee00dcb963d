//
// One pass over the bucket listing: match, classify against the cutoff,
// and delete expired archives through a batched queue when committing.
//

use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use chrono::NaiveDate;
use tokio_stream::StreamExt;

use crate::config::Config;
use crate::error::Result;
use crate::matcher;

// DeleteObjects accepts at most 1000 keys per request.
const DELETE_BATCH_LIMIT: usize = 1000;

/// What a single listed key turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Key does not fit the access log grammar; not counted, never deleted.
    Skip,
    /// A recognised archive dated on or after the cutoff.
    Keep(NaiveDate),
    /// A recognised archive dated strictly before the cutoff.
    Expire(NaiveDate),
}

/// Classify one object key against the cutoff. The cutoff day itself is
/// kept; only archives dated strictly before it expire.
pub fn classify(key: &str, cutoff: NaiveDate) -> Decision {
    match matcher::match_access_log(key) {
        None => Decision::Skip,
        Some(date) if date < cutoff => Decision::Expire(date),
        Some(date) => Decision::Keep(date),
    }
}

/// Counters for one run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    /// Keys that matched the access log grammar.
    pub matched: u64,
    /// Matched keys dated before the cutoff.
    pub selected: u64,
    /// Keys actually deleted (always 0 without --commit).
    pub deleted: u64,
}

/// Expiry decisions accumulated over one listing pass. Keys enter the
/// delete queue only in commit mode; a simulation run counts expired
/// archives but queues nothing.
pub struct Sweep {
    cutoff: NaiveDate,
    commit: bool,
    matched: u64,
    selected: u64,
    delete_queue: Vec<ObjectIdentifier>,
}

impl Sweep {
    pub fn new(cutoff: NaiveDate, commit: bool) -> Self {
        Self {
            cutoff,
            commit,
            matched: 0,
            selected: 0,
            delete_queue: Vec::new(),
        }
    }

    /// Apply the expiry policy to one key, updating counters and (in
    /// commit mode) the delete queue. Returns the decision so the caller
    /// can report progress.
    pub fn observe(&mut self, key: &str) -> Decision {
        let decision = classify(key, self.cutoff);
        match decision {
            Decision::Skip => {}
            Decision::Keep(_) => self.matched += 1,
            Decision::Expire(_) => {
                self.matched += 1;
                self.selected += 1;
                if self.commit {
                    self.delete_queue
                        .push(ObjectIdentifier::builder().key(key).build());
                }
            }
        }
        decision
    }

    /// Drain the queue once it reaches the per-request limit.
    fn full_batch(&mut self) -> Option<Vec<ObjectIdentifier>> {
        (self.delete_queue.len() >= DELETE_BATCH_LIMIT)
            .then(|| std::mem::take(&mut self.delete_queue))
    }

    /// Drain whatever is left after the listing completes.
    fn final_batch(&mut self) -> Option<Vec<ObjectIdentifier>> {
        (!self.delete_queue.is_empty()).then(|| std::mem::take(&mut self.delete_queue))
    }

    fn queued(&self) -> usize {
        self.delete_queue.len()
    }

    fn into_stats(self, deleted: u64) -> RunStats {
        RunStats {
            matched: self.matched,
            selected: self.selected,
            deleted,
        }
    }
}

/// Walk the full listing for the configured bucket/prefix and apply the
/// expiry policy to every key. Listing pagination is sequential; deletes
/// are queued and flushed in batches of up to 1000 keys.
pub async fn process_bucket(client: &Client, config: &Config) -> Result<RunStats> {
    let mut sweep = Sweep::new(config.expire_before, config.commit);
    let mut deleted: u64 = 0;

    let mut pages = client
        .list_objects_v2()
        .bucket(&config.bucket)
        .set_prefix(config.prefix.clone())
        .into_paginator()
        .send();

    while let Some(page) = pages.next().await {
        let page = page.map_err(aws_sdk_s3::Error::from)?;
        tracing::debug!(keys = page.key_count(), "processing listing page");

        for object in page.contents().unwrap_or_default() {
            let Some(key) = object.key() else { continue };

            let decision = sweep.observe(key);
            if config.progress && decision != Decision::Skip {
                println!(
                    "{key} - {}{}",
                    if matches!(decision, Decision::Expire(_)) {
                        "DELETE"
                    } else {
                        "KEEP"
                    },
                    if config.commit { "" } else { " (DRY RUN)" }
                );
            }

            if let Some(batch) = sweep.full_batch() {
                deleted += send_delete(client, &config.bucket, batch).await?;
            }
        }
    }

    if let Some(batch) = sweep.final_batch() {
        deleted += send_delete(client, &config.bucket, batch).await?;
    }

    Ok(sweep.into_stats(deleted))
}

/// Send one DeleteObjects request for a drained batch.
async fn send_delete(client: &Client, bucket: &str, batch: Vec<ObjectIdentifier>) -> Result<u64> {
    let count = batch.len() as u64;
    tracing::debug!(count, "deleting batch of expired archives");

    let delete = Delete::builder().set_objects(Some(batch)).quiet(true).build();

    client
        .delete_objects()
        .bucket(bucket)
        .delete(delete)
        .send()
        .await
        .map_err(aws_sdk_s3::Error::from)?;

    Ok(count)
}
