/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License"); 
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]

use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, warn};
use flylive_common::{datetime::EpochMillis, some_or_continue};
use flylive_track::ops::{merge_tracks, trim_before};

use crate::{
    AccountUpdate, ProviderBatchResult,
    account::{PilotId, PilotRecord},
    config::LiveConfig,
    errors::StoreError,
    store::{PilotStore, StoreResult, Transaction}
};

/// persists provider results into pilot records. Each `save` runs in its own optimistic transaction
/// that is retried on conflicts, up to `max_attempts` times
#[derive(Clone)]
pub struct StoreWriter {
    store: Arc<dyn PilotStore>,
    max_attempts: usize,
    backoff: Duration,
    retention: Duration,
}

impl StoreWriter {
    pub fn new (store: Arc<dyn PilotStore>, config: &LiveConfig)->Self {
        StoreWriter { 
            store, 
            max_attempts: config.txn_max_attempts.max(1), 
            backoff: config.txn_backoff, 
            retention: config.retention 
        }
    }

    /// apply the updates of all `results` for `pilot_ids` (which should be a small key batch).
    /// Returns the number of written records
    pub async fn save (&self, pilot_ids: &[PilotId], results: &[ProviderBatchResult], now: EpochMillis)->StoreResult<usize> {
        let cutoff_sec = now.saturating_sub( self.retention).secs();
        let mut attempt = 1;

        loop {
            match self.try_save( pilot_ids, results, now, cutoff_sec).await {
                Ok(n) => return Ok(n),
                Err(e) if e.is_conflict() && attempt < self.max_attempts => {
                    debug!("retrying conflicting transaction (attempt {attempt}): {e}");
                    attempt += 1;
                    if !self.backoff.is_zero() {
                        sleep( self.backoff).await;
                    }
                }
                Err(e) => {
                    warn!("failed to save {} pilots after {attempt} attempts: {e}", pilot_ids.len());
                    return Err(e)
                }
            }
        }
    }

    async fn try_save (&self, pilot_ids: &[PilotId], results: &[ProviderBatchResult], now: EpochMillis, cutoff_sec: i64)->StoreResult<usize> {
        let mut txn = Transaction::begin( self.store.as_ref());

        let records = match txn.read( pilot_ids).await {
            Ok(records) => records,
            Err(e) => {
                txn.rollback();
                return Err(e)
            }
        };

        let n = records.len();
        for mut record in records {
            apply_updates( &mut record, results, now, cutoff_sec);
            txn.write( record)?;
        }
        txn.commit().await?; // rolls back on failure
        Ok(n)
    }
}

/// apply all provider updates for `record`. Updates that were fetched for an account value that has
/// been changed in the meantime (settings edit) are ignored
pub fn apply_updates (record: &mut PilotRecord, results: &[ProviderBatchResult], now: EpochMillis, cutoff_sec: i64) {
    for result in results {
        let update = some_or_continue!( result.updates.get( &record.id));
        let account = some_or_continue!( record.account_mut( result.provider));
        if account.account != update.account {
            continue
        }

        account.counter.record( update.is_error());
        account.last_attempt = now;
        if !update.is_error() {
            account.last_updated = now;
        }
        match &update.account_update {
            Some(AccountUpdate::Resolved(id)) => account.account = id.clone(),
            Some(AccountUpdate::Disable) => account.enabled = false,
            None => {}
        }

        if !update.is_error() && let Some(track) = &update.track {
            record.track = merge_tracks( &record.track, track);
        }
    }

    trim_before( &mut record.track, cutoff_sec);
    record.track.id = Some( record.id);
    record.track.name = record.name.clone();
    record.sync_last_fix();
}
