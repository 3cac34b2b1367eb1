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

use std::{cmp::max, collections::BTreeMap, sync::Arc, time::Duration};
use async_trait::async_trait;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};
use flylive_common::{datetime::{EpochMillis, duration_secs}, net::HttpFetch};
use flylive_track::{LivePoint, LiveTrack, Provider, ops::{build_track, simplify_track, trim_before}};

use crate::{
    account::{DueAccount, PilotId},
    config::ProviderSettings,
    errors::Result,
    store::PilotStore
};

/// account changes an adapter can request from the store writer
#[derive(Debug,Clone,PartialEq)]
pub enum AccountUpdate {
    /// replace the (human entered) account with its canonical provider id
    Resolved(String),
    /// the account is unknown to the provider
    Disable,
}

/// the outcome of fetching one account. Either `track` or `error` can be set, or neither if the
/// account did not report fixes
#[derive(Debug,Clone,PartialEq)]
pub struct TrackUpdate {
    /// the account value the update was fetched for
    pub account: String,
    pub track: Option<LiveTrack>,
    pub error: Option<String>,
    pub account_update: Option<AccountUpdate>,
}

impl TrackUpdate {
    pub fn empty (account: &str)->Self {
        TrackUpdate { account: account.to_string(), track: None, error: None, account_update: None }
    }

    pub fn failed (account: &str, error: impl ToString)->Self {
        TrackUpdate { account: account.to_string(), track: None, error: Some(error.to_string()), account_update: None }
    }

    pub fn is_error (&self)->bool { self.error.is_some() }
}

/// everything one adapter invocation produced
#[derive(Debug,Clone)]
pub struct ProviderBatchResult {
    pub provider: Provider,
    pub updates: BTreeMap<PilotId,TrackUpdate>,
    /// batch level errors (failed requests, deadline)
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl ProviderBatchResult {
    pub fn new (provider: Provider)->Self {
        ProviderBatchResult { provider, updates: BTreeMap::new(), errors: Vec::new(), duration: Duration::ZERO }
    }

    pub fn failed (provider: Provider, error: impl ToString)->Self {
        let mut result = ProviderBatchResult::new( provider);
        result.errors.push( error.to_string());
        result
    }

    /// number of accounts that reported fixes
    pub fn device_count (&self)->usize {
        self.updates.values().filter( |u| u.track.is_some()).count()
    }

    pub fn account_errors (&self)->BTreeMap<PilotId,String> {
        self.updates.iter()
            .filter_map( |(id,u)| u.error.as_ref().map( |e| (*id, e.clone())))
            .collect()
    }
}

/// the raw per-account result of a provider request, before track construction
#[derive(Debug,Clone)]
pub struct AccountFetch {
    pub pilot_id: PilotId,
    pub result: std::result::Result<Vec<LivePoint>,String>,
    pub account_update: Option<AccountUpdate>,
}

impl AccountFetch {
    pub fn ok (pilot_id: PilotId, points: Vec<LivePoint>)->Self {
        AccountFetch { pilot_id, result: Ok(points), account_update: None }
    }

    pub fn failed (pilot_id: PilotId, error: impl ToString)->Self {
        AccountFetch { pilot_id, result: Err(error.to_string()), account_update: None }
    }

    pub fn with_account_update (mut self, update: AccountUpdate)->Self {
        self.account_update = Some(update);
        self
    }
}

/// time bounds for provider requests
#[derive(Debug,Clone)]
pub struct FetchContext {
    pub now: EpochMillis,
    pub retention_start_sec: i64,
    pub safety_margin: Duration,
}

impl FetchContext {
    /// fixes before this time are not requested (or dropped). We go back a safety margin from the last
    /// update to re-capture fixes that arrived late at the provider, but never beyond retention
    pub fn start_sec_for (&self, account: &DueAccount)->i64 {
        max( self.retention_start_sec, account.last_updated.saturating_sub( self.safety_margin).secs())
    }

    /// the earliest start of a multi-account request
    pub fn batch_start_sec (&self, accounts: &[DueAccount])->i64 {
        accounts.iter().map( |a| self.start_sec_for(a)).min().unwrap_or( self.retention_start_sec)
    }
}

/// what an adapter needs to run one refresh
#[derive(Clone)]
pub struct RefreshContext {
    pub store: Arc<dyn PilotStore>,
    pub http: Arc<dyn HttpFetch>,
    pub now: EpochMillis,
    pub retention: Duration,
    pub safety_margin: Duration,
    pub min_fix_interval_sec: i64,
}

impl RefreshContext {
    pub fn fetch_context (&self)->FetchContext {
        FetchContext {
            now: self.now,
            retention_start_sec: self.now.saturating_sub( self.retention).secs(),
            safety_margin: self.safety_margin,
        }
    }
}

/// the provider specific part of live track retrieval. Implementations only have to turn a batch of
/// (at most `accounts_per_request`) due accounts into raw points - account selection, deadline handling,
/// track construction and error bookkeeping are provided by [`refresh_accounts`]
#[async_trait]
pub trait TrackerAdapter: Send + Sync {
    fn settings (&self)->&ProviderSettings;

    fn provider (&self)->Provider { self.settings().provider }

    /// fetch one request batch. A returned error fails all accounts of the batch, per-account
    /// problems have to be reported as failed [`AccountFetch`] items
    async fn fetch_batch (&self, http: &dyn HttpFetch, accounts: &[DueAccount], fctx: &FetchContext)->Result<Vec<AccountFetch>>;

    async fn refresh (&self, ctx: &RefreshContext)->ProviderBatchResult {
        refresh_accounts( self, ctx).await
    }
}

/// run one adapter invocation under the shared provider deadline. Accounts that were already processed
/// when the deadline expires keep their updates, the remaining ones are retried next cycle
pub async fn refresh_accounts<A> (adapter: &A, ctx: &RefreshContext)->ProviderBatchResult where A: TrackerAdapter + ?Sized {
    let settings = adapter.settings();
    let provider = settings.provider;
    let t_start = Instant::now();
    let mut result = ProviderBatchResult::new( provider);

    if !settings.enabled {
        return result
    }

    let deadline = t_start + settings.deadline;
    let updated_before = ctx.now.saturating_sub( settings.refresh_interval);
    let accounts = match ctx.store.accounts_due( provider, updated_before, settings.max_accounts).await {
        Ok(accounts) => accounts,
        Err(e) => {
            result.errors.push( format!("failed to query due {provider} accounts: {e}"));
            result.duration = t_start.elapsed();
            return result
        }
    };
    debug!("{} {} accounts due", accounts.len(), provider);

    let fctx = ctx.fetch_context();
    let mut n_processed = 0;

    for batch in accounts.chunks( settings.accounts_per_request.max(1)) {
        if Instant::now() >= deadline {
            result.errors.push( timeout_notice( settings, accounts.len() - n_processed));
            break
        }

        match timeout_at( deadline, adapter.fetch_batch( ctx.http.as_ref(), batch, &fctx)).await {
            Ok(Ok(fetches)) => {
                add_fetches( &mut result, batch, fetches, &fctx, ctx.min_fix_interval_sec);
            }
            Ok(Err(e)) => {
                let msg = format!("{provider} request failed: {e}");
                warn!("{msg}");
                for account in batch {
                    result.updates.insert( account.pilot_id, TrackUpdate::failed( &account.account, &msg));
                }
                result.errors.push( msg);
            }
            Err(_) => {
                result.errors.push( timeout_notice( settings, accounts.len() - n_processed));
                break
            }
        }
        n_processed += batch.len();
    }

    result.duration = t_start.elapsed();
    result
}

fn timeout_notice (settings: &ProviderSettings, n_remaining: usize)->String {
    let msg = format!("{} deadline of {:?} exceeded, {} accounts not processed", settings.provider, settings.deadline, n_remaining);
    warn!("{msg}");
    msg
}

fn add_fetches (result: &mut ProviderBatchResult, batch: &[DueAccount], fetches: Vec<AccountFetch>, fctx: &FetchContext, min_fix_interval_sec: i64) {
    let mut fetches: BTreeMap<PilotId,AccountFetch> = fetches.into_iter().map( |f| (f.pilot_id, f)).collect();

    // every account of the batch gets an update so that its error counter advances
    for account in batch {
        let update = match fetches.remove( &account.pilot_id) {
            Some(AccountFetch{ result: Ok(points), account_update, .. }) => {
                let track = process_points( points, fctx.start_sec_for( account), min_fix_interval_sec);
                TrackUpdate { account: account.account.clone(), track, error: None, account_update }
            }
            Some(AccountFetch{ result: Err(e), account_update, .. }) => {
                warn!("{} account {} of pilot {} failed: {e}", result.provider, account.account, account.pilot_id);
                TrackUpdate { account: account.account.clone(), track: None, error: Some(e), account_update }
            }
            None => TrackUpdate::empty( &account.account)
        };
        result.updates.insert( account.pilot_id, update);
    }
}

/// build, window and simplify the points of one account. Returns `None` if nothing is left
pub fn process_points (points: Vec<LivePoint>, start_sec: i64, min_fix_interval_sec: i64)->Option<LiveTrack> {
    let mut track = build_track( points);
    trim_before( &mut track, start_sec);
    simplify_track( &mut track, min_fix_interval_sec);
    if track.is_empty() { None } else { Some(track) }
}
