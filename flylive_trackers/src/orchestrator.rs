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

use std::{collections::{BTreeMap, BTreeSet}, sync::{Arc, Mutex, atomic::{AtomicI64, Ordering}}, time::Duration};
use futures::future::join_all;
use tokio::{task::AbortHandle, time::{MissedTickBehavior, interval}};
use tracing::{debug, error, info, warn};
use flylive_common::{datetime::{EpochMillis, duration_secs}, net::HttpFetch};
use flylive_track::Provider;

use crate::{
    ProviderBatchResult, RefreshContext, TrackerAdapter,
    account::PilotId,
    config::LiveConfig,
    errors::{Result, op_failed},
    publisher::{Publisher, ViewCache, ViewStats},
    store::PilotStore,
    writer::StoreWriter
};

/// the time of the last map request. Ingestion is only worth it while somebody is watching
#[derive(Debug,Default)]
pub struct PollGate {
    last_request_ms: AtomicI64
}

impl PollGate {
    pub fn new ()->Self { PollGate::default() }

    pub fn touch (&self, now: EpochMillis) {
        self.last_request_ms.fetch_max( now.millis(), Ordering::Relaxed);
    }

    pub fn last_request (&self)->EpochMillis { EpochMillis::new( self.last_request_ms.load( Ordering::Relaxed)) }

    pub fn is_open (&self, now: EpochMillis, window: Duration)->bool {
        self.last_request() >= now.saturating_sub( window)
    }
}

/// per-provider summary of one cycle
#[derive(Debug,Clone)]
pub struct ProviderLog {
    pub provider: Provider,
    pub errors: Vec<String>,
    pub account_errors: BTreeMap<PilotId,String>,
    pub devices: usize,
    pub duration: Duration,
}

impl ProviderLog {
    pub fn from_result (result: &ProviderBatchResult)->Self {
        ProviderLog {
            provider: result.provider,
            errors: result.errors.clone(),
            account_errors: result.account_errors(),
            devices: result.device_count(),
            duration: result.duration,
        }
    }
}

#[derive(Debug,Clone,Default)]
pub struct CycleReport {
    pub time: EpochMillis,
    /// no recent map request, nothing was fetched
    pub skipped: bool,
    pub providers: Vec<ProviderLog>,
    pub pilots: usize,
    pub saved: usize,
    pub failed_batches: usize,
    pub views: Option<ViewStats>,
}

/// runs all adapters concurrently, persists their results and publishes the sync views
pub struct TrackerOrchestrator {
    config: Arc<LiveConfig>,
    store: Arc<dyn PilotStore>,
    http: Arc<dyn HttpFetch>,
    adapters: Vec<Arc<dyn TrackerAdapter>>,
    writer: StoreWriter,
    publisher: Publisher,
    gate: Arc<PollGate>,
    last_report: Mutex<Option<CycleReport>>,
}

impl TrackerOrchestrator {
    pub fn new (
        config: Arc<LiveConfig>, 
        store: Arc<dyn PilotStore>, 
        http: Arc<dyn HttpFetch>, 
        adapters: Vec<Arc<dyn TrackerAdapter>>, 
        cache: Arc<dyn ViewCache>,
        gate: Arc<PollGate>
    )->Self {
        let writer = StoreWriter::new( store.clone(), &config);
        let publisher = Publisher::new( store.clone(), cache, config.clone());
        TrackerOrchestrator { config, store, http, adapters, writer, publisher, gate, last_report: Mutex::new(None) }
    }

    pub fn gate (&self)->&Arc<PollGate> { &self.gate }
    pub fn config (&self)->&Arc<LiveConfig> { &self.config }

    pub fn last_report (&self)->Option<CycleReport> {
        self.last_report.lock().ok().and_then( |r| r.clone())
    }

    pub async fn run_cycle (&self, now: EpochMillis)->CycleReport {
        let mut report = CycleReport { time: now, ..Default::default() };

        if !self.gate.is_open( now, self.config.poll_active_window) {
            debug!("no recent map request, skipping cycle");
            report.skipped = true;
            self.set_report( &report);
            return report
        }

        let results = self.refresh_all( now).await;

        let pilot_ids: Vec<PilotId> = results.iter()
            .flat_map( |r| r.updates.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter().collect();
        report.pilots = pilot_ids.len();

        let saves = pilot_ids.chunks( self.config.pilots_per_txn.max(1))
            .map( |ids| self.writer.save( ids, &results, now));
        for res in join_all( saves).await {
            match res {
                Ok(n) => report.saved += n,
                Err(e) => {
                    report.failed_batches += 1;
                    error!("failed to save pilot batch: {e}");
                }
            }
        }

        match self.publisher.publish( now.secs()).await {
            Ok(stats) => report.views = Some(stats),
            Err(e) => error!("failed to publish sync views: {e}")
        }

        for result in &results {
            let log = ProviderLog::from_result( result);
            info!("{}: {} devices, {} errors, {} account errors, {:?}", 
                log.provider, log.devices, log.errors.len(), log.account_errors.len(), log.duration);
            report.providers.push( log);
        }

        self.set_report( &report);
        report
    }

    /// fan out to all adapters. A panicking adapter only fails its own provider
    async fn refresh_all (&self, now: EpochMillis)->Vec<ProviderBatchResult> {
        let ctx = RefreshContext {
            store: self.store.clone(),
            http: self.http.clone(),
            now,
            retention: self.config.retention,
            safety_margin: self.config.safety_margin,
            min_fix_interval_sec: self.config.min_fix_interval_sec(),
        };

        let tasks = self.adapters.iter().map( |adapter| {
            let adapter = adapter.clone();
            let ctx = ctx.clone();
            let provider = adapter.provider();
            (provider, tokio::spawn( async move { adapter.refresh( &ctx).await }))
        }).collect::<Vec<_>>();

        let (providers, handles): (Vec<Provider>, Vec<_>) = tasks.into_iter().unzip();
        join_all( handles).await.into_iter().zip( providers)
            .map( |(res,provider)| match res {
                Ok(result) => result,
                Err(e) => {
                    warn!("{provider} adapter task failed: {e}");
                    ProviderBatchResult::failed( provider, format!("adapter task failed: {e}"))
                }
            })
            .collect()
    }

    fn set_report (&self, report: &CycleReport) {
        if let Ok(mut r) = self.last_report.lock() {
            *r = Some( report.clone());
        }
    }
}

/// time triggered execution of orchestrator cycles
pub struct TrackerService {
    orchestrator: Arc<TrackerOrchestrator>,
    task: Option<AbortHandle>,
}

impl TrackerService {
    pub fn new (orchestrator: Arc<TrackerOrchestrator>)->Self {
        TrackerService { orchestrator, task: None }
    }

    pub fn orchestrator (&self)->&Arc<TrackerOrchestrator> { &self.orchestrator }

    pub fn is_running (&self)->bool { self.task.is_some() }

    pub fn start (&mut self)->Result<()> {
        if self.task.is_some() {
            return Err( op_failed!("tracker service already running"))
        }

        let orchestrator = self.orchestrator.clone();
        let jh = tokio::spawn( async move {
            let mut ticker = interval( orchestrator.config().update_interval.max( Duration::from_secs(1)));
            ticker.set_missed_tick_behavior( MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let report = orchestrator.run_cycle( EpochMillis::now()).await;
                if !report.skipped {
                    debug!("cycle done: {} pilots, {} saved, {} failed batches", report.pilots, report.saved, report.failed_batches);
                }
            }
        });
        self.task = Some( jh.abort_handle());
        Ok(())
    }

    pub fn terminate (&mut self) {
        if let Some(ah) = &self.task {
            ah.abort();
            self.task = None;
        }
    }
}

impl Drop for TrackerService {
    fn drop (&mut self) { self.terminate() }
}
