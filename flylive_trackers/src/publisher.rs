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

//! the three sync views that are published after each ingestion cycle. All views are
//! differentially encoded [`TrackGroup`] blobs, the transport to pollers is up to the [`ViewCache`]

use std::sync::Arc;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use flylive_common::datetime::duration_secs;
use flylive_track::{
    LiveTrack, Provider,
    codec::encode_track,
    ops::{remove_provider, trim_before},
    sync::TrackGroup
};

use crate::{
    account::PilotRecord,
    config::LiveConfig,
    errors::Result,
    providers::flyme::is_account_id,
    store::PilotStore
};

pub const FULL_VIEW_KEY: &str = "live.full";
pub const INCREMENTAL_VIEW_KEY: &str = "live.inc";
pub const EXPORT_VIEW_KEY: &str = "live.export";

/// where published views go. Implementations overwrite the previous blob of a key
#[async_trait]
pub trait ViewCache: Send + Sync {
    async fn put (&self, key: &str, blob: Vec<u8>)->Result<()>;
    async fn get (&self, key: &str)->Option<Vec<u8>>;
}

#[derive(Default)]
pub struct MemViewCache {
    views: DashMap<String,Arc<Vec<u8>>>
}

impl MemViewCache {
    pub fn new ()->Self { MemViewCache::default() }
}

#[async_trait]
impl ViewCache for MemViewCache {
    async fn put (&self, key: &str, blob: Vec<u8>)->Result<()> {
        self.views.insert( key.to_string(), Arc::new(blob));
        Ok(())
    }

    async fn get (&self, key: &str)->Option<Vec<u8>> {
        self.views.get( key).map( |e| e.value().as_ref().clone())
    }
}

/// read and decode a published view
pub async fn read_view (cache: &dyn ViewCache, key: &str)->Result<Option<TrackGroup>> {
    match cache.get( key).await {
        Some(blob) => Ok( Some( TrackGroup::from_blob( &blob)?)),
        None => Ok(None)
    }
}

#[derive(Debug,Clone,PartialEq,Default)]
pub struct SyncViews {
    pub full: TrackGroup,
    pub incremental: TrackGroup,
    pub export: TrackGroup,
}

impl SyncViews {
    pub fn stats (&self)->ViewStats {
        ViewStats { full: self.full.tracks.len(), incremental: self.incremental.tracks.len(), export: self.export.tracks.len() }
    }
}

/// number of pilots per view
#[derive(Debug,Clone,Copy,PartialEq,Eq,Default)]
pub struct ViewStats {
    pub full: usize,
    pub incremental: usize,
    pub export: usize,
}

/// derive the views from the active pilot records. Pilots with empty (windowed) tracks are omitted
/// from the respective view
pub fn build_views (records: &[PilotRecord], now_sec: i64, config: &LiveConfig)->SyncViews {
    let retention_start = now_sec - duration_secs( config.retention);
    let incremental_start = now_sec - duration_secs( config.incremental_window);
    let export_start = now_sec - duration_secs( config.export_window);
    let export_provider = config.export_provider;

    let mut views = SyncViews {
        full: TrackGroup { time_sec: now_sec, incremental: false, ..Default::default() },
        incremental: TrackGroup { time_sec: now_sec, incremental: true, ..Default::default() },
        export: TrackGroup { time_sec: now_sec, incremental: true, ..Default::default() },
    };

    let mut records: Vec<&PilotRecord> = records.iter().collect();
    records.sort_by_key( |r| r.id);

    for record in records {
        let mut track = record.track.clone();
        track.id = Some( record.id);
        track.name = record.name.clone();

        trim_before( &mut track, retention_start);
        if track.is_empty() { continue }
        views.full.tracks.push( encode_track( &track));

        trim_before( &mut track, incremental_start);
        if track.is_empty() { continue }
        views.incremental.tracks.push( encode_track( &track));

        trim_before( &mut track, export_start);
        remove_provider( &mut track, export_provider);
        if track.is_empty() { continue }
        views.export.tracks.push( encode_track( &track));

        if let Some(account) = record.account( export_provider) 
            && account.is_active() 
            && is_account_id( &account.account) 
        {
            views.export.remote_ids.insert( record.id, account.account.trim().to_string());
        }
    }
    views
}

/// rebuilds and stores the sync views
pub struct Publisher {
    store: Arc<dyn PilotStore>,
    cache: Arc<dyn ViewCache>,
    config: Arc<LiveConfig>,
}

impl Publisher {
    pub fn new (store: Arc<dyn PilotStore>, cache: Arc<dyn ViewCache>, config: Arc<LiveConfig>)->Self {
        Publisher { store, cache, config }
    }

    pub fn cache (&self)->&Arc<dyn ViewCache> { &self.cache }

    pub async fn publish (&self, now_sec: i64)->Result<ViewStats> {
        let records = self.store.active_pilots( now_sec - duration_secs( self.config.retention)).await?;
        let views = build_views( &records, now_sec, &self.config);

        let full = views.full.to_blob()?;
        let incremental = views.incremental.to_blob()?;
        let export = views.export.to_blob()?;

        tokio::try_join!(
            self.cache.put( FULL_VIEW_KEY, full),
            self.cache.put( INCREMENTAL_VIEW_KEY, incremental),
            self.cache.put( EXPORT_VIEW_KEY, export)
        )?;

        let stats = views.stats();
        debug!("published views {stats:?}");
        Ok(stats)
    }
}
