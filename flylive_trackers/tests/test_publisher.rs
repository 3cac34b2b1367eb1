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

// run with "cargo test --test test_publisher -- --nocapture"

mod common;
use common::*;

use std::sync::Arc;
use flylive_track::{LivePoint, LiveTrack, Provider, codec::decode_track, ops::{build_track, merge_tracks}, sync::LocalTracks};
use flylive_trackers::{
    LiveConfig, PilotRecord,
    mem_store::MemPilotStore,
    publisher::{EXPORT_VIEW_KEY, FULL_VIEW_KEY, INCREMENTAL_VIEW_KEY, MemViewCache, Publisher, ViewCache, build_views, read_view},
    store::{PilotStore, create_pilot, edit_pilot},
};

fn track_at (provider: Provider, times: &[i64])->LiveTrack {
    build_track( times.iter().map( |t| LivePoint::new( 45.5, 6.5, 1500.0, *t, provider)).collect())
}

fn records ()->Vec<PilotRecord> {
    let mut p1 = PilotRecord::new( 1, "Ann");
    p1.set_account( Provider::Spot, "feedA", true);
    p1.set_account( Provider::Flyme, "11", true);
    p1.track = track_at( Provider::Spot, &[NOW_SEC - 3 * 3600, NOW_SEC - 1800, NOW_SEC - 120]);

    let mut p2 = PilotRecord::new( 2, "Bob");
    p2.set_account( Provider::Flyme, "22", true);
    p2.track = merge_tracks( &track_at( Provider::Spot, &[NOW_SEC - 1200]), &track_at( Provider::Flyme, &[NOW_SEC - 120]));

    let mut p3 = PilotRecord::new( 3, "Cid");
    p3.track = track_at( Provider::Skylines, &[NOW_SEC - 23 * 3600]);

    let mut p4 = PilotRecord::new( 4, "Dan");
    p4.track = track_at( Provider::Skylines, &[NOW_SEC - 25 * 3600]);

    let mut records = vec![p4, p3, p2, p1];
    for r in records.iter_mut() { r.sync_last_fix() }
    records
}

fn ids (tracks: &[flylive_track::codec::DifferentialTrack])->Vec<i64> {
    tracks.iter().filter_map( |t| t.id).collect()
}

#[test]
fn test_build_views() {
    let views = build_views( &records(), NOW_SEC, &LiveConfig::default());
    println!("{:?}", views.stats());

    assert!( !views.full.incremental);
    assert!( views.incremental.incremental && views.export.incremental);
    assert_eq!( views.full.time_sec, NOW_SEC);

    assert_eq!( ids( &views.full.tracks), vec![1,2,3]);
    assert_eq!( ids( &views.incremental.tracks), vec![1,2]);
    assert_eq!( ids( &views.export.tracks), vec![1]);

    let inc1 = decode_track( &views.incremental.tracks[0]).unwrap();
    assert_eq!( inc1.fixes.iter().map( |f| f.time_sec).collect::<Vec<_>>(), vec![NOW_SEC - 1800, NOW_SEC - 120]);
    assert_eq!( inc1.name, "Ann");

    // bob's only export window fix is from the export provider
    let exp1 = decode_track( &views.export.tracks[0]).unwrap();
    assert_eq!( exp1.len(), 1);
    assert!( exp1.fixes.iter().all( |f| f.provider() != Some(Provider::Flyme)));
    assert_eq!( views.export.remote_ids.get(&1).map( |s| s.as_str()), Some("11"));
    assert!( !views.export.remote_ids.contains_key(&2));
}

#[tokio::test]
async fn test_publish_and_sync() {
    let store = Arc::new( MemPilotStore::new());
    for r in records() {
        create_pilot( store.as_ref(), r.id, &r.name, &[]).await.unwrap();
        edit_pilot( store.as_ref(), r.id, |p| *p = r.clone()).await.unwrap();
    }

    let cache = Arc::new( MemViewCache::new());
    let publisher = Publisher::new( store.clone(), cache.clone(), Arc::new( LiveConfig::default()));
    let stats = publisher.publish( NOW_SEC).await.unwrap();
    assert_eq!( (stats.full, stats.incremental, stats.export), (3,2,1));

    let full = read_view( cache.as_ref(), FULL_VIEW_KEY).await.unwrap().unwrap();
    let inc = read_view( cache.as_ref(), INCREMENTAL_VIEW_KEY).await.unwrap().unwrap();
    assert!( read_view( cache.as_ref(), EXPORT_VIEW_KEY).await.unwrap().is_some());
    assert!( read_view( cache.as_ref(), "unknown").await.unwrap().is_none());

    // a new client starts from the full view, then applies increments
    let mut local = LocalTracks::new();
    assert_eq!( local.apply( &full, 24 * 3600, 60).unwrap(), 3);
    assert_eq!( local.get(1).unwrap().len(), 3);

    assert_eq!( local.apply( &inc, 24 * 3600, 60).unwrap(), 3);
    assert_eq!( local.get(1).unwrap().len(), 3);
    assert_eq!( local.get(2).unwrap().len(), 2);
    assert_eq!( local.last_sync_sec(), Some( NOW_SEC));
}
