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

// run with "cargo test --test test_sync -- --nocapture"

use flylive_track::{*, codec::encode_track, sync::*};

fn track (id: i64, times: &[i64])->LiveTrack {
    let mut track = LiveTrack::new( format!("pilot-{id}"), Some(id));
    let flags = fix_flags( Provider::Skylines, true, false, false);
    for t in times {
        track.push_fix( Fix::new( 45.0, 6.0, 1000.0, *t, flags), None);
    }
    track
}

#[test]
fn test_full_then_incremental() {
    let full = TrackGroup {
        time_sec: 1000,
        incremental: false,
        tracks: vec![ encode_track( &track( 1, &[100,500,900])), encode_track( &track( 2, &[950])) ],
        ..Default::default()
    };
    let blob = full.to_blob().unwrap();
    let full = TrackGroup::from_blob( &blob).unwrap();

    let mut local = LocalTracks::new();
    assert_eq!( local.apply( &full, 3600, 0).unwrap(), 2);
    assert_eq!( local.get(1).unwrap().len(), 3);

    let inc = TrackGroup {
        time_sec: 4000,
        incremental: true,
        tracks: vec![ encode_track( &track( 1, &[900,1200,3900])) ],
        ..Default::default()
    };
    local.apply( &inc, 3600, 0).unwrap();

    // retention cutoff 400: pilot 1 keeps 500,900,1200,3900 - pilot 2 only has 950 which is retained too
    let t1 = local.get(1).unwrap();
    assert_eq!( t1.fixes.iter().map(|f| f.time_sec).collect::<Vec<_>>(), vec![500,900,1200,3900]);
    assert!( t1.is_consistent());
    assert_eq!( local.last_sync_sec(), Some(4000));

    // a full group replaces everything
    let full = TrackGroup { time_sec: 5000, incremental: false, tracks: vec![ encode_track( &track( 3, &[4900])) ], ..Default::default() };
    local.apply( &full, 3600, 0).unwrap();
    assert!( local.get(1).is_none());
    assert_eq!( local.len(), 1);
}

#[test]
fn test_expired_pilots_are_dropped() {
    let mut local = LocalTracks::new();
    let g = TrackGroup { time_sec: 1000, incremental: false, tracks: vec![ encode_track( &track( 1, &[900])) ], ..Default::default() };
    local.apply( &g, 600, 0).unwrap();
    assert_eq!( local.len(), 1);

    let g = TrackGroup { time_sec: 2000, incremental: true, tracks: vec![], ..Default::default() };
    local.apply( &g, 600, 0).unwrap();
    assert!( local.is_empty());
}

#[test]
fn test_bad_group_keeps_local_state() {
    let mut local = LocalTracks::new();
    let g = TrackGroup { time_sec: 1000, incremental: false, tracks: vec![ encode_track( &track( 1, &[900])) ], ..Default::default() };
    local.apply( &g, 600, 0).unwrap();

    let mut broken = encode_track( &track( 3, &[950, 980]));
    broken.lat.pop();
    for incremental in [false, true] {
        let g = TrackGroup {
            time_sec: 1100,
            incremental,
            tracks: vec![ encode_track( &track( 2, &[1050])), broken.clone() ],
            ..Default::default()
        };
        assert!( local.apply( &g, 600, 0).is_err());
        assert_eq!( local.len(), 1);
        assert!( local.get(1).is_some() && local.get(2).is_none());
        assert_eq!( local.last_sync_sec(), Some(1000));
    }
}
