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

// run with "cargo test --test test_ops -- --nocapture"

use flylive_track::{*, ops::*};

fn flags ()->u32 { fix_flags( Provider::Flymaster, true, false, false) }

fn track_of (times: &[i64])->LiveTrack {
    let mut track = LiveTrack::new( "test", Some(1));
    for (i,t) in times.iter().enumerate() {
        track.push_fix( Fix::new( 45.0 + i as f64 * 0.001, 6.0, 1000.0 + i as f64, *t, flags()), None);
    }
    track
}

fn times (track: &LiveTrack)->Vec<i64> { track.fixes.iter().map( |f| f.time_sec).collect() }

#[test]
fn test_build_track_sorts_and_flags() {
    let mut p1 = LivePoint::new( 45.0, 6.0, 1000.0, 300, Provider::Spot);
    p1.low_battery = Some(true);
    let mut p2 = LivePoint::new( 45.1, 6.1, 1100.0, 100, Provider::Spot);
    p2.emergency = Some(true);
    p2.message = Some("SOS".into());
    let mut p3 = LivePoint::new( 45.2, 6.2, 1200.0, 200, Provider::Spot);
    p3.valid = Some(false);

    let track = build_track( vec![p1,p2,p3]);
    assert_eq!( times(&track), vec![100,200,300]);
    assert!( track.fixes[0].is_emergency());
    assert!( !track.fixes[1].is_valid());
    assert!( track.fixes[2].is_low_battery());
    assert!( track.fixes.iter().all( |f| f.provider() == Some(Provider::Spot)));
    assert_eq!( track.message_at(0), Some("SOS"));
    assert!( track.is_consistent());
}

#[test]
fn test_build_track_derives_last_speed() {
    // 0.01 deg latitude (~1112m) in 60s -> ~66.7 km/h
    let p1 = LivePoint::new( 45.00, 6.0, 1000.0, 1000, Provider::Inreach);
    let p2 = LivePoint::new( 45.01, 6.0, 1000.0, 1060, Provider::Inreach);
    let track = build_track( vec![p1.clone(),p2.clone()]);
    let speed = track.extra_at(1).and_then( |e| e.speed_kmh).unwrap();
    println!("derived speed: {speed} km/h");
    assert!( (speed - 66.7).abs() < 0.2);

    // gap too large - no speed
    let mut p3 = p2.clone();
    p3.time_sec = 1000 + SPEED_MAX_GAP_SEC;
    let track = build_track( vec![p1.clone(),p3]);
    assert!( track.extra_at(1).is_none());

    // explicit speed is kept
    let mut p4 = p2.clone();
    p4.speed_kmh = Some(12.0);
    let track = build_track( vec![p1.clone(),p4]);
    assert_eq!( track.extra_at(1).and_then( |e| e.speed_kmh), Some(12.0));

    // single point - nothing to derive
    let track = build_track( vec![p1]);
    assert!( track.extra.is_empty());
}

#[test]
fn test_merge_interleaves() {
    let mut base = track_of( &[100,200,300]);
    base.update_extra( 2, |e| e.message = Some("base 300".into()));
    let mut delta = track_of( &[250,350,450]);
    delta.update_extra( 0, |e| e.message = Some("delta 250".into()));
    delta.update_extra( 2, |e| e.speed_kmh = Some(20.0));

    let merged = merge_tracks( &base, &delta);
    assert_eq!( times(&merged), vec![100,200,250,300,350,450]);
    assert_eq!( merged.message_at(2), Some("delta 250"));
    assert_eq!( merged.message_at(3), Some("base 300"));
    assert_eq!( merged.extra_at(5).and_then( |e| e.speed_kmh), Some(20.0));
    assert_eq!( merged.extra.len(), 3);
    assert!( merged.is_consistent());
}

#[test]
fn test_merge_empty_delta_is_identity() {
    let mut base = track_of( &[100,200,300]);
    base.update_extra( 1, |e| e.message = Some("hi".into()));
    let merged = merge_tracks( &base, &LiveTrack::default());
    assert_eq!( merged, base);
}

#[test]
fn test_merge_disjoint_is_order_independent() {
    let a = track_of( &[100,110,120]);
    let b = track_of( &[500,510]);
    let ab = merge_tracks( &a, &b);
    let ba = merge_tracks( &b, &a);
    assert_eq!( times(&ab), vec![100,110,120,500,510]);
    assert_eq!( ab.fixes, ba.fixes);
}

#[test]
fn test_merge_collision_delta_wins() {
    let mut base = track_of( &[100,200]);
    base.update_extra( 1, |e| e.message = Some("old".into()));
    let mut delta = LiveTrack::default();
    delta.push_fix( Fix::new( 46.0, 7.0, 2000.0, 200, flags()), None);

    let merged = merge_tracks( &base, &delta);
    assert_eq!( times(&merged), vec![100,200]);
    assert_eq!( merged.fixes[1].lat, 46.0);
    assert_eq!( merged.message_at(1), Some("old")); // no delta extra -> base extra survives

    delta.update_extra( 0, |e| e.message = Some("new".into()));
    let merged = merge_tracks( &base, &delta);
    assert_eq!( merged.message_at(1), Some("new"));
}

#[test]
fn test_simplify_scenario() {
    let mut track = LiveTrack::new( "test", None);
    track.push_fix( Fix::new( 45.0, 6.0, 1000.0, 10, flags() | FLAG_EMERGENCY), None);
    track.push_fix( Fix::new( 45.0, 6.0, 1000.0, 40, flags()), None);
    track.push_fix( Fix::new( 45.0, 6.0, 1000.0, 41, flags()), None);

    simplify_track( &mut track, 30);
    assert_eq!( times(&track), vec![10,41]);
    assert!( track.fixes[0].is_emergency());
}

#[test]
fn test_simplify_protects_important_fixes() {
    let ts: Vec<i64> = (0..50).map( |i| 1000 + i * 5).collect();
    let mut track = track_of( &ts);
    track.update_extra( 7, |e| e.message = Some("landed".into()));
    track.fixes[23].flags |= FLAG_EMERGENCY;
    track.update_extra( 30, |e| e.speed_kmh = Some(40.0)); // not protected

    for min_interval in [0, 10, 60, 3600] {
        let mut t = track.clone();
        simplify_track( &mut t, min_interval);
        let kept = times(&t);
        println!("interval {min_interval}: {} fixes", kept.len());
        assert_eq!( kept.first(), Some(&1000));
        assert_eq!( kept.last(), Some(&(1000 + 49 * 5)));
        assert!( kept.contains( &(1000 + 7 * 5)));
        assert!( kept.contains( &(1000 + 23 * 5)));
        assert!( t.is_consistent());

        let idx = kept.iter().position( |x| *x == 1000 + 7 * 5).unwrap();
        assert_eq!( t.message_at(idx), Some("landed"));
    }

    let mut t = track.clone();
    simplify_track( &mut t, 3600);
    assert_eq!( t.len(), 4);
}

#[test]
fn test_trim_rekeys_extra() {
    let mut track = track_of( &[100,200,300,400]);
    track.update_extra( 2, |e| e.message = Some("at 300".into()));
    track.update_extra( 0, |e| e.message = Some("at 100".into()));

    trim_before( &mut track, 250);
    assert_eq!( times(&track), vec![300,400]);
    assert_eq!( track.message_at(0), Some("at 300"));
    assert_eq!( track.extra.len(), 1);
    assert!( track.is_consistent());
}

#[test]
fn test_trim_monotonic() {
    let track = track_of( &[100,200,300,400]);
    for cutoff in [0, 100, 150, 400, 401, 10_000] {
        let mut t = track.clone();
        trim_before( &mut t, cutoff);
        assert!( t.len() <= track.len());
        assert!( t.fixes.iter().all( |f| f.time_sec >= cutoff));
    }

    let mut t = track.clone();
    trim_before( &mut t, 10_000);
    assert!( t.is_empty());
    assert!( t.extra.is_empty());
}

#[test]
fn test_remove_provider() {
    let mut track = LiveTrack::default();
    track.push_fix( Fix::new( 45.0, 6.0, 1000.0, 100, fix_flags( Provider::Flyme, true, false, false)), None);
    track.push_fix( Fix::new( 45.0, 6.0, 1000.0, 200, fix_flags( Provider::Spot, true, false, false)), 
        Some( FixExtra{ message: Some("ok".into()), ..Default::default() }));
    track.push_fix( Fix::new( 45.0, 6.0, 1000.0, 300, fix_flags( Provider::Flyme, true, false, false)), None);

    remove_provider( &mut track, Provider::Flyme);
    assert_eq!( times(&track), vec![200]);
    assert_eq!( track.message_at(0), Some("ok"));
}
