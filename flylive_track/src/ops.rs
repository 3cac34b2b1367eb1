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

//! pure track algebra: build tracks from provider points, merge, simplify and trim them.
//! All functions that drop or reorder fixes re-key the sparse extra map in the same operation

use std::{cmp::Ordering, collections::BTreeMap};
use flylive_common::geo::{haversine_distance_m, speed_kmh};

use crate::{Fix, FixExtra, LivePoint, LiveTrack, Provider};

/// max time gap between the last two fixes for which we derive the speed of the last fix
pub const SPEED_MAX_GAP_SEC: i64 = 120;

/// create a time ordered track from unordered provider points. Points reported for the same second
/// are collapsed into the last one (see [`collapse_points`]). If the last fix has no speed we estimate
/// it from the previous fix, provided that is less than [`SPEED_MAX_GAP_SEC`] away
pub fn build_track (mut points: Vec<LivePoint>)->LiveTrack {
    points.sort_by_key( |p| p.time_sec); // stable, so later reports for the same second stay last

    let mut collapsed: Vec<LivePoint> = Vec::with_capacity( points.len());
    for p in points {
        match collapsed.last_mut() {
            Some(prev) if prev.time_sec == p.time_sec => *prev = collapse_points( prev, p),
            _ => collapsed.push( p)
        }
    }

    let mut track = LiveTrack::default();
    track.fixes.reserve( collapsed.len());
    for p in collapsed {
        let fix = Fix::new( p.lat, p.lon, p.alt, p.time_sec, p.flags());
        track.push_fix( fix, p.extra());
    }

    add_last_fix_speed( &mut track);
    track
}

/// the later point provides position and state, values it does not report are taken from the earlier
/// one. An emergency reported by either point is kept
pub fn collapse_points (earlier: &LivePoint, mut later: LivePoint)->LivePoint {
    if earlier.emergency == Some(true) { later.emergency = Some(true) }
    later.valid = later.valid.or( earlier.valid);
    later.low_battery = later.low_battery.or( earlier.low_battery);
    later.message = later.message.or_else( || earlier.message.clone());
    later.speed_kmh = later.speed_kmh.or( earlier.speed_kmh);
    later.gnd_alt_m = later.gnd_alt_m.or( earlier.gnd_alt_m);
    later
}

fn add_last_fix_speed (track: &mut LiveTrack) {
    let n = track.fixes.len();
    if n < 2 { return }

    let has_speed = track.extra.get( &(n-1)).is_some_and( |e| e.speed_kmh.is_some());
    if !has_speed {
        let prev = &track.fixes[n-2];
        let last = &track.fixes[n-1];
        let dt = last.time_sec - prev.time_sec;
        if dt < SPEED_MAX_GAP_SEC {
            let dist = haversine_distance_m( prev.lat, prev.lon, last.lat, last.lon);
            if let Some(speed) = speed_kmh( dist, dt) {
                track.update_extra( n-1, |e| e.speed_kmh = Some(speed));
            }
        }
    }
}

/// stable, time ordered merge of `delta` into `base`. On identical timestamps the delta fix wins (fresher
/// observation); its extra entry wins if it has one, otherwise the base entry for that time is kept
pub fn merge_tracks (base: &LiveTrack, delta: &LiveTrack)->LiveTrack {
    let mut merged = LiveTrack {
        id: base.id.or( delta.id),
        id_str: base.id_str.clone().or_else( || delta.id_str.clone()),
        name: if delta.name.is_empty() { base.name.clone() } else { delta.name.clone() },
        fixes: Vec::with_capacity( base.len() + delta.len()),
        extra: BTreeMap::new(),
    };

    let (mut i, mut j) = (0,0);
    loop {
        let ord = match (base.fixes.get(i), delta.fixes.get(j)) {
            (Some(b), Some(d)) => b.time_sec.cmp( &d.time_sec),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break
        };

        let idx = merged.fixes.len();
        match ord {
            Ordering::Less => {
                merged.fixes.push( base.fixes[i]);
                if let Some(e) = base.extra.get(&i) { merged.extra.insert( idx, e.clone()); }
                i += 1;
            }
            Ordering::Greater => {
                merged.fixes.push( delta.fixes[j]);
                if let Some(e) = delta.extra.get(&j) { merged.extra.insert( idx, e.clone()); }
                j += 1;
            }
            Ordering::Equal => {
                merged.fixes.push( delta.fixes[j]);
                if let Some(e) = delta.extra.get(&j).or_else( || base.extra.get(&i)) { 
                    merged.extra.insert( idx, e.clone()); 
                }
                i += 1;
                j += 1;
            }
        }
    }

    merged
}

/// a fix that must survive simplification
pub fn is_protected (track: &LiveTrack, idx: usize)->bool {
    let n = track.fixes.len();
    idx == 0 || idx + 1 == n 
        || track.fixes[idx].is_emergency() 
        || track.extra.get( &idx).is_some_and( |e| e.has_message())
}

/// drop non-protected fixes that are not more than `min_interval_sec` after the last kept fix
pub fn simplify_track (track: &mut LiveTrack, min_interval_sec: i64) {
    let n = track.fixes.len();
    if n <= 2 { return }

    let mut keep = vec![false; n];
    let mut last_kept_sec: Option<i64> = None;

    for i in 0..n {
        let t = track.fixes[i].time_sec;
        let is_due = last_kept_sec.is_none_or( |t0| t - t0 > min_interval_sec);
        if is_due || is_protected( track, i) {
            keep[i] = true;
            last_kept_sec = Some(t);
        }
    }

    retain_fixes( track, |i,_| keep[i]);
}

/// remove all fixes before `cutoff_sec`. The resulting track might be empty, which callers have to
/// treat as "inactive" rather than as an error
pub fn trim_before (track: &mut LiveTrack, cutoff_sec: i64) {
    let n_remove = track.fixes.partition_point( |f| f.time_sec < cutoff_sec);
    if n_remove == 0 { return }

    track.fixes.drain( ..n_remove);
    let extra = std::mem::take( &mut track.extra);
    track.extra = extra.into_iter()
        .filter( |(i,_)| *i >= n_remove)
        .map( |(i,e)| (i - n_remove, e))
        .collect();
}

/// remove all fixes that were reported by `provider`
pub fn remove_provider (track: &mut LiveTrack, provider: Provider) {
    retain_fixes( track, |_,fix| fix.provider() != Some(provider));
}

/// generic fix filter that keeps the extra map in sync with the retained fixes
pub fn retain_fixes<F> (track: &mut LiveTrack, mut keep: F) where F: FnMut(usize,&Fix)->bool {
    let old_fixes = std::mem::take( &mut track.fixes);
    let mut old_extra = std::mem::take( &mut track.extra);
    track.fixes.reserve( old_fixes.len());

    for (i,fix) in old_fixes.into_iter().enumerate() {
        if keep( i, &fix) {
            if let Some(e) = old_extra.remove( &i) {
                track.extra.insert( track.fixes.len(), e);
            }
            track.fixes.push( fix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix_flags;

    fn fix (t: i64)->Fix { Fix::new( 45.0, 6.0, 1000.0, t, fix_flags( Provider::Spot, true, false, false)) }

    #[test]
    fn test_retain_rekeys_extra() {
        let mut track = LiveTrack::default();
        for t in [10,20,30,40] { track.push_fix( fix(t), None); }
        track.update_extra( 1, |e| e.message = Some("one".into()));
        track.update_extra( 3, |e| e.speed_kmh = Some(12.0));

        retain_fixes( &mut track, |i,_| i != 0 && i != 2);
        assert_eq!( track.fixes.iter().map(|f| f.time_sec).collect::<Vec<_>>(), vec![20,40]);
        assert_eq!( track.message_at(0), Some("one"));
        assert_eq!( track.extra_at(1).and_then(|e| e.speed_kmh), Some(12.0));
        assert!( track.is_consistent());
    }

    #[test]
    fn test_same_second_points_collapse() {
        let mut p1 = LivePoint::new( 45.0, 6.0, 900.0, 100, Provider::Spot);
        p1.message = Some("first".into());
        p1.emergency = Some(true);
        let mut p2 = LivePoint::new( 45.1, 6.1, 950.0, 100, Provider::Spot);
        p2.speed_kmh = Some(30.0);
        let track = build_track( vec![p1,p2]);

        assert_eq!( track.len(), 1);
        assert_eq!( track.fixes[0].alt, 950.0);
        assert!( track.fixes[0].is_emergency());
        assert_eq!( track.message_at(0), Some("first"));
        assert_eq!( track.extra_at(0).and_then( |e| e.speed_kmh), Some(30.0));
        assert!( track.is_consistent());

        // the later message wins
        let mut p3 = LivePoint::new( 45.2, 6.2, 980.0, 100, Provider::Spot);
        p3.message = Some("second".into());
        let mut p4 = LivePoint::new( 45.0, 6.0, 900.0, 100, Provider::Spot);
        p4.message = Some("first".into());
        let track = build_track( vec![p4,p3]);
        assert_eq!( track.message_at(0), Some("second"));
        assert!( !track.fixes[0].is_emergency());
    }
}
