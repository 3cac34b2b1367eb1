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

//! the wire side of differential synchronization: a [`TrackGroup`] is what gets published for pollers,
//! [`LocalTracks`] is the client side state that incrementally reconstructs per-pilot tracks from them

use std::collections::BTreeMap;
use serde::{Serialize,Deserialize};
use flylive_common::some_or_continue;

use crate::{
    LiveTrack, 
    codec::{DifferentialTrack, decode_track, from_blob, to_blob}, 
    errors::Result, 
    ops::{merge_tracks, simplify_track, trim_before}
};

/// a set of differentially encoded tracks. `incremental` groups only contain the most recent fixes of
/// each pilot and have to be merged into prior state, full groups replace it
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq,Default)]
pub struct TrackGroup {
    pub time_sec: i64,
    pub incremental: bool,
    pub tracks: Vec<DifferentialTrack>,

    /// pilot id -> account of the export target service
    #[serde(default, skip_serializing_if="BTreeMap::is_empty")]
    pub remote_ids: BTreeMap<i64,String>,
}

impl TrackGroup {
    pub fn to_blob (&self)->Result<Vec<u8>> { to_blob( self) }
    pub fn from_blob (blob: &[u8])->Result<Self> { from_blob( blob) }
}

/// client side per-pilot state that is updated from received [`TrackGroup`]s
#[derive(Debug,Default)]
pub struct LocalTracks {
    tracks: BTreeMap<i64,LiveTrack>,
    last_sync_sec: Option<i64>,
}

impl LocalTracks {
    pub fn new ()->Self { LocalTracks::default() }

    pub fn get (&self, id: i64)->Option<&LiveTrack> { self.tracks.get( &id) }
    pub fn len (&self)->usize { self.tracks.len() }
    pub fn is_empty (&self)->bool { self.tracks.is_empty() }
    pub fn last_sync_sec (&self)->Option<i64> { self.last_sync_sec }
    pub fn iter (&self)->impl Iterator<Item=(&i64,&LiveTrack)> { self.tracks.iter() }

    /// merge a received group into our state, then drop everything older than `retention_sec` and
    /// re-simplify. Tracks without pilot id are ignored. Returns the number of retained pilots.
    /// A group with an undecodable track is rejected as a whole and leaves our state unchanged
    pub fn apply (&mut self, group: &TrackGroup, retention_sec: i64, min_interval_sec: i64)->Result<usize> {
        let decoded = group.tracks.iter().map( decode_track).collect::<Result<Vec<LiveTrack>>>()?;

        if !group.incremental {
            self.tracks.clear();
        }

        for track in decoded {
            let id = some_or_continue!( track.id);
            let merged = match self.tracks.get( &id) {
                Some(local) => merge_tracks( local, &track),
                None => track
            };
            self.tracks.insert( id, merged);
        }

        let cutoff = group.time_sec - retention_sec;
        for track in self.tracks.values_mut() {
            trim_before( track, cutoff);
            simplify_track( track, min_interval_sec);
        }
        self.tracks.retain( |_,t| !t.is_empty());
        self.last_sync_sec = Some( group.time_sec);

        Ok( self.tracks.len() )
    }
}
