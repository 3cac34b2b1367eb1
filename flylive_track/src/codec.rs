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

//! lossless delta + fixed point encoding of tracks. The same [`DifferentialTrack`] representation
//! is used for durable storage and for the wire, which is why the scale constants are shared here

use std::{collections::BTreeMap, io::{Read,Write}};
use serde::{Serialize,Deserialize,de::DeserializeOwned};
use flate2::{Compression, read::DeflateDecoder, write::DeflateEncoder};

use crate::{Fix, FixExtra, LiveTrack, errors::{Result, codec_error}};

/// 1e-5 degrees (~1.1m)
pub const LAT_LON_SCALE: f64 = 1e5;
/// 1m
pub const ALT_SCALE: f64 = 1.0;
/// fix times are epoch seconds, encoded with 1ms resolution
pub const TIME_SCALE: f64 = 1000.0;
/// 0.1 km/h
pub const SPEED_SCALE: f64 = 10.0;

/// scale values to integers and replace each element after the first with the difference to the previous
/// scaled value. In unsigned mode negative differences are clamped to zero (used for monotonic fields)
pub fn encode_delta (values: &[f64], scale: f64, signed: bool)->Vec<i64> {
    let mut deltas = Vec::with_capacity( values.len());
    let mut prev: i64 = 0;

    for (i,v) in values.iter().enumerate() {
        let scaled = (v * scale).round() as i64;
        if i == 0 {
            deltas.push( scaled);
        } else {
            let d = scaled - prev;
            deltas.push( if signed || d >= 0 { d } else { 0 });
        }
        prev = scaled;
    }
    deltas
}

/// cumulative sum of `deltas`, divided by `scale`. Sums that leave the i64 range are rejected
pub fn decode_delta (deltas: &[i64], scale: f64)->Result<Vec<f64>> {
    let mut acc: i64 = 0;
    deltas.iter().map( |d|->Result<f64> {
        acc = acc.checked_add( *d).ok_or_else( || codec_error!("delta sum overflow"))?;
        Ok( acc as f64 / scale)
    }).collect()
}

/// the encoded form of [`FixExtra`] values
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq,Default)]
pub struct EncodedExtra {
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub speed: Option<i64>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub gnd_alt: Option<i64>,
}

/// differentially encoded [`LiveTrack`]
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq,Default)]
pub struct DifferentialTrack {
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub id_str: Option<String>,
    #[serde(default)]
    pub name: String,
    pub lat: Vec<i64>,
    pub lon: Vec<i64>,
    pub alt: Vec<i64>,
    pub time_ms: Vec<i64>,
    pub flags: Vec<u32>,
    #[serde(default, skip_serializing_if="BTreeMap::is_empty")]
    pub extra: BTreeMap<usize,EncodedExtra>,
}

impl DifferentialTrack {
    pub fn len (&self)->usize { self.time_ms.len() }
    pub fn is_empty (&self)->bool { self.time_ms.is_empty() }
}

pub fn encode_track (track: &LiveTrack)->DifferentialTrack {
    let fixes = &track.fixes;
    let lat: Vec<f64> = fixes.iter().map( |f| f.lat).collect();
    let lon: Vec<f64> = fixes.iter().map( |f| f.lon).collect();
    let alt: Vec<f64> = fixes.iter().map( |f| f.alt).collect();
    let time: Vec<f64> = fixes.iter().map( |f| f.time_sec as f64).collect();

    let extra = track.extra.iter().map( |(idx,e)| {
        let ee = EncodedExtra {
            message: e.message.clone(),
            speed: e.speed_kmh.map( |v| (v * SPEED_SCALE).round() as i64),
            gnd_alt: e.gnd_alt_m.map( |v| (v * ALT_SCALE).round() as i64),
        };
        (*idx,ee)
    }).collect();

    DifferentialTrack {
        id: track.id,
        id_str: track.id_str.clone(),
        name: track.name.clone(),
        lat: encode_delta( &lat, LAT_LON_SCALE, true),
        lon: encode_delta( &lon, LAT_LON_SCALE, true),
        alt: encode_delta( &alt, ALT_SCALE, true),
        time_ms: encode_delta( &time, TIME_SCALE, false),
        flags: fixes.iter().map( |f| f.flags).collect(),
        extra
    }
}

pub fn decode_track (dt: &DifferentialTrack)->Result<LiveTrack> {
    let n = dt.time_ms.len();
    if dt.lat.len() != n || dt.lon.len() != n || dt.alt.len() != n || dt.flags.len() != n {
        return Err( codec_error!("inconsistent array lengths in track {:?}", dt.id))
    }
    if let Some(idx) = dt.extra.keys().find( |i| **i >= n) {
        return Err( codec_error!("extra index {} out of range for track {:?} with {} fixes", idx, dt.id, n))
    }

    let lat = decode_delta( &dt.lat, LAT_LON_SCALE)?;
    let lon = decode_delta( &dt.lon, LAT_LON_SCALE)?;
    let alt = decode_delta( &dt.alt, ALT_SCALE)?;
    let time = decode_delta( &dt.time_ms, TIME_SCALE)?;

    let fixes: Vec<Fix> = (0..n).map( |i| {
        Fix::new( lat[i], lon[i], alt[i], time[i].round() as i64, dt.flags[i])
    }).collect();

    let extra = dt.extra.iter().map( |(idx,ee)| {
        let e = FixExtra {
            message: ee.message.clone(),
            speed_kmh: ee.speed.map( |v| v as f64 / SPEED_SCALE),
            gnd_alt_m: ee.gnd_alt.map( |v| v as f64 / ALT_SCALE),
        };
        (*idx,e)
    }).collect();

    Ok( LiveTrack { id: dt.id, id_str: dt.id_str.clone(), name: dt.name.clone(), fixes, extra } )
}

/* #region blobs **********************************************************************************/

/// serialize and compress any serde value into an opaque binary blob
pub fn to_blob<T: Serialize> (value: &T)->Result<Vec<u8>> {
    let mut enc = DeflateEncoder::new( Vec::with_capacity(1024), Compression::default());
    serde_json::to_writer( &mut enc, value)?;
    Ok( enc.finish()? )
}

pub fn from_blob<T: DeserializeOwned> (blob: &[u8])->Result<T> {
    let mut dec = DeflateDecoder::new( blob);
    let mut buf = Vec::with_capacity( blob.len() * 4);
    dec.read_to_end( &mut buf)?;
    Ok( serde_json::from_slice( &buf)? )
}

pub fn track_to_blob (track: &LiveTrack)->Result<Vec<u8>> {
    to_blob( &encode_track( track))
}

pub fn track_from_blob (blob: &[u8])->Result<LiveTrack> {
    let dt: DifferentialTrack = from_blob( blob)?;
    decode_track( &dt)
}

/* #endregion blobs */
