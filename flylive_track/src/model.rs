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

use std::{collections::BTreeMap, fmt};
use serde::{Serialize,Deserialize};

/* #region provider *******************************************************************************/

/// the external tracking services we ingest fixes from. The discriminant is what gets packed into
/// the fix flags, hence values have to stay stable and fit into [`DEVICE_MASK`]
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Hash,PartialOrd,Ord)]
#[repr(u8)]
pub enum Provider {
    Inreach = 1,
    Spot = 2,
    Skylines = 3,
    Flymaster = 4,
    Flyme = 5,
}

impl Provider {
    pub const ALL: [Provider;5] = [Provider::Inreach, Provider::Spot, Provider::Skylines, Provider::Flymaster, Provider::Flyme];

    pub fn from_u8 (v: u8)->Option<Provider> {
        Provider::ALL.into_iter().find( |p| *p as u8 == v)
    }

    pub fn from_name (name: &str)->Option<Provider> {
        Provider::ALL.into_iter().find( |p| p.name().eq_ignore_ascii_case( name.trim()))
    }

    pub fn name (&self)->&'static str {
        match self {
            Provider::Inreach => "inreach",
            Provider::Spot => "spot",
            Provider::Skylines => "skylines",
            Provider::Flymaster => "flymaster",
            Provider::Flyme => "flyme",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt (&self, f: &mut fmt::Formatter<'_>)->fmt::Result {
        write!(f, "{}", self.name())
    }
}

/* #endregion provider */

/* #region fix ************************************************************************************/

pub const FLAG_VALID: u32 = 1 << 0;
pub const FLAG_EMERGENCY: u32 = 1 << 1;
pub const FLAG_LOW_BATTERY: u32 = 1 << 2;
pub const DEVICE_SHIFT: u32 = 3;
pub const DEVICE_MASK: u32 = 0x1f;

pub fn fix_flags (provider: Provider, valid: bool, emergency: bool, low_battery: bool)->u32 {
    let mut flags = (provider as u32 & DEVICE_MASK) << DEVICE_SHIFT;
    if valid { flags |= FLAG_VALID }
    if emergency { flags |= FLAG_EMERGENCY }
    if low_battery { flags |= FLAG_LOW_BATTERY }
    flags
}

/// a single position report. Altitude is in meters (MSL), `time_sec` in epoch seconds
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub time_sec: i64,
    pub flags: u32,
}

impl Fix {
    pub fn new (lat: f64, lon: f64, alt: f64, time_sec: i64, flags: u32)->Self {
        Fix { lat, lon, alt, time_sec, flags }
    }

    #[inline] pub fn is_valid (&self)->bool { self.flags & FLAG_VALID != 0 }
    #[inline] pub fn is_emergency (&self)->bool { self.flags & FLAG_EMERGENCY != 0 }
    #[inline] pub fn is_low_battery (&self)->bool { self.flags & FLAG_LOW_BATTERY != 0 }

    pub fn provider (&self)->Option<Provider> {
        Provider::from_u8( ((self.flags >> DEVICE_SHIFT) & DEVICE_MASK) as u8)
    }
}

/// sparse per-fix metadata. Only stored for fixes that carry at least one of these values
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq,Default)]
pub struct FixExtra {
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub speed_kmh: Option<f64>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub gnd_alt_m: Option<f64>,
}

impl FixExtra {
    pub fn is_empty (&self)->bool {
        self.message.is_none() && self.speed_kmh.is_none() && self.gnd_alt_m.is_none()
    }

    pub fn has_message (&self)->bool {
        self.message.as_ref().is_some_and( |m| !m.is_empty())
    }
}

/* #endregion fix */

/* #region live track *****************************************************************************/

/// the time ordered position history of one pilot. `extra` is keyed by index into `fixes` - every
/// operation that removes or reorders fixes has to re-key it (see [`crate::ops`])
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq,Default)]
pub struct LiveTrack {
    pub id: Option<i64>,
    pub id_str: Option<String>,
    pub name: String,
    pub fixes: Vec<Fix>,
    pub extra: BTreeMap<usize,FixExtra>,
}

impl LiveTrack {
    pub fn new (name: impl ToString, id: Option<i64>)->Self {
        LiveTrack { id, id_str: None, name: name.to_string(), fixes: Vec::new(), extra: BTreeMap::new() }
    }

    #[inline] pub fn len (&self)->usize { self.fixes.len() }
    #[inline] pub fn is_empty (&self)->bool { self.fixes.is_empty() }

    pub fn last_fix (&self)->Option<&Fix> { self.fixes.last() }
    pub fn last_time_sec (&self)->Option<i64> { self.fixes.last().map( |f| f.time_sec) }
    pub fn first_time_sec (&self)->Option<i64> { self.fixes.first().map( |f| f.time_sec) }

    pub fn extra_at (&self, idx: usize)->Option<&FixExtra> { self.extra.get( &idx) }

    pub fn message_at (&self, idx: usize)->Option<&str> {
        self.extra.get( &idx).and_then( |e| e.message.as_deref())
    }

    /// add a fix at the end of the track, ignoring fixes that would break the time order
    pub fn push_fix (&mut self, fix: Fix, extra: Option<FixExtra>)->bool {
        if let Some(last) = self.fixes.last() && last.time_sec >= fix.time_sec {
            return false
        }
        self.fixes.push( fix);
        if let Some(extra) = extra && !extra.is_empty() {
            self.extra.insert( self.fixes.len()-1, extra);
        }
        true
    }

    /// set (or merge into) the extra entry of fix `idx`
    pub fn update_extra<F> (&mut self, idx: usize, f: F) where F: FnOnce(&mut FixExtra) {
        if idx < self.fixes.len() {
            let e = self.extra.entry( idx).or_default();
            f(e);
            if e.is_empty() { self.extra.remove( &idx); }
        }
    }

    /// is the track flagged as emergency at its last fix
    pub fn is_emergency (&self)->bool {
        self.fixes.last().is_some_and( |f| f.is_emergency())
    }

    /// check the structural invariants: strictly increasing time and valid extra keys
    pub fn is_consistent (&self)->bool {
        self.fixes.windows(2).all( |w| w[0].time_sec < w[1].time_sec)
            && self.extra.keys().all( |i| *i < self.fixes.len())
    }
}

/* #endregion live track */

/// raw normalized position as produced by provider adapters - input for [`crate::ops::build_track`]
#[derive(Debug,Clone,PartialEq)]
pub struct LivePoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub time_sec: i64,
    pub provider: Provider,
    pub valid: Option<bool>,
    pub emergency: Option<bool>,
    pub message: Option<String>,
    pub speed_kmh: Option<f64>,
    pub low_battery: Option<bool>,
    pub gnd_alt_m: Option<f64>,
}

impl LivePoint {
    pub fn new (lat: f64, lon: f64, alt: f64, time_sec: i64, provider: Provider)->Self {
        LivePoint { 
            lat, lon, alt, time_sec, provider, 
            valid: None, emergency: None, message: None, speed_kmh: None, low_battery: None, gnd_alt_m: None 
        }
    }

    pub fn flags (&self)->u32 {
        fix_flags( self.provider, self.valid.unwrap_or(true), self.emergency.unwrap_or(false), self.low_battery.unwrap_or(false))
    }

    pub fn extra (&self)->Option<FixExtra> {
        let extra = FixExtra {
            message: self.message.clone().filter( |m| !m.is_empty()),
            speed_kmh: self.speed_kmh,
            gnd_alt_m: self.gnd_alt_m,
        };
        if extra.is_empty() { None } else { Some(extra) }
    }
}
