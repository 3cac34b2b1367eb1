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

//! SkyLines live tracking. Positions and barogram arrays of a flight are delivered in the (Google)
//! polyline encoding, several pilots can be requested at once

use std::collections::BTreeMap;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use flylive_common::{datetime::utc_day_start_secs, net::HttpFetch};
use flylive_track::{LivePoint, Provider};

use crate::{
    AccountFetch, DueAccount, FetchContext, PilotId, TrackerAdapter,
    config::ProviderSettings,
    errors::{Result, parse_error},
};

const POLYLINE_SCALE: f64 = 1e5;
const SECS_PER_DAY: i64 = 86400;

pub struct SkylinesAdapter {
    settings: ProviderSettings
}

impl SkylinesAdapter {
    pub fn new (settings: ProviderSettings)->Self { SkylinesAdapter { settings } }

    pub fn live_url (&self, ids: &[&str])->String {
        format!("{}/{}", self.settings.base_url, ids.join(","))
    }
}

#[async_trait]
impl TrackerAdapter for SkylinesAdapter {
    fn settings (&self)->&ProviderSettings { &self.settings }

    async fn fetch_batch (&self, http: &dyn HttpFetch, accounts: &[DueAccount], fctx: &FetchContext)->Result<Vec<AccountFetch>> {
        let mut fetches = Vec::with_capacity( accounts.len());
        let mut ids: BTreeMap<String,Vec<PilotId>> = BTreeMap::new();

        for account in accounts {
            let sfid = account.account.trim();
            if !sfid.is_empty() && sfid.bytes().all( |b| b.is_ascii_digit()) {
                ids.entry( sfid.to_string()).or_default().push( account.pilot_id);
            } else {
                fetches.push( AccountFetch::failed( account.pilot_id, format!("invalid skylines id '{}'", account.account)));
            }
        }
        if ids.is_empty() {
            return Ok(fetches)
        }

        let id_list: Vec<&str> = ids.keys().map( |k| k.as_str()).collect();
        let json = http.get_text( &self.live_url( &id_list), &[]).await?;
        let flights = parse_flights( &json, fctx.now.secs())?;

        for (sfid, pilot_ids) in &ids {
            for pilot_id in pilot_ids {
                match flights.get( sfid) {
                    Some(Ok(points)) => fetches.push( AccountFetch::ok( *pilot_id, points.clone())),
                    Some(Err(e)) => fetches.push( AccountFetch::failed( *pilot_id, e)),
                    None => fetches.push( AccountFetch::ok( *pilot_id, Vec::new())) // not flying
                }
            }
        }
        Ok(fetches)
    }
}

/* #region polyline decoding **********************************************************************/

/// decode a sequence of zigzag signed values in the polyline variable length encoding
pub fn decode_signed_values (s: &str)->Result<Vec<i64>> {
    let mut values = Vec::new();
    let mut acc: i64 = 0;
    let mut shift = 0;

    for b in s.bytes() {
        if !(63..=126).contains( &b) {
            return Err( parse_error!("invalid polyline character {:?}", b as char))
        }
        let chunk = (b - 63) as i64;
        acc |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk & 0x20 == 0 {
            values.push( if acc & 1 != 0 { !(acc >> 1) } else { acc >> 1 });
            acc = 0;
            shift = 0;
        } else if shift > 60 {
            return Err( parse_error!("polyline value overflow"))
        }
    }

    if shift != 0 {
        return Err( parse_error!("truncated polyline"))
    }
    Ok(values)
}

/// delta encoded list of integers
pub fn decode_delta_list (s: &str)->Result<Vec<i64>> {
    let mut acc: i64 = 0;
    decode_signed_values( s)?.into_iter().map( |d|->Result<i64> {
        acc = acc.checked_add( d).ok_or_else( || parse_error!("delta list overflow"))?;
        Ok(acc)
    }).collect()
}

/// (lat,lon) pairs in degrees
pub fn decode_polyline (s: &str)->Result<Vec<(f64,f64)>> {
    let values = decode_signed_values( s)?;
    if values.len() % 2 != 0 {
        return Err( parse_error!("odd number of polyline values"))
    }

    let (mut lat, mut lon) = (0i64, 0i64);
    values.chunks(2).map( |c|->Result<(f64,f64)> {
        lat = lat.checked_add( c[0]).ok_or_else( || parse_error!("polyline latitude overflow"))?;
        lon = lon.checked_add( c[1]).ok_or_else( || parse_error!("polyline longitude overflow"))?;
        Ok( (lat as f64 / POLYLINE_SCALE, lon as f64 / POLYLINE_SCALE))
    }).collect()
}

/* #endregion polyline decoding */

#[derive(Deserialize,Debug)]
struct LiveResponse {
    #[serde(default)]
    flights: Vec<Value>
}

#[derive(Deserialize,Debug)]
struct Flight {
    sfid: i64,
    points: String,
    barogram_t: String,
    barogram_h: String,
    #[serde(default)]
    elevations: Option<String>,
}

/// parse a live response into per-sfid points. Flights that fail to decode are reported as errors of
/// their sfid only. Times are seconds since UTC midnight, times after `now_sec` belong to the previous day
pub fn parse_flights (json: &str, now_sec: i64)->Result<BTreeMap<String,std::result::Result<Vec<LivePoint>,String>>> {
    let response: LiveResponse = serde_json::from_str( json)?;
    let mut flights = BTreeMap::new();

    for value in response.flights {
        let sfid = value.get("sfid").and_then( |v| v.as_i64());
        let flight: std::result::Result<Flight,_> = serde_json::from_value( value);
        match (sfid, flight) {
            (_, Ok(flight)) => {
                let points = decode_flight( &flight, now_sec).map_err( |e| e.to_string());
                flights.insert( flight.sfid.to_string(), points);
            }
            (Some(sfid), Err(e)) => {
                flights.insert( sfid.to_string(), Err( e.to_string()));
            }
            (None, Err(_)) => {} // nothing we can attribute this to
        }
    }
    Ok(flights)
}

fn decode_flight (flight: &Flight, now_sec: i64)->Result<Vec<LivePoint>> {
    let positions = decode_polyline( &flight.points)?;
    let times = decode_delta_list( &flight.barogram_t)?;
    let alts = decode_delta_list( &flight.barogram_h)?;
    let gnd_alts = match &flight.elevations {
        Some(s) => Some( decode_delta_list( s)?),
        None => None
    };

    let n = positions.len();
    if times.len() != n || alts.len() != n || gnd_alts.as_ref().is_some_and( |g| g.len() != n) {
        return Err( parse_error!("inconsistent array lengths for flight {}", flight.sfid))
    }

    let day_start = utc_day_start_secs( now_sec);
    let mut points = Vec::with_capacity( n);
    for i in 0..n {
        let (lat, lon) = positions[i];
        let mut time_sec = day_start + times[i];
        if time_sec > now_sec {
            time_sec -= SECS_PER_DAY;
        }

        let mut p = LivePoint::new( lat, lon, alts[i] as f64, time_sec, Provider::Skylines);
        p.gnd_alt_m = gnd_alts.as_ref().map( |g| g[i] as f64);
        points.push( p);
    }
    Ok(points)
}
