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

//! Flymaster live tracking. One request covers many trackers, the response is an object keyed by
//! tracker id. Coordinates are transmitted in 1/60000 degrees

use std::collections::BTreeMap;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use flylive_common::net::{HttpFetch, encode_query_value};
use flylive_track::{LivePoint, Provider};

use crate::{
    AccountFetch, DueAccount, FetchContext, PilotId, TrackerAdapter,
    config::ProviderSettings,
    errors::{Result, parse_error},
};

const COORD_SCALE: f64 = 60000.0;

pub struct FlymasterAdapter {
    settings: ProviderSettings
}

impl FlymasterAdapter {
    pub fn new (settings: ProviderSettings)->Self { FlymasterAdapter { settings } }

    /// the `trackers` parameter maps each tracker id to the time of the first fix we want
    pub fn live_url (&self, trackers: &BTreeMap<String,i64>)->Result<String> {
        let param = serde_json::to_string( trackers)?;
        Ok( format!("{}?trackers={}", self.settings.base_url, encode_query_value( &param)) )
    }
}

#[async_trait]
impl TrackerAdapter for FlymasterAdapter {
    fn settings (&self)->&ProviderSettings { &self.settings }

    async fn fetch_batch (&self, http: &dyn HttpFetch, accounts: &[DueAccount], fctx: &FetchContext)->Result<Vec<AccountFetch>> {
        let mut fetches = Vec::with_capacity( accounts.len());
        let mut trackers: BTreeMap<String,i64> = BTreeMap::new();
        // several pilots can share a tracker
        let mut pilots: BTreeMap<String,Vec<PilotId>> = BTreeMap::new();

        for account in accounts {
            let id = account.account.trim();
            if id.is_empty() || !id.bytes().all( |b| b.is_ascii_digit()) {
                fetches.push( AccountFetch::failed( account.pilot_id, format!("invalid flymaster id '{}'", account.account)));
                continue
            }
            let start_sec = fctx.start_sec_for( account);
            trackers.entry( id.to_string())
                .and_modify( |t| *t = (*t).min( start_sec))
                .or_insert( start_sec);
            pilots.entry( id.to_string()).or_default().push( account.pilot_id);
        }
        if trackers.is_empty() {
            return Ok(fetches)
        }

        let json = http.get_text( &self.live_url( &trackers)?, &[]).await?;
        let mut results = parse_live_data( &json)?;

        for (id, pilot_ids) in pilots {
            let result = results.remove( &id).unwrap_or_else( || Ok(Vec::new()));
            for pilot_id in pilot_ids {
                fetches.push( match &result {
                    Ok(points) => AccountFetch::ok( pilot_id, points.clone()),
                    Err(e) => AccountFetch::failed( pilot_id, e)
                });
            }
        }
        Ok(fetches)
    }
}

#[derive(Deserialize,Debug)]
struct FlymasterFix {
    /// latitude * 60000
    ai: f64,
    /// longitude * 60000
    oi: f64,
    /// GPS altitude
    #[serde(default)]
    h: f64,
    /// ground elevation
    #[serde(default)]
    s: Option<f64>,
    /// speed in km/h
    #[serde(default)]
    v: Option<f64>,
    /// epoch seconds
    d: i64,
}

/// parse the tracker-id keyed response. A malformed entry only fails its own tracker
pub fn parse_live_data (json: &str)->Result<BTreeMap<String,std::result::Result<Vec<LivePoint>,String>>> {
    let value: Value = serde_json::from_str( json)?;
    let obj = match value {
        Value::Object(obj) => obj,
        Value::Array(a) if a.is_empty() => return Ok(BTreeMap::new()), // no live trackers
        _ => return Err( parse_error!("unexpected flymaster response"))
    };

    let mut results = BTreeMap::new();
    for (id, fixes) in obj {
        let points = serde_json::from_value::<Vec<FlymasterFix>>( fixes)
            .map( |fixes| fixes.into_iter().map( to_live_point).collect())
            .map_err( |e| format!("invalid data for tracker {id}: {e}"));
        results.insert( id, points);
    }
    Ok(results)
}

fn to_live_point (fix: FlymasterFix)->LivePoint {
    let mut p = LivePoint::new( fix.ai / COORD_SCALE, fix.oi / COORD_SCALE, fix.h, fix.d, Provider::Flymaster);
    p.speed_kmh = fix.v;
    p.gnd_alt_m = fix.s;
    p
}
