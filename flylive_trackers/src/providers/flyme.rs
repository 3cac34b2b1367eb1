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

//! FlyMe (XCGlobe) live tracking. Pilots often enter their user name instead of the numeric
//! account id, which is resolved on first fetch. Positions of all accounts are retrieved with a
//! single request that returns an array of live data objects

use std::collections::BTreeMap;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use flylive_common::net::{HttpFetch, encode_query_value};
use flylive_track::{LivePoint, Provider};

use crate::{
    AccountFetch, AccountUpdate, DueAccount, FetchContext, PilotId, TrackerAdapter,
    config::ProviderSettings,
    errors::{Result, parse_error},
};

pub struct FlymeAdapter {
    settings: ProviderSettings
}

impl FlymeAdapter {
    pub fn new (settings: ProviderSettings)->Self { FlymeAdapter { settings } }

    pub fn resolve_url (&self, username: &str)->String {
        let mut url = format!("{}/user-id.php?username={}", self.settings.base_url, encode_query_value( username.trim()));
        self.add_key( &mut url);
        url
    }

    pub fn positions_url (&self, ids: &[&str], since_sec: i64)->String {
        let mut url = format!("{}/positions.php?ids={}&since={}", self.settings.base_url, ids.join(","), since_sec);
        self.add_key( &mut url);
        url
    }

    fn add_key (&self, url: &mut String) {
        if let Some(key) = &self.settings.api_key {
            url.push_str( "&key=");
            url.push_str( &encode_query_value( key));
        }
    }
}

/// canonical FlyMe ids are numeric
pub fn is_account_id (account: &str)->bool {
    let account = account.trim();
    !account.is_empty() && account.bytes().all( |b| b.is_ascii_digit())
}

/// the user-id endpoint returns the numeric id, or an empty/non-positive value for unknown users
pub fn parse_resolved_id (body: &str)->Option<String> {
    let body = body.trim();
    match body.parse::<i64>() {
        Ok(id) if id > 0 => Some( id.to_string()),
        _ => None
    }
}

#[async_trait]
impl TrackerAdapter for FlymeAdapter {
    fn settings (&self)->&ProviderSettings { &self.settings }

    async fn fetch_batch (&self, http: &dyn HttpFetch, accounts: &[DueAccount], fctx: &FetchContext)->Result<Vec<AccountFetch>> {
        let mut fetches = Vec::with_capacity( accounts.len());
        // a resolved name can map to an id another pilot already uses
        let mut ids: BTreeMap<String,Vec<(PilotId,Option<AccountUpdate>)>> = BTreeMap::new();

        for account in accounts {
            if is_account_id( &account.account) {
                ids.entry( account.account.trim().to_string()).or_default().push( (account.pilot_id, None));
                continue
            }

            match http.get_text( &self.resolve_url( &account.account), &[]).await {
                Ok(body) => match parse_resolved_id( &body) {
                    Some(id) => {
                        info!("resolved flyme account '{}' of pilot {} to {}", account.account, account.pilot_id, id);
                        ids.entry( id.clone()).or_default().push( (account.pilot_id, Some( AccountUpdate::Resolved(id))));
                    }
                    None => {
                        info!("unknown flyme account '{}' of pilot {}", account.account, account.pilot_id);
                        fetches.push( AccountFetch::ok( account.pilot_id, Vec::new()).with_account_update( AccountUpdate::Disable));
                    }
                }
                Err(e) => fetches.push( AccountFetch::failed( account.pilot_id, e))
            }
        }
        if ids.is_empty() {
            return Ok(fetches)
        }

        let id_list: Vec<&str> = ids.keys().map( |k| k.as_str()).collect();
        let json = http.get_text( &self.positions_url( &id_list, fctx.batch_start_sec( accounts)), &[]).await?;
        let mut results = parse_positions( &json)?;

        for (id, pilots) in ids {
            let result = results.remove( &id).unwrap_or_else( || Ok(Vec::new()));
            for (pilot_id, account_update) in pilots {
                let mut fetch = match &result {
                    Ok(points) => AccountFetch::ok( pilot_id, points.clone()),
                    Err(e) => AccountFetch::failed( pilot_id, e)
                };
                fetch.account_update = account_update;
                fetches.push( fetch);
            }
        }
        Ok(fetches)
    }
}

#[derive(Deserialize,Debug)]
struct LiveData {
    lat: f64,
    lon: f64,
    #[serde(default)]
    alt: f64,
    time: i64,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    sos: Option<bool>,
}

/// group live data objects by account id. An object with an id that fails to parse marks its account
/// as failed, objects without id are skipped
pub fn parse_positions (json: &str)->Result<BTreeMap<String,std::result::Result<Vec<LivePoint>,String>>> {
    let value: Value = serde_json::from_str( json)?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Err( parse_error!("expected flyme live data array"))
    };

    let mut results: BTreeMap<String,std::result::Result<Vec<LivePoint>,String>> = BTreeMap::new();
    for item in items {
        let id = match item.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => {
                debug!("skipping flyme item without id");
                continue
            }
        };

        let entry = results.entry( id.clone()).or_insert_with( || Ok(Vec::new()));
        match serde_json::from_value::<LiveData>( item) {
            Ok(data) => {
                if let Ok(points) = entry {
                    points.push( to_live_point( data));
                }
            }
            Err(e) => *entry = Err( format!("invalid live data for {id}: {e}"))
        }
    }
    Ok(results)
}

fn to_live_point (data: LiveData)->LivePoint {
    let mut p = LivePoint::new( data.lat, data.lon, data.alt, data.time, Provider::Flyme);
    p.speed_kmh = data.speed;
    p.message = data.msg.filter( |m| !m.trim().is_empty());
    p.emergency = data.sos;
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positions() {
        let json = r#"[
            {"id":7,"lat":45.5,"lon":6.5,"alt":1500,"time":1714557600,"speed":30.5},
            {"id":7,"lat":45.6,"lon":6.6,"alt":1550,"time":1714557660,"msg":"hello"},
            {"id":"8","lat":"bad","time":1714557600},
            {"lat":1,"lon":2,"time":3}
        ]"#;

        let results = parse_positions( json).unwrap();
        assert_eq!( results.len(), 2);
        let p = results.get("7").unwrap().as_ref().unwrap();
        assert_eq!( p.len(), 2);
        assert_eq!( p[0].speed_kmh, Some(30.5));
        assert_eq!( p[1].message.as_deref(), Some("hello"));
        assert!( results.get("8").unwrap().is_err());

        assert!( parse_positions("{}").is_err());
    }

    #[test]
    fn test_resolve() {
        assert!( is_account_id(" 123 "));
        assert!( !is_account_id("john"));
        assert_eq!( parse_resolved_id("4567\n"), Some("4567".to_string()));
        assert_eq!( parse_resolved_id("0"), None);
        assert_eq!( parse_resolved_id(""), None);
    }
}
