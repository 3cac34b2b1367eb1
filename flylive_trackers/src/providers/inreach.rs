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

//! Garmin inReach satellite messengers. The MapShare feed is a KML document with one placemark per
//! position report, position values are in the placemark's ExtendedData

use std::collections::HashMap;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use flylive_common::{datetime::{iso8601_secs, parse_iso8601_secs}, net::{HttpFetch, encode_query_value}};
use flylive_track::{LivePoint, Provider};

use crate::{
    AccountFetch, DueAccount, FetchContext, TrackerAdapter,
    config::ProviderSettings,
    errors::{Result, parse_error},
    providers::{query_sep, xml_unescape}
};

lazy_static! {
    static ref PLACEMARK_RE: Regex = Regex::new( r"(?s)<Placemark\b[^>]*>(.*?)</Placemark>").unwrap();
    static ref WHEN_RE: Regex = Regex::new( r"<when>\s*([^<]+?)\s*</when>").unwrap();
    static ref COORDS_RE: Regex = Regex::new( r"<coordinates>\s*([-+\d.eE]+),([-+\d.eE]+)(?:,([-+\d.eE]+))?\s*</coordinates>").unwrap();
    static ref DATA_RE: Regex = Regex::new( r#"(?s)<Data name="([^"]+)">\s*<value>(.*?)</value>\s*</Data>"#).unwrap();
    static ref NUM_RE: Regex = Regex::new( r"[-+]?\d+(?:\.\d+)?").unwrap();
}

pub struct InreachAdapter {
    settings: ProviderSettings
}

impl InreachAdapter {
    pub fn new (settings: ProviderSettings)->Self { InreachAdapter { settings } }

    /// accounts are either MapShare names or complete feed URLs
    pub fn feed_url (&self, account: &str, start_sec: i64)->String {
        let account = account.trim();
        let url = if account.starts_with("http://") || account.starts_with("https://") {
            account.to_string()
        } else {
            format!("{}/{}", self.settings.base_url, encode_query_value( account))
        };
        format!("{}{}d1={}", url, query_sep( &url), encode_query_value( &iso8601_secs( start_sec)))
    }
}

#[async_trait]
impl TrackerAdapter for InreachAdapter {
    fn settings (&self)->&ProviderSettings { &self.settings }

    async fn fetch_batch (&self, http: &dyn HttpFetch, accounts: &[DueAccount], fctx: &FetchContext)->Result<Vec<AccountFetch>> {
        let mut fetches = Vec::with_capacity( accounts.len());

        // the feed only covers a single account, a failed request is an account error
        for account in accounts {
            let url = self.feed_url( &account.account, fctx.start_sec_for( account));
            let fetch = match http.get_text( &url, &[]).await {
                Ok(kml) => match parse_kml( &kml) {
                    Ok(points) => AccountFetch::ok( account.pilot_id, points),
                    Err(e) => AccountFetch::failed( account.pilot_id, e)
                }
                Err(e) => AccountFetch::failed( account.pilot_id, e)
            };
            fetches.push( fetch);
        }
        Ok(fetches)
    }
}

/// parse a MapShare KML feed. Placemarks that do not have a valid time and position (such as the
/// track line placemark) are skipped without failing the feed
pub fn parse_kml (kml: &str)->Result<Vec<LivePoint>> {
    let kml = kml.trim();
    if kml.is_empty() {
        return Ok(Vec::new()) // no fixes in the requested time range
    }
    if !kml.contains("<kml") {
        return Err( parse_error!("not a KML document"))
    }

    let mut points = Vec::new();
    let mut n_skipped = 0;
    for cap in PLACEMARK_RE.captures_iter( kml) {
        match parse_placemark( &cap[1]) {
            Some(p) => points.push(p),
            None => n_skipped += 1
        }
    }
    if n_skipped > 0 {
        debug!("skipped {n_skipped} inreach placemarks");
    }
    Ok(points)
}

fn parse_placemark (pm: &str)->Option<LivePoint> {
    let time_sec = parse_iso8601_secs( WHEN_RE.captures( pm)?.get(1)?.as_str())?;
    let coords = COORDS_RE.captures( pm)?;
    let lon: f64 = coords.get(1)?.as_str().parse().ok()?;
    let lat: f64 = coords.get(2)?.as_str().parse().ok()?;
    let alt_coord: Option<f64> = coords.get(3).and_then( |m| m.as_str().parse().ok());

    let data: HashMap<&str,&str> = DATA_RE.captures_iter( pm)
        .filter_map( |c| Some( (c.get(1)?.as_str(), c.get(2)?.as_str().trim())))
        .collect();

    // "1234.56 m from MSL"
    let alt = data.get("Elevation").and_then( |v| leading_number(v)).or( alt_coord).unwrap_or(0.0);

    let mut p = LivePoint::new( lat, lon, alt.round(), time_sec, Provider::Inreach);
    p.valid = data.get("Valid GPS Fix").map( |v| is_true(v));
    p.emergency = data.get("In Emergency").map( |v| is_true(v));
    p.speed_kmh = data.get("Velocity").and_then( |v| leading_number(v)); // "12.0 km/h"
    p.message = data.get("Text").map( |v| xml_unescape(v)).filter( |m| !m.is_empty());
    Some(p)
}

fn is_true (v: &str)->bool { v.eq_ignore_ascii_case("true") }

fn leading_number (v: &str)->Option<f64> {
    NUM_RE.find( v).and_then( |m| m.as_str().parse().ok())
}
