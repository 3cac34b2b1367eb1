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

//! SPOT GPS messengers, via the public feed API (one feed per account)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use flylive_common::{datetime::iso8601_secs, net::{HttpFetch, encode_query_value}};
use flylive_track::{LivePoint, Provider};

use crate::{
    AccountFetch, DueAccount, FetchContext, TrackerAdapter,
    config::ProviderSettings,
    errors::{Result, parse_error},
};

/// feed error code for "no displayable messages in the requested range"
const NO_MESSAGES_CODE: &str = "E-0195";

pub struct SpotAdapter {
    settings: ProviderSettings
}

impl SpotAdapter {
    pub fn new (settings: ProviderSettings)->Self { SpotAdapter { settings } }

    pub fn feed_url (&self, feed_id: &str, start_sec: i64)->String {
        format!("{}/{}/message.json?startDate={}", 
            self.settings.base_url, encode_query_value( feed_id.trim()), encode_query_value( &iso8601_secs( start_sec)))
    }
}

#[async_trait]
impl TrackerAdapter for SpotAdapter {
    fn settings (&self)->&ProviderSettings { &self.settings }

    async fn fetch_batch (&self, http: &dyn HttpFetch, accounts: &[DueAccount], fctx: &FetchContext)->Result<Vec<AccountFetch>> {
        let mut fetches = Vec::with_capacity( accounts.len());
        for account in accounts {
            let url = self.feed_url( &account.account, fctx.start_sec_for( account));
            let fetch = match http.get_text( &url, &[]).await {
                Ok(json) => match parse_feed( &json) {
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

/* #region feed format ****************************************************************************/

#[derive(Deserialize,Debug)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec (self)->Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Deserialize,Debug)]
struct Feed {
    response: FeedResponse
}

#[derive(Deserialize,Debug)]
struct FeedResponse {
    #[serde(rename="feedMessageResponse")]
    feed_message_response: Option<FeedMessageResponse>,
    errors: Option<FeedErrors>,
}

#[derive(Deserialize,Debug)]
struct FeedMessageResponse {
    messages: Option<FeedMessages>
}

#[derive(Deserialize,Debug)]
struct FeedMessages {
    message: Option<OneOrMany<Value>>
}

#[derive(Deserialize,Debug)]
struct FeedErrors {
    error: OneOrMany<FeedError>
}

#[derive(Deserialize,Debug)]
struct FeedError {
    code: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize,Debug)]
#[serde(rename_all="camelCase")]
struct SpotMessage {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude: f64,
    unix_time: i64,
    #[serde(default)]
    message_type: String,
    #[serde(default)]
    message_content: Option<String>,
    #[serde(default)]
    battery_state: Option<String>,
}

/* #endregion feed format */

/// parse a SPOT message feed. Messages that do not parse are skipped, the feed error for "no messages"
/// is an empty result. Other feed errors fail the account
pub fn parse_feed (json: &str)->Result<Vec<LivePoint>> {
    let feed: Feed = serde_json::from_str( json)?;

    if let Some(errors) = feed.response.errors {
        let errors = errors.error.into_vec();
        if errors.iter().all( |e| e.code == NO_MESSAGES_CODE) {
            return Ok(Vec::new())
        }
        let msg = errors.iter().map( |e| format!("{} {}", e.code, e.text)).collect::<Vec<_>>().join(", ");
        return Err( parse_error!("feed error: {msg}"))
    }

    let messages = feed.response.feed_message_response
        .and_then( |r| r.messages)
        .and_then( |m| m.message)
        .map( |m| m.into_vec())
        .unwrap_or_default();

    let mut points = Vec::with_capacity( messages.len());
    for value in messages {
        match serde_json::from_value::<SpotMessage>( value) {
            Ok(msg) => points.push( to_live_point( msg)),
            Err(e) => debug!("skipping spot message: {e}")
        }
    }
    Ok(points)
}

fn to_live_point (msg: SpotMessage)->LivePoint {
    let msg_type = msg.message_type.to_uppercase();
    let is_emergency = msg_type == "SOS" || msg_type == "HELP";

    let mut p = LivePoint::new( msg.latitude, msg.longitude, msg.altitude, msg.unix_time, Provider::Spot);
    p.emergency = Some( is_emergency);
    p.low_battery = msg.battery_state.map( |s| s.eq_ignore_ascii_case("LOW"));

    // regular track points carry no message
    if msg_type != "TRACK" && msg_type != "UNLIMITED-TRACK" && msg_type != "EXTREME-TRACK" {
        p.message = msg.message_content.filter( |m| !m.trim().is_empty());
    }
    p
}
