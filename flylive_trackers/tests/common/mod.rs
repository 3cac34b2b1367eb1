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

//! test fixtures shared by the flylive_trackers integration tests

use std::{sync::{Arc, Mutex}, time::Duration};
use async_trait::async_trait;
use flylive_common::{datetime::EpochMillis, net::{HttpFetch, NetError, Result}};
use flylive_track::Provider;
use flylive_trackers::{
    LiveConfig, ProviderSettings, RefreshContext,
    mem_store::MemPilotStore,
    store::{PilotStore, create_pilot},
};

/// 2024-05-01T11:00:00Z
pub const NOW_SEC: i64 = 1714561200;

pub fn now ()->EpochMillis { EpochMillis::from_secs( NOW_SEC) }

#[derive(Debug,Clone)]
pub enum MockResponse {
    Text(String),
    Status(u16),
    Delayed(Duration,String),
}

/// canned responses for URLs that contain a given pattern. The first matching rule wins, unmatched
/// URLs get a 404
#[derive(Default)]
pub struct MockFetch {
    rules: Vec<(String,MockResponse)>,
    requests: Mutex<Vec<String>>,
}

impl MockFetch {
    pub fn new ()->Self { MockFetch::default() }

    pub fn with (mut self, pattern: &str, response: MockResponse)->Self {
        self.rules.push( (pattern.to_string(), response));
        self
    }

    pub fn text (self, pattern: &str, body: &str)->Self { self.with( pattern, MockResponse::Text( body.to_string())) }

    pub fn requests (&self)->Vec<String> { self.requests.lock().unwrap().clone() }
}

#[async_trait]
impl HttpFetch for MockFetch {
    async fn get_text (&self, url: &str, headers: &[(&str,&str)])->Result<String> {
        self.requests.lock().unwrap().push( url.to_string());
        let response = self.rules.iter().find( |(p,_)| url.contains( p.as_str())).map( |(_,r)| r.clone());

        match response {
            Some(MockResponse::Text(body)) => Ok(body),
            Some(MockResponse::Status(code)) => Err( NetError::StatusError( code, url.to_string())),
            Some(MockResponse::Delayed(dur,body)) => {
                tokio::time::sleep( dur).await;
                Ok(body)
            }
            None => Err( NetError::StatusError( 404, url.to_string()))
        }
    }
}

/// a store with one pilot per account, ids starting at 1
pub async fn store_with_accounts (provider: Provider, accounts: &[&str])->Arc<MemPilotStore> {
    let store = Arc::new( MemPilotStore::new());
    for (i,account) in accounts.iter().enumerate() {
        let id = i as i64 + 1;
        create_pilot( store.as_ref(), id, &format!("pilot-{id}"), &[(provider, *account)]).await.unwrap();
    }
    store
}

pub fn refresh_context (store: Arc<dyn PilotStore>, http: Arc<dyn HttpFetch>)->RefreshContext {
    let config = LiveConfig::default();
    RefreshContext {
        store,
        http,
        now: now(),
        retention: config.retention,
        safety_margin: config.safety_margin,
        min_fix_interval_sec: config.min_fix_interval_sec(),
    }
}

/// a SPOT feed with TRACK messages at the given times
pub fn spot_feed (times: &[i64])->String {
    let msgs: Vec<String> = times.iter().enumerate().map( |(i,t)| {
        format!(r#"{{"latitude":{},"longitude":6.5,"altitude":{},"unixTime":{},"messageType":"TRACK"}}"#, 45.5 + i as f64 * 0.01, 1500 + i, t)
    }).collect();
    format!(r#"{{"response":{{"feedMessageResponse":{{"messages":{{"message":[{}]}}}}}}}}"#, msgs.join(","))
}

/// a flymaster response for (tracker id, fix times)
pub fn flymaster_data (trackers: &[(&str,&[i64])])->String {
    let entries: Vec<String> = trackers.iter().map( |(id,times)| {
        let fixes: Vec<String> = times.iter().enumerate().map( |(i,t)| {
            format!(r#"{{"ai":{},"oi":390000,"h":{},"d":{}}}"#, 2730000 + i * 600, 1800 + i, t)
        }).collect();
        format!(r#""{}":[{}]"#, id, fixes.join(","))
    }).collect();
    format!("{{{}}}", entries.join(","))
}
