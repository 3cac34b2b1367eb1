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

use std::{path::Path, time::Duration};
use serde::{Serialize,Deserialize};
use flylive_common::datetime::{
    deserialize_duration, deserialize_optional_duration, duration_secs, hours, millis, minutes, secs, serialize_duration
};
use flylive_track::Provider;

use crate::errors::Result;

/// the static configuration of the ingestion/publish engine. All fields have defaults so that
/// partial RON files are valid
#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct LiveConfig {
    /// how long fixes are kept in pilot tracks
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub retention: Duration,

    /// window of the incremental sync view
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub incremental_window: Duration,

    /// window of the export sync view
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub export_window: Duration,

    /// minimal spacing of non-protected fixes
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub min_fix_interval: Duration,

    /// how far back from the last account update we re-fetch fixes
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub safety_margin: Duration,

    /// orchestrator cycle interval
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub update_interval: Duration,

    /// a cycle only runs if the map was requested within this window
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub poll_active_window: Duration,

    /// per HTTP request
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub request_timeout: Duration,

    pub pilots_per_txn: usize,
    pub txn_max_attempts: usize,

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub txn_backoff: Duration,

    /// whose fixes are removed from the export view (and whose accounts are reported as remote ids)
    pub export_provider: Provider,

    pub providers: Vec<ProviderConfig>,
}

impl Default for LiveConfig {
    fn default ()->Self {
        LiveConfig {
            retention: hours(24),
            incremental_window: hours(1),
            export_window: minutes(5),
            min_fix_interval: secs(60),
            safety_margin: minutes(20),
            update_interval: secs(60),
            poll_active_window: minutes(5),
            request_timeout: secs(20),
            pilots_per_txn: 20,
            txn_max_attempts: 3,
            txn_backoff: millis(100),
            export_provider: Provider::Flyme,
            providers: Vec::new(),
        }
    }
}

impl LiveConfig {
    pub fn provider_config (&self, provider: Provider)->Option<&ProviderConfig> {
        self.providers.iter().find( |pc| pc.provider == provider)
    }

    /// the effective settings for `provider`: configured values on top of the provider defaults
    pub fn provider_settings (&self, provider: Provider)->ProviderSettings {
        let mut settings = ProviderSettings::default_for( provider);
        if let Some(pc) = self.provider_config( provider) {
            settings.enabled = pc.enabled;
            if let Some(url) = &pc.base_url { settings.base_url = url.clone() }
            if let Some(d) = pc.refresh_interval { settings.refresh_interval = d }
            if let Some(n) = pc.max_accounts { settings.max_accounts = n.max(1) }
            if let Some(n) = pc.accounts_per_request { settings.accounts_per_request = n.max(1) }
            if let Some(d) = pc.deadline { settings.deadline = d }
            if pc.api_key.is_some() { settings.api_key = pc.api_key.clone() }
        }
        settings
    }

    pub fn min_fix_interval_sec (&self)->i64 { duration_secs( self.min_fix_interval) }
    pub fn retention_sec (&self)->i64 { duration_secs( self.retention) }
}

/// per-provider overrides. Unset values fall back to [`ProviderSettings::default_for`]
#[derive(Serialize,Deserialize,Debug,Clone)]
pub struct ProviderConfig {
    pub provider: Provider,

    #[serde(default="default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default, deserialize_with="deserialize_optional_duration")]
    pub refresh_interval: Option<Duration>,

    #[serde(default)]
    pub max_accounts: Option<usize>,

    #[serde(default)]
    pub accounts_per_request: Option<usize>,

    #[serde(default, deserialize_with="deserialize_optional_duration")]
    pub deadline: Option<Duration>,

    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_true ()->bool { true }

/// effective per-provider adapter settings
#[derive(Debug,Clone,PartialEq)]
pub struct ProviderSettings {
    pub provider: Provider,
    pub enabled: bool,
    pub base_url: String,
    /// accounts updated more recently than this are not due
    pub refresh_interval: Duration,
    /// upper bound of accounts per adapter invocation
    pub max_accounts: usize,
    /// number of accounts the provider API accepts in one request
    pub accounts_per_request: usize,
    /// shared deadline of one adapter invocation
    pub deadline: Duration,
    pub api_key: Option<String>,
}

impl ProviderSettings {
    pub fn default_for (provider: Provider)->Self {
        let (base_url, refresh_interval, max_accounts, accounts_per_request) = match provider {
            Provider::Inreach => ("https://share.garmin.com/Feed/Share", minutes(2), 20, 1),
            Provider::Spot => ("https://api.findmespot.com/spot-main-web/consumer/rest-api/2.0/public/feed", minutes(2), 20, 1),
            Provider::Skylines => ("https://skylines.aero/api/live", minutes(1), 20, 10),
            Provider::Flymaster => ("https://lt.flymaster.net/wlb/getLiveData.php", minutes(1), 200, 200),
            Provider::Flyme => ("https://xcglobe.com/livetrack", minutes(1), 200, 200),
        };

        ProviderSettings {
            provider,
            enabled: true,
            base_url: base_url.to_string(),
            refresh_interval,
            max_accounts,
            accounts_per_request,
            deadline: secs(40),
            api_key: None,
        }
    }
}

pub fn load_config<P: AsRef<Path>> (path: P)->Result<LiveConfig> {
    let contents = std::fs::read_to_string( path)?;
    parse_config( &contents)
}

pub fn parse_config (s: &str)->Result<LiveConfig> {
    Ok( ron::from_str( s)? )
}
