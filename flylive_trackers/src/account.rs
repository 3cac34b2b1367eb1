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

use serde::{Serialize,Deserialize};
use flylive_common::datetime::EpochMillis;
use flylive_track::{LiveTrack, Provider};

pub type PilotId = i64;

/// request and error counts for one tracker account. Both counts are halved before the request count
/// would overflow, which keeps a bounded recent error rate. `errors <= requests` always holds
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Default)]
pub struct ErrorCounter {
    errors: u16,
    requests: u16,
}

impl ErrorCounter {
    pub fn new ()->Self { ErrorCounter::default() }

    pub fn errors (&self)->u16 { self.errors }
    pub fn requests (&self)->u16 { self.requests }

    pub fn record (&mut self, is_error: bool) {
        if self.requests == u16::MAX {
            self.halve();
        }
        self.requests += 1;
        if is_error {
            self.errors += 1;
        }
    }

    /// both counts are rounded the same way, so `errors <= requests` survives
    pub fn halve (&mut self) {
        self.requests = ((self.requests as u32 + 1) / 2) as u16;
        self.errors = ((self.errors as u32 + 1) / 2) as u16;
    }

    pub fn error_rate (&self)->f64 {
        if self.requests == 0 { 0.0 } else { self.errors as f64 / self.requests as f64 }
    }
}

/// the per-provider account settings and fetch state of a pilot
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct TrackerAccountState {
    pub provider: Provider,
    pub account: String,
    pub enabled: bool,
    /// time of the last successful fetch. Fixes are requested from here (minus safety margin)
    pub last_updated: EpochMillis,
    /// time of the last fetch, failed or not. Due accounts are served least recently attempted first
    #[serde(default)]
    pub last_attempt: EpochMillis,
    pub counter: ErrorCounter,
}

impl TrackerAccountState {
    pub fn new (provider: Provider, account: impl ToString)->Self {
        TrackerAccountState { 
            provider, 
            account: account.to_string(), 
            enabled: true, 
            last_updated: EpochMillis::new(0), 
            last_attempt: EpochMillis::new(0),
            counter: ErrorCounter::new() 
        }
    }

    pub fn is_active (&self)->bool { self.enabled && !self.account.trim().is_empty() }
}

/// an account that is due for refresh, as returned by [`crate::store::PilotStore::accounts_due`]
#[derive(Debug,Clone,PartialEq)]
pub struct DueAccount {
    pub pilot_id: PilotId,
    pub account: String,
    pub last_updated: EpochMillis,
    pub last_attempt: EpochMillis,
}

/// the durable per-pilot record. Only mutated through store transactions
#[derive(Debug,Clone,PartialEq)]
pub struct PilotRecord {
    pub id: PilotId,
    pub name: String,
    pub track: LiveTrack,
    pub accounts: Vec<TrackerAccountState>,
    pub last_fix_sec: Option<i64>,
}

impl PilotRecord {
    pub fn new (id: PilotId, name: impl ToString)->Self {
        let name = name.to_string();
        let track = LiveTrack::new( &name, Some(id));
        PilotRecord { id, name, track, accounts: Vec::new(), last_fix_sec: None }
    }

    pub fn account (&self, provider: Provider)->Option<&TrackerAccountState> {
        self.accounts.iter().find( |a| a.provider == provider)
    }

    pub fn account_mut (&mut self, provider: Provider)->Option<&mut TrackerAccountState> {
        self.accounts.iter_mut().find( |a| a.provider == provider)
    }

    /// settings edit: (re)set the account of a provider. Changing the account resets its fetch state
    pub fn set_account (&mut self, provider: Provider, account: &str, enabled: bool) {
        match self.account_mut( provider) {
            Some(state) => {
                if state.account != account {
                    *state = TrackerAccountState::new( provider, account);
                }
                state.enabled = enabled;
            }
            None => {
                let mut state = TrackerAccountState::new( provider, account);
                state.enabled = enabled;
                self.accounts.push( state);
            }
        }
    }

    /// update the denormalized last fix time from the track
    pub fn sync_last_fix (&mut self) {
        self.last_fix_sec = self.track.last_time_sec();
    }
}
