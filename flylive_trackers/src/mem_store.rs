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

use std::{collections::BTreeMap, sync::Mutex};
use async_trait::async_trait;
use flylive_common::datetime::EpochMillis;
use flylive_track::Provider;

use crate::{
    account::{DueAccount, PilotId, PilotRecord},
    errors::StoreError,
    store::{PilotStore, StoreResult, Versioned, select_due_accounts}
};

/// a non-durable [`PilotStore`] for tests and ephemeral runs
#[derive(Default)]
pub struct MemPilotStore {
    records: Mutex<BTreeMap<PilotId,(u64,PilotRecord)>>
}

impl MemPilotStore {
    pub fn new ()->Self { MemPilotStore::default() }

    fn lock (&self)->StoreResult<std::sync::MutexGuard<'_,BTreeMap<PilotId,(u64,PilotRecord)>>> {
        self.records.lock().map_err( |e| StoreError::BackendError( e.to_string()))
    }

    pub fn len (&self)->usize { self.lock().map( |m| m.len()).unwrap_or(0) }

    /// current record snapshot (without transaction)
    pub fn get (&self, id: PilotId)->Option<PilotRecord> {
        self.lock().ok().and_then( |m| m.get( &id).map( |(_,r)| r.clone()))
    }

    pub fn version (&self, id: PilotId)->u64 {
        self.lock().ok().and_then( |m| m.get( &id).map( |(v,_)| *v)).unwrap_or(0)
    }
}

#[async_trait]
impl PilotStore for MemPilotStore {
    async fn read_versioned (&self, ids: &[PilotId])->StoreResult<Vec<Versioned<PilotRecord>>> {
        let map = self.lock()?;
        Ok( ids.iter()
            .filter_map( |id| map.get( id).map( |(v,r)| Versioned::new( *v, r.clone())))
            .collect() )
    }

    async fn commit_versioned (&self, writes: Vec<Versioned<PilotRecord>>)->StoreResult<()> {
        let mut map = self.lock()?;
        for w in &writes {
            let current = map.get( &w.value.id).map( |(v,_)| *v).unwrap_or(0);
            if current != w.version {
                return Err( StoreError::Conflict( format!("pilot {} at version {} (expected {})", w.value.id, current, w.version)))
            }
        }
        for w in writes {
            map.insert( w.value.id, (w.version + 1, w.value));
        }
        Ok(())
    }

    async fn accounts_due (&self, provider: Provider, updated_before: EpochMillis, limit: usize)->StoreResult<Vec<DueAccount>> {
        let map = self.lock()?;
        Ok( select_due_accounts( map.values().map( |(_,r)| r), provider, updated_before, limit) )
    }

    async fn active_pilots (&self, since_sec: i64)->StoreResult<Vec<PilotRecord>> {
        let map = self.lock()?;
        Ok( map.values()
            .filter( |(_,r)| r.last_fix_sec.is_some_and( |t| t > since_sec))
            .map( |(_,r)| r.clone())
            .collect() )
    }
}
