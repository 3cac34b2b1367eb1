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

use std::path::Path;
use async_trait::async_trait;
use serde::{Serialize,Deserialize};
use sled::transaction::{abort, TransactionError};
use flylive_common::datetime::EpochMillis;
use flylive_track::{Provider, codec::{DifferentialTrack, decode_track, encode_track, from_blob, to_blob}};

use crate::{
    account::{DueAccount, PilotId, PilotRecord, TrackerAccountState},
    errors::StoreError,
    store::{PilotStore, StoreResult, Versioned, select_due_accounts}
};

const VERSION_LEN: usize = 8;

/// the persisted form of a [`PilotRecord`]. The track is stored differentially encoded
#[derive(Serialize,Deserialize,Debug)]
struct StoredRecord {
    id: PilotId,
    name: String,
    track: DifferentialTrack,
    accounts: Vec<TrackerAccountState>,
    #[serde(default)]
    last_fix_sec: Option<i64>,
}

/// a durable [`PilotStore`] on top of an embedded sled database. Values are an 8 byte big endian
/// version followed by the compressed record blob
pub struct SledPilotStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledPilotStore {
    pub fn open<P: AsRef<Path>> (path: P)->StoreResult<Self> {
        let db = sled::open( path)?;
        Self::from_db( db)
    }

    /// a store that is removed when dropped
    pub fn temporary ()->StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db( db)
    }

    fn from_db (db: sled::Db)->StoreResult<Self> {
        let tree = db.open_tree( "pilots")?;
        Ok( SledPilotStore { db, tree } )
    }

    pub fn len (&self)->usize { self.tree.len() }

    fn all_records (&self)->StoreResult<Vec<PilotRecord>> {
        let mut records = Vec::new();
        for kv in self.tree.iter() {
            let (_,value) = kv?;
            let (_,record) = decode_value( &value)?;
            records.push( record);
        }
        Ok(records)
    }
}

fn key (id: PilotId)->[u8;8] { id.to_be_bytes() }

fn encode_value (version: u64, record: &PilotRecord)->StoreResult<Vec<u8>> {
    let stored = StoredRecord {
        id: record.id,
        name: record.name.clone(),
        track: encode_track( &record.track),
        accounts: record.accounts.clone(),
        last_fix_sec: record.last_fix_sec,
    };
    let blob = to_blob( &stored)?;

    let mut value = Vec::with_capacity( VERSION_LEN + blob.len());
    value.extend_from_slice( &version.to_be_bytes());
    value.extend_from_slice( &blob);
    Ok(value)
}

fn decode_version (value: &[u8])->StoreResult<u64> {
    if value.len() < VERSION_LEN {
        return Err( StoreError::BackendError( format!("corrupted record value of length {}", value.len())))
    }
    let mut bs = [0u8;VERSION_LEN];
    bs.copy_from_slice( &value[..VERSION_LEN]);
    Ok( u64::from_be_bytes( bs) )
}

fn decode_value (value: &[u8])->StoreResult<(u64,PilotRecord)> {
    let version = decode_version( value)?;
    let stored: StoredRecord = from_blob( &value[VERSION_LEN..])?;
    let track = decode_track( &stored.track)?;
    let record = PilotRecord { id: stored.id, name: stored.name, track, accounts: stored.accounts, last_fix_sec: stored.last_fix_sec };
    Ok( (version, record) )
}

#[async_trait]
impl PilotStore for SledPilotStore {
    async fn read_versioned (&self, ids: &[PilotId])->StoreResult<Vec<Versioned<PilotRecord>>> {
        let mut records = Vec::with_capacity( ids.len());
        for id in ids {
            if let Some(value) = self.tree.get( key(*id))? {
                let (version,record) = decode_value( &value)?;
                records.push( Versioned::new( version, record));
            }
        }
        Ok(records)
    }

    async fn commit_versioned (&self, writes: Vec<Versioned<PilotRecord>>)->StoreResult<()> {
        // encode outside of the transaction closure, which sled might run more than once
        let mut encoded: Vec<([u8;8],u64,Vec<u8>)> = Vec::with_capacity( writes.len());
        for w in &writes {
            encoded.push( (key( w.value.id), w.version, encode_value( w.version + 1, &w.value)?));
        }

        let res = self.tree.transaction( |tx| {
            for (k, expected, value) in &encoded {
                let current = match tx.get( &k[..])? {
                    Some(v) => match decode_version( &v) {
                        Ok(version) => version,
                        Err(e) => return abort(e)
                    }
                    None => 0
                };
                if current != *expected {
                    return abort( StoreError::Conflict( format!("pilot {} at version {} (expected {})", i64::from_be_bytes(*k), current, expected)))
                }
                tx.insert( &k[..], value.as_slice())?;
            }
            Ok(())
        });

        match res {
            Ok(()) => {
                self.tree.flush_async().await?;
                Ok(())
            }
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(e.into())
        }
    }

    async fn accounts_due (&self, provider: Provider, updated_before: EpochMillis, limit: usize)->StoreResult<Vec<DueAccount>> {
        let records = self.all_records()?;
        Ok( select_due_accounts( records.iter(), provider, updated_before, limit) )
    }

    async fn active_pilots (&self, since_sec: i64)->StoreResult<Vec<PilotRecord>> {
        let mut records = self.all_records()?;
        records.retain( |r| r.last_fix_sec.is_some_and( |t| t > since_sec));
        Ok(records)
    }
}
