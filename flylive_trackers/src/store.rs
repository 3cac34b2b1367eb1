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

//! the durable pilot store abstraction. Stores provide optimistic concurrency: every record carries
//! a version that is checked (and incremented) on commit, which lets background ingestion and
//! user settings edits write the same records without locks

use std::collections::BTreeMap;
use async_trait::async_trait;
use flylive_common::datetime::EpochMillis;
use flylive_track::Provider;

use crate::{
    account::{DueAccount, PilotId, PilotRecord, TrackerAccountState},
    errors::StoreError
};

pub type StoreResult<T> = std::result::Result<T,StoreError>;

/// a value together with the store version it was read at. Version 0 denotes a record that does not
/// exist (yet)
#[derive(Debug,Clone,PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new (version: u64, value: T)->Self { Versioned { version, value } }
}

#[async_trait]
pub trait PilotStore: Send + Sync {
    /// point reads. Ids without record are omitted from the result
    async fn read_versioned (&self, ids: &[PilotId])->StoreResult<Vec<Versioned<PilotRecord>>>;

    /// atomically write all records, provided each stored version still matches the version of the
    /// respective write. Fails with [`StoreError::Conflict`] without writing anything otherwise
    async fn commit_versioned (&self, writes: Vec<Versioned<PilotRecord>>)->StoreResult<()>;

    /// enabled, non-empty accounts of `provider` that were last updated before `updated_before`,
    /// least recently attempted first and bounded by `limit`
    async fn accounts_due (&self, provider: Provider, updated_before: EpochMillis, limit: usize)->StoreResult<Vec<DueAccount>>;

    /// records with `last_fix_sec > since_sec`
    async fn active_pilots (&self, since_sec: i64)->StoreResult<Vec<PilotRecord>>;
}

/* #region transaction ****************************************************************************/

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum TxnState { Active, Committed, RolledBack }

/// an optimistic transaction over a [`PilotStore`]. Reads record the version they saw, writes are
/// buffered until `commit`, which fails with a conflict if any of the read records changed since
pub struct Transaction<'a> {
    store: &'a dyn PilotStore,
    versions: BTreeMap<PilotId,u64>,
    writes: BTreeMap<PilotId,PilotRecord>,
    state: TxnState,
}

impl<'a> Transaction<'a> {
    pub fn begin (store: &'a dyn PilotStore)->Self {
        Transaction { store, versions: BTreeMap::new(), writes: BTreeMap::new(), state: TxnState::Active }
    }

    pub fn state (&self)->TxnState { self.state }

    fn check_active (&self)->StoreResult<()> {
        if self.state == TxnState::Active { Ok(()) } else { Err( StoreError::TxnStateError( format!("transaction is {:?}", self.state))) }
    }

    pub async fn read (&mut self, ids: &[PilotId])->StoreResult<Vec<PilotRecord>> {
        self.check_active()?;
        let records = self.store.read_versioned( ids).await?;
        let mut values = Vec::with_capacity( records.len());
        for Versioned{version,value} in records {
            self.versions.insert( value.id, version);
            values.push( value);
        }
        Ok(values)
    }

    /// buffer a write. Writing a record that was not read in this transaction requires it to not exist
    pub fn write (&mut self, record: PilotRecord)->StoreResult<()> {
        self.check_active()?;
        self.writes.insert( record.id, record);
        Ok(())
    }

    pub async fn commit (&mut self)->StoreResult<()> {
        self.check_active()?;
        let writes: Vec<Versioned<PilotRecord>> = std::mem::take( &mut self.writes).into_values()
            .map( |r| Versioned::new( self.versions.get( &r.id).copied().unwrap_or(0), r))
            .collect();

        match self.store.commit_versioned( writes).await {
            Ok(()) => {
                self.state = TxnState::Committed;
                Ok(())
            }
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }

    /// discard buffered writes. Idempotent
    pub fn rollback (&mut self) {
        if self.state == TxnState::Active {
            self.writes.clear();
            self.versions.clear();
            self.state = TxnState::RolledBack;
        }
    }
}

/* #endregion transaction */

/// add a new pilot with the given accounts. Fails with a conflict if the id is already used
pub async fn create_pilot (store: &dyn PilotStore, id: PilotId, name: &str, accounts: &[(Provider,&str)])->StoreResult<()> {
    let mut record = PilotRecord::new( id, name);
    for (provider,account) in accounts {
        record.set_account( *provider, account, true);
    }

    let mut txn = Transaction::begin( store);
    txn.write( record)?;
    txn.commit().await
}

/// the settings edit path: read-modify-write of a single pilot record in its own transaction.
/// Concurrent ingestion writes make this fail with [`StoreError::Conflict`]
pub async fn edit_pilot<F> (store: &dyn PilotStore, id: PilotId, f: F)->StoreResult<()> where F: FnOnce(&mut PilotRecord) {
    let mut txn = Transaction::begin( store);
    let mut records = txn.read( &[id]).await?;
    match records.pop() {
        Some(mut record) => {
            f( &mut record);
            txn.write( record)?;
            txn.commit().await
        }
        None => {
            txn.rollback();
            Err( StoreError::BackendError( format!("unknown pilot {id}")))
        }
    }
}

/// the due-account selection shared by store implementations that scan their records
pub fn select_due_accounts<'a,I> (records: I, provider: Provider, updated_before: EpochMillis, limit: usize)->Vec<DueAccount> 
    where I: Iterator<Item=&'a PilotRecord>
{
    let mut due: Vec<DueAccount> = records.filter_map( |r| {
        r.account( provider)
            .filter( |a| a.is_active() && a.last_updated < updated_before)
            .map( |a| DueAccount { pilot_id: r.id, account: a.account.clone(), last_updated: a.last_updated, last_attempt: a.last_attempt })
    }).collect();

    // failing accounts stay due but must not crowd out the ones that were not tried yet
    due.sort_by_key( |d| (d.last_attempt, d.last_updated, d.pilot_id));
    due.truncate( limit);
    due
}
