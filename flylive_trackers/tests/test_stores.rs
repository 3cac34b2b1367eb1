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

// run with "cargo test --test test_stores -- --nocapture"

mod common;
use common::*;

use flylive_common::datetime::{EpochMillis, secs};
use flylive_track::{Fix, FixExtra, LiveTrack, Provider, fix_flags};
use flylive_trackers::{
    PilotRecord, StoreError,
    mem_store::MemPilotStore,
    sled_store::SledPilotStore,
    store::{PilotStore, Transaction, TxnState, Versioned, create_pilot, edit_pilot},
};

fn sample_track ()->LiveTrack {
    let mut track = LiveTrack::new( "Ann", Some(1));
    track.push_fix( Fix::new( 45.12345, 6.54321, 1500.0, NOW_SEC - 120, fix_flags( Provider::Spot, true, false, false)), None);
    track.push_fix( Fix::new( 45.12400, 6.54400, 1510.0, NOW_SEC - 60, fix_flags( Provider::Spot, true, true, false)), 
        Some( FixExtra { message: Some("help".into()), speed_kmh: Some(12.5), gnd_alt_m: Some(900.0) }));
    track
}

async fn exercise_store (store: &dyn PilotStore) {
    create_pilot( store, 1, "Ann", &[(Provider::Spot, "feedA"), (Provider::Flyme, "11")]).await.unwrap();
    create_pilot( store, 2, "Bob", &[(Provider::Spot, "feedB")]).await.unwrap();
    create_pilot( store, 3, "Cid", &[(Provider::Spot, "")]).await.unwrap();

    // duplicate ids conflict
    let res = create_pilot( store, 1, "Ann again", &[]).await;
    assert!( res.unwrap_err().is_conflict());

    // versioned reads
    let records = store.read_versioned( &[1,2,99]).await.unwrap();
    assert_eq!( records.len(), 2);
    assert!( records.iter().all( |r| r.version == 1));

    // track and account state round trip
    edit_pilot( store, 1, |p| {
        p.track = sample_track();
        p.sync_last_fix();
        let acc = p.account_mut( Provider::Spot).unwrap();
        acc.last_updated = EpochMillis::from_secs( NOW_SEC - 600);
        acc.counter.record( true);
    }).await.unwrap();

    let Versioned{ version, value } = store.read_versioned( &[1]).await.unwrap().pop().unwrap();
    assert_eq!( version, 2);
    assert_eq!( value.track.len(), 2);
    assert_eq!( value.track.fixes[0].lat, 45.12345);
    assert!( value.track.fixes[1].is_emergency());
    assert_eq!( value.track.message_at(1), Some("help"));
    assert_eq!( value.track.extra_at(1).unwrap().speed_kmh, Some(12.5));
    assert_eq!( value.last_fix_sec, Some( NOW_SEC - 60));
    assert_eq!( value.account( Provider::Spot).unwrap().counter.errors(), 1);

    // stale writes are rejected without partial application
    let stale = vec![ 
        Versioned::new( 1, PilotRecord::new( 1, "stale")),
        Versioned::new( 1, PilotRecord::new( 2, "fresh")),
    ];
    assert!( store.commit_versioned( stale).await.unwrap_err().is_conflict());
    let bob = store.read_versioned( &[2]).await.unwrap().pop().unwrap();
    assert_eq!( (bob.version, bob.value.name.as_str()), (1, "Bob"));

    // due accounts: oldest first, empty and disabled accounts excluded
    let due = store.accounts_due( Provider::Spot, now(), 10).await.unwrap();
    let ids: Vec<i64> = due.iter().map( |d| d.pilot_id).collect();
    assert_eq!( ids, vec![2,1]);

    let due = store.accounts_due( Provider::Spot, now(), 1).await.unwrap();
    assert_eq!( due[0].account, "feedB");

    let due = store.accounts_due( Provider::Spot, EpochMillis::from_secs( NOW_SEC - 600), 10).await.unwrap();
    assert_eq!( due.len(), 1); // pilot 1 was updated at the threshold

    edit_pilot( store, 2, |p| p.set_account( Provider::Spot, "feedB", false)).await.unwrap();
    assert_eq!( store.accounts_due( Provider::Spot, now(), 10).await.unwrap().len(), 1);

    // active pilots
    let active = store.active_pilots( NOW_SEC - 3600).await.unwrap();
    assert_eq!( active.len(), 1);
    assert_eq!( active[0].id, 1);
    assert!( store.active_pilots( NOW_SEC - 60).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mem_store() {
    let store = MemPilotStore::new();
    exercise_store( &store).await;
    assert_eq!( store.len(), 3);
}

#[tokio::test]
async fn test_sled_store() {
    let store = SledPilotStore::temporary().unwrap();
    exercise_store( &store).await;
    assert_eq!( store.len(), 3);
}

#[tokio::test]
async fn test_sled_store_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilots.db");
    {
        let store = SledPilotStore::open( &path).unwrap();
        create_pilot( &store, 5, "Eve", &[(Provider::Inreach, "EveShare")]).await.unwrap();
        edit_pilot( &store, 5, |p| { p.track = sample_track(); p.sync_last_fix(); }).await.unwrap();
    }

    let store = SledPilotStore::open( &path).unwrap();
    let record = store.read_versioned( &[5]).await.unwrap().pop().unwrap();
    assert_eq!( record.version, 2);
    assert_eq!( record.value.name, "Eve");
    assert_eq!( record.value.track.len(), 2);
    assert_eq!( record.value.account( Provider::Inreach).unwrap().account, "EveShare");
}

#[tokio::test]
async fn test_transaction_states() {
    let store = MemPilotStore::new();
    create_pilot( &store, 1, "Ann", &[]).await.unwrap();

    let mut txn = Transaction::begin( &store);
    let mut records = txn.read( &[1]).await.unwrap();
    records[0].name = "Anna".into();
    txn.write( records.pop().unwrap()).unwrap();
    txn.rollback();
    assert_eq!( txn.state(), TxnState::RolledBack);
    assert!( matches!( txn.commit().await, Err(StoreError::TxnStateError(_))));
    assert_eq!( store.get(1).unwrap().name, "Ann");

    // concurrent edit between read and commit
    let mut txn = Transaction::begin( &store);
    let mut records = txn.read( &[1]).await.unwrap();
    edit_pilot( &store, 1, |p| p.name = "Edited".into()).await.unwrap();
    records[0].name = "Anna".into();
    txn.write( records.pop().unwrap()).unwrap();
    assert!( txn.commit().await.unwrap_err().is_conflict());
    assert_eq!( txn.state(), TxnState::RolledBack);
    assert_eq!( store.get(1).unwrap().name, "Edited");
}
