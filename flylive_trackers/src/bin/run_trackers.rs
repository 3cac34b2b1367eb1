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

use std::{path::PathBuf, sync::Arc};
use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};
use flylive_common::{datetime::{EpochMillis, secs}, init_tracing, net::ReqwestFetch};
use flylive_track::Provider;
use flylive_trackers::{
    load_config,
    orchestrator::{PollGate, TrackerOrchestrator, TrackerService},
    providers::create_adapters,
    publisher::MemViewCache,
    sled_store::SledPilotStore,
    store::{PilotStore, create_pilot},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "poll live tracking providers and maintain pilot tracks in a local database")]
struct Args {
    /// RON config file
    #[arg(short,long, default_value = "flylive_trackers/configs/flylive.ron")]
    config: PathBuf,

    /// sled database directory
    #[arg(short,long, default_value = "flylive.db")]
    db: PathBuf,

    /// RON list of pilots to add to the database if they don't exist yet
    #[arg(short,long)]
    pilots: Option<PathBuf>,

    /// run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// run cycles even without map requests
    #[arg(long)]
    ignore_gate: bool,
}

#[derive(Deserialize,Debug)]
struct PilotEntry {
    id: i64,
    name: String,
    accounts: Vec<(Provider,String)>,
}

#[tokio::main]
async fn main()->Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = Arc::new( load_config( &args.config)?);
    let store: Arc<dyn PilotStore> = Arc::new( SledPilotStore::open( &args.db)?);
    let http = Arc::new( ReqwestFetch::new( config.request_timeout)?);

    if let Some(path) = &args.pilots {
        let pilots: Vec<PilotEntry> = ron::from_str( &std::fs::read_to_string( path)?)?;
        for p in &pilots {
            let accounts: Vec<(Provider,&str)> = p.accounts.iter().map( |(prov,acc)| (*prov, acc.as_str())).collect();
            match create_pilot( store.as_ref(), p.id, &p.name, &accounts).await {
                Ok(()) => info!("added pilot {} ({})", p.id, p.name),
                Err(e) if e.is_conflict() => {} // already there
                Err(e) => warn!("failed to add pilot {}: {e}", p.id)
            }
        }
    }

    let gate = Arc::new( PollGate::new());
    let orchestrator = Arc::new( TrackerOrchestrator::new(
        config.clone(),
        store,
        http,
        create_adapters( &config),
        Arc::new( MemViewCache::new()),
        gate.clone()
    ));

    if args.once {
        gate.touch( EpochMillis::now());
        let report = orchestrator.run_cycle( EpochMillis::now()).await;
        println!("{report:#?}");
        return Ok(())
    }

    if args.ignore_gate {
        let gate = gate.clone();
        tokio::spawn( async move {
            loop {
                gate.touch( EpochMillis::now());
                tokio::time::sleep( secs(10)).await;
            }
        });
    }

    let mut service = TrackerService::new( orchestrator);
    service.start()?;
    info!("tracker service running, terminate with ctrl-c");

    tokio::signal::ctrl_c().await?;
    service.terminate();
    Ok(())
}
