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

use std::sync::Arc;
use anyhow::{Result, anyhow};
use clap::Parser;
use flylive_common::{datetime::{EpochMillis, minutes}, init_tracing, net::ReqwestFetch};
use flylive_track::Provider;
use flylive_trackers::{
    RefreshContext, 
    config::{LiveConfig, load_config},
    mem_store::MemPilotStore, 
    providers::create_adapter, 
    store::{PilotStore, create_pilot}
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "retrieve and print the recent fixes of live tracking accounts")]
struct Args {
    /// optional RON config file (for base urls and api keys)
    #[arg(short,long)]
    config: Option<String>,

    /// how many minutes back to retrieve
    #[arg(short,long, default_value_t = 60)]
    minutes: u64,

    /// inreach, spot, skylines, flymaster or flyme
    provider: String,

    #[arg(num_args=1..)]
    accounts: Vec<String>,
}

#[tokio::main]
async fn main()->Result<()> {
    init_tracing();
    let args = Args::parse();

    let provider = Provider::from_name( &args.provider).ok_or_else( || anyhow!("unknown provider {}", args.provider))?;
    let mut config = match &args.config {
        Some(path) => load_config( path)?,
        None => LiveConfig::default()
    };
    config.retention = minutes( args.minutes);
    config.safety_margin = minutes( args.minutes);

    let store = Arc::new( MemPilotStore::new());
    for (i,account) in args.accounts.iter().enumerate() {
        create_pilot( store.as_ref(), i as i64 + 1, account, &[(provider, account.as_str())]).await?;
    }

    let mut settings = config.provider_settings( provider);
    settings.enabled = true;
    settings.max_accounts = settings.max_accounts.max( args.accounts.len());
    let adapter = create_adapter( settings);

    let ctx = RefreshContext {
        store,
        http: Arc::new( ReqwestFetch::new( config.request_timeout)?),
        now: EpochMillis::now(),
        retention: config.retention,
        safety_margin: config.safety_margin,
        min_fix_interval_sec: 0,
    };
    let result = adapter.refresh( &ctx).await;

    for e in &result.errors {
        println!("error: {e}");
    }
    for update in result.updates.values() {
        println!("------- account: {}", update.account);
        if let Some(e) = &update.error {
            println!("error: {e}");
        }
        if let Some(account_update) = &update.account_update {
            println!("account update: {account_update:?}");
        }
        match &update.track {
            Some(track) => {
                for (i,fix) in track.fixes.iter().enumerate() {
                    println!("{:>4}: {} {:.5},{:.5} {:.0}m {:?}", 
                        i, EpochMillis::from_secs( fix.time_sec), fix.lat, fix.lon, fix.alt, track.extra_at(i));
                }
            }
            None => println!("no fixes")
        }
    }
    println!("retrieved in {:?}", result.duration);

    Ok(())
}
