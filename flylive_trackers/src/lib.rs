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

//! live tracking ingestion: provider adapters that poll external tracking services, the durable
//! pilot store with optimistic transactions, the store writer that merges fetched tracks into pilot
//! records, the publisher of differential sync views and the orchestrator that drives all of them

pub mod errors;
pub use errors::{Result, StoreError, TrackerError};

pub mod account;
pub use account::{DueAccount, ErrorCounter, PilotId, PilotRecord, TrackerAccountState};

pub mod config;
pub use config::{LiveConfig, ProviderConfig, ProviderSettings, load_config};

pub mod store;
pub mod mem_store;
pub mod sled_store;

mod adapter;
pub use adapter::*;

pub mod providers;

pub mod writer;
pub mod publisher;
pub mod orchestrator;
