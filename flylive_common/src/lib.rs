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

//! common utilities shared by the flylive crates: time helpers, great circle distances,
//! the async HTTP fetch abstraction used by tracker adapters, and error definition macros

pub mod macros;
pub mod datetime;
pub mod geo;
pub mod net;

use tracing_subscriber::EnvFilter;

/// initialize a `tracing` fmt subscriber that is configured through the RUST_LOG environment variable
/// (defaults to "info"). This is supposed to be called once from `main`
pub fn init_tracing () {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter( filter).try_init();
}

// a global fn that can be used with serde(skip_serializing_if="flylive_common::is_none")
#[inline] pub fn is_none<T> (opt: &Option<T>)->bool { opt.is_none() }
