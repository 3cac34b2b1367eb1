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

use thiserror::Error;
use flylive_common::net::NetError;
use flylive_track::TrackError;

pub type Result<T> = std::result::Result<T,TrackerError>;

#[derive(Error,Debug)]
pub enum TrackerError {
    #[error("parse error {0}")]
    ParseError(String),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("net error {0}")]
    NetError( #[from] NetError),

    #[error("track error {0}")]
    TrackError( #[from] TrackError),

    #[error("store error {0}")]
    StoreError( #[from] StoreError),

    #[error("serde error {0}")]
    SerdeError( #[from] serde_json::Error),

    #[error("config RON error {0}")]
    RonError( #[from] ron::error::SpannedError),

    #[error("operation failed {0}")]
    OpFailedError(String)
}

/// errors of [`crate::store::PilotStore`] implementations. `Conflict` is the only variant that is
/// supposed to be retried
#[derive(Error,Debug)]
pub enum StoreError {
    #[error("transaction conflict {0}")]
    Conflict(String),

    #[error("transaction state error {0}")]
    TxnStateError(String),

    #[error("backend error {0}")]
    BackendError(String),

    #[error("track error {0}")]
    TrackError( #[from] TrackError),
}

impl StoreError {
    pub fn is_conflict (&self)->bool { matches!( self, StoreError::Conflict(_)) }
}

impl From<sled::Error> for StoreError {
    fn from (e: sled::Error)->Self { StoreError::BackendError( e.to_string()) }
}

macro_rules! parse_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::TrackerError::ParseError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use parse_error;

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::TrackerError::OpFailedError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;
