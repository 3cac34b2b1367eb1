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

use std::{fmt, time::Duration};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use parse_duration::parse;

/// wall clock time in milliseconds since the unix epoch
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash,Default)]
pub struct EpochMillis(i64);

impl EpochMillis {
    pub fn now ()->Self { EpochMillis( Utc::now().timestamp_millis()) }

    pub fn new(millis:i64)->Self { EpochMillis(millis) }

    pub fn from_secs(secs: i64)->Self { EpochMillis(secs*1000) }
    
    pub fn millis(&self)->i64 { self.0 }

    /// truncating conversion to epoch seconds
    pub fn secs(&self)->i64 { self.0.div_euclid(1000) }

    pub fn saturating_sub (&self, dur: Duration)->Self {
        EpochMillis( self.0.saturating_sub( dur.as_millis() as i64))
    }

    pub fn saturating_add (&self, dur: Duration)->Self {
        EpochMillis( self.0.saturating_add( dur.as_millis() as i64))
    }

    /// elapsed time since `earlier`, zero if `earlier` is in the future
    pub fn duration_since (&self, earlier: EpochMillis)->Duration {
        if self.0 > earlier.0 { Duration::from_millis( (self.0 - earlier.0) as u64) } else { Duration::ZERO }
    }
}

impl fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp_millis(self.0) {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts( SecondsFormat::Millis, true)),
            None => write!(f, "{}ms", self.0)
        }
    }
}

impl<Tz> From<DateTime<Tz>> for EpochMillis where Tz: TimeZone {
    fn from (date: DateTime<Tz>)->Self { EpochMillis(date.timestamp_millis()) }
}

// the min,hour,day Duration ctors are still experimental, hence we provide our own wrappers
#[inline] pub fn millis (n: u64)->Duration { Duration::from_millis(n) }
#[inline] pub fn secs (n: u64)->Duration { Duration::from_secs(n) }
#[inline] pub fn minutes (n: u64)->Duration { Duration::from_secs(n * 60) }
#[inline] pub fn hours (n: u64)->Duration { Duration::from_secs(n * 3600) }

/// this should be used wherever we might have to use a sim clock instead of the wall clock
#[inline]
pub fn utc_now()->DateTime<Utc> {
    Utc::now()
}

#[inline]
pub fn epoch_secs ()->i64 {
    Utc::now().timestamp()
}

/// `duration` as whole seconds in the signed domain we use for fix timestamps
#[inline]
pub fn duration_secs (dur: Duration)->i64 {
    dur.as_secs() as i64
}

/// RFC3339 with second resolution and 'Z' suffix, as required by provider query parameters
pub fn iso8601_secs (epoch_secs: i64)->String {
    match DateTime::<Utc>::from_timestamp( epoch_secs, 0) {
        Some(dt) => dt.to_rfc3339_opts( SecondsFormat::Secs, true),
        None => String::from("1970-01-01T00:00:00Z")
    }
}

pub fn parse_iso8601_secs (s: &str)->Option<i64> {
    DateTime::parse_from_rfc3339(s.trim()).ok().map( |dt| dt.timestamp())
}

/// start of the UTC day that contains `epoch_secs`
pub fn utc_day_start_secs (epoch_secs: i64)->i64 {
    epoch_secs - epoch_secs.rem_euclid(86400)
}

pub fn deserialize_duration <'a,D>(deserializer: D) -> Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| serde::de::Error::custom(format!("{:?}",e)))
    })
}

/// for `Option<Duration>` fields that also need `#[serde(default)]`
pub fn deserialize_optional_duration <'a,D>(deserializer: D) -> Result<Option<Duration>,D::Error>
    where D: Deserializer<'a>
{
    Option::<String>::deserialize(deserializer).and_then( |opt| {
        match opt {
            Some(string) => parse(string.as_str())
                .map( Some)
                .map_err( |e| serde::de::Error::custom(format!("{:?}",e))),
            None => Ok(None)
        }
    })
}

pub fn serialize_duration<S: Serializer> (dur: &Duration, s: S) -> Result<S::Ok, S::Error>  {
    let dfm = format!("{}s", dur.as_secs_f64());
    s.serialize_str(&dfm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso8601_round_trip() {
        let t = 1_700_000_123;
        let s = iso8601_secs(t);
        assert_eq!( s, "2023-11-14T22:15:23Z");
        assert_eq!( parse_iso8601_secs(&s), Some(t));
    }

    #[test]
    fn test_day_start() {
        assert_eq!( utc_day_start_secs( 86400 * 3 + 17), 86400 * 3);
        assert_eq!( utc_day_start_secs( -1), -86400);
    }

    #[test]
    fn test_epoch_millis_arithmetic() {
        let t = EpochMillis::from_secs(100);
        assert_eq!( t.saturating_sub( secs(40)).secs(), 60);
        assert_eq!( t.saturating_add( minutes(1)).millis(), 160_000);
        assert_eq!( t.duration_since( EpochMillis::from_secs(90)), secs(10));
        assert_eq!( t.duration_since( EpochMillis::from_secs(200)), Duration::ZERO);
    }
}
