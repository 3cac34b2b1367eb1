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

//! great circle computations on geodetic degrees. We only need distances between consecutive
//! fixes (for speed estimates), hence the spherical (haversine) metric space of `geo` is sufficient

use geo::{Distance, Haversine, Point};

/// haversine distance in meters between two positions given in degrees
pub fn haversine_distance_m (lat1: f64, lon1: f64, lat2: f64, lon2: f64)->f64 {
    Haversine.distance( Point::new( lon1, lat1), Point::new( lon2, lat2))
}

/// average ground speed in km/h for covering `dist_m` in `dt_sec`. Returns None for non-positive time spans
pub fn speed_kmh (dist_m: f64, dt_sec: i64)->Option<f64> {
    if dt_sec > 0 { Some( dist_m * 3.6 / dt_sec as f64) } else { None }
}

/// normalize longitude into [-180,180)
pub fn normalize_lon (lon: f64)->f64 {
    let x = (lon + 180.0).rem_euclid(360.0);
    x - 180.0
}

pub fn is_valid_lat_lon (lat: f64, lon: f64)->bool {
    lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0
}
