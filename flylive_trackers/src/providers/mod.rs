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

//! the [`TrackerAdapter`] implementations, one per external tracking service

use std::sync::Arc;
use flylive_track::Provider;

use crate::{TrackerAdapter, config::{LiveConfig, ProviderSettings}};

pub mod inreach;
pub mod spot;
pub mod skylines;
pub mod flymaster;
pub mod flyme;

pub use inreach::InreachAdapter;
pub use spot::SpotAdapter;
pub use skylines::SkylinesAdapter;
pub use flymaster::FlymasterAdapter;
pub use flyme::FlymeAdapter;

pub fn create_adapter (settings: ProviderSettings)->Arc<dyn TrackerAdapter> {
    match settings.provider {
        Provider::Inreach => Arc::new( InreachAdapter::new( settings)),
        Provider::Spot => Arc::new( SpotAdapter::new( settings)),
        Provider::Skylines => Arc::new( SkylinesAdapter::new( settings)),
        Provider::Flymaster => Arc::new( FlymasterAdapter::new( settings)),
        Provider::Flyme => Arc::new( FlymeAdapter::new( settings)),
    }
}

/// adapters for all providers, with settings from `config`. Disabled providers are included (they
/// return empty results)
pub fn create_adapters (config: &LiveConfig)->Vec<Arc<dyn TrackerAdapter>> {
    Provider::ALL.iter().map( |p| create_adapter( config.provider_settings( *p))).collect()
}

/// replace the predefined XML entities
pub(crate) fn xml_unescape (s: &str)->String {
    if !s.contains('&') {
        return s.to_string()
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// query separator for appending to `url`
pub(crate) fn query_sep (url: &str)->char {
    if url.contains('?') { '&' } else { '?' }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_unescape() {
        assert_eq!( xml_unescape("fish &amp; chips &lt;3"), "fish & chips <3");
        assert_eq!( xml_unescape("&amp;lt;"), "&lt;");
        assert_eq!( xml_unescape("plain"), "plain");
    }
}
