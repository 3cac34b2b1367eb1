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

//! the HTTP abstraction used by tracker adapters. Adapters only see [`HttpFetch`] so that tests
//! can inject canned provider responses (or failures) without network access

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT}};

use crate::define_error;

define_error!{ pub NetError = 
    HttpError(#[from] reqwest::Error) : "http error: {0}",
    StatusError(u16,String) : "response status {0} for {1}",
    OpFailed(String) : "operation failed: {0}"
}

pub type Result<T> = std::result::Result<T, NetError>;

pub const DEFAULT_USER_AGENT: &str = "flylive-trackers/0.1";

/// async GET retrieval of text payloads. Any response status other than 200 has to be reported as
/// [`NetError::StatusError`] so that callers can treat it as a whole-request failure
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_text (&self, url: &str, headers: &[(&str,&str)])->Result<String>;
}

/// the production [`HttpFetch`] based on a shared reqwest [`Client`]
#[derive(Clone)]
pub struct ReqwestFetch {
    client: Client
}

impl ReqwestFetch {
    pub fn new (request_timeout: Duration)->Result<Self> {
        let client = Client::builder()
            .timeout( request_timeout)
            .user_agent( DEFAULT_USER_AGENT)
            .build()?;
        Ok( ReqwestFetch{ client } )
    }

    pub fn from_client (client: Client)->Self {
        ReqwestFetch{ client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get_text (&self, url: &str, headers: &[(&str,&str)])->Result<String> {
        let mut req = self.client.get( url);
        if !headers.is_empty() {
            req = req.headers( get_headermap( headers)?);
        }

        let response = req.send().await?;
        match response.status() {
            StatusCode::OK => Ok( response.text().await? ),
            other => Err( NetError::StatusError( other.as_u16(), url.to_string()))
        }
    }
}

pub fn get_headermap (headers: &[(&str,&str)]) -> Result<HeaderMap> {
    let mut hm = HeaderMap::new();
    for (k,v) in headers {
        hm.append( 
            HeaderName::from_bytes( k.as_bytes()).map_err(|e| NetError::OpFailed(e.to_string()))?, 
            HeaderValue::from_str(v).map_err(|e| NetError::OpFailed(e.to_string()))?
        );
    }
    Ok(hm)
}

/// percent-encode a query parameter value
pub fn encode_query_value (s: &str)->String {
    url::form_urlencoded::byte_serialize( s.as_bytes()).collect()
}
