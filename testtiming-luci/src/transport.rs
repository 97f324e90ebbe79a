//! Blocking HTTP transports.
//!
//! LUCI services speak pRPC: `POST https://<host>/prpc/<service>/<method>`
//! with a JSON body. Responses (and gitiles JSON pages) carry the `)]}'`
//! anti-XSSI prefix, which is stripped before decoding.

use std::io::Read;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{json_err, transport_err, LuciError};

pub const XSSI_PREFIX: &str = ")]}'";

/// Build the agent shared by every client. Transport defaults apply; no
/// request timeout is imposed.
pub fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new().build()
}

pub fn strip_xssi(body: &str) -> &str {
    match body.strip_prefix(XSSI_PREFIX) {
        Some(rest) => rest.trim_start_matches(['\r', '\n']),
        None => body,
    }
}

/// Read a whole response body. `Response::into_string` caps bodies at 10 MB,
/// which a page of 1000 builds can exceed.
pub(crate) fn read_body(method: &str, response: ureq::Response) -> Result<String, LuciError> {
    let mut body = String::new();
    response
        .into_reader()
        .read_to_string(&mut body)
        .map_err(|source| LuciError::Io {
            method: method.to_string(),
            source,
        })?;
    Ok(body)
}

/// Client for one pRPC host.
#[derive(Debug, Clone)]
pub struct PrpcClient {
    agent: ureq::Agent,
    host: String,
}

impl PrpcClient {
    pub fn new(agent: ureq::Agent, host: impl Into<String>) -> Self {
        Self {
            agent,
            host: host.into(),
        }
    }

    pub fn url(&self, service: &str, method: &str) -> String {
        format!("https://{}/prpc/{service}/{method}", self.host)
    }

    pub fn call<Req, Resp>(&self, service: &str, method: &str, request: &Req) -> Result<Resp, LuciError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let name = format!("{service}.{method}");
        let payload = serde_json::to_string(request).map_err(|e| json_err(&name, e))?;
        let response = self
            .agent
            .post(&self.url(service, method))
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_string(&payload)
            .map_err(|e| transport_err(&name, e))?;
        let body = read_body(&name, response)?;
        serde_json::from_str(strip_xssi(&body)).map_err(|e| json_err(&name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_xssi_removes_prefix_and_newline() {
        assert_eq!(strip_xssi(")]}'\n{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_xssi(")]}'{}"), "{}");
        assert_eq!(strip_xssi("{}"), "{}");
    }

    #[test]
    fn prpc_url_layout() {
        let client = PrpcClient::new(agent(), "cr-buildbucket.appspot.com");
        assert_eq!(
            client.url("buildbucket.v2.Builds", "SearchBuilds"),
            "https://cr-buildbucket.appspot.com/prpc/buildbucket.v2.Builds/SearchBuilds"
        );
    }
}
