use std::convert::TryInto;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::Request as Reqwest;

use crate::config::representable;
use crate::http_client::HttpClient;
use crate::{Body, ClientConfig, Error, Request, Response, ResponseBody, Result};

/// [`HttpClient`] backed by a blocking reqwest client.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
    client: Client,
    timeout: Option<Duration>,
}

impl ReqwestHttpClient {
    pub fn create(config: ClientConfig) -> Result<ReqwestHttpClient> {
        let timeout = representable(config.timeout);
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(!config.ssl_check)
            .timeout(timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder.build().map_err(Error::transport)?;

        Ok(ReqwestHttpClient { client, timeout })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: Request, timeout: Option<Duration>) -> Result<Response> {
        // reqwest only converts bodies it knows about, so convert with a
        // filler body and swap ours in afterwards
        let (parts, body) = request.into_parts();
        let mut request: Reqwest = http::Request::from_parts(parts, "")
            .try_into()
            .map_err(|e| Error::RequestConstruction(format!("{e}")))?;
        *request.body_mut() = into_reqwest_body(body);
        if let Some(timeout) = representable(timeout) {
            *request.timeout_mut() = Some(timeout);
        }

        let response = self.client.execute(request).map_err(Error::transport)?;

        let mut response_builder = http::Response::builder()
            .version(response.version())
            .status(response.status());

        for (name, value) in response.headers() {
            response_builder = response_builder.header(name, value);
        }

        response_builder
            .body(ResponseBody::new(response))
            .map_err(Error::transport)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

fn into_reqwest_body(body: Body) -> Option<reqwest::blocking::Body> {
    match body.into_bytes() {
        Ok(bytes) if bytes.is_empty() => None,
        Ok(bytes) => Some(bytes.into()),
        Err(streamed) => Some(reqwest::blocking::Body::new(streamed)),
    }
}
