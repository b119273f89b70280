use std::io::Read;

use reqwest::blocking::Client;

use super::error::{Result, ZooError};

/// An answered GET request whose body has not been read yet.
pub struct RemoteResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for RemoteResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Issues streaming GET requests on behalf of the downloader.
pub trait Transport {
    fn get(&self, url: &str) -> Result<RemoteResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(ZooError::HttpClient)?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<RemoteResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| ZooError::Transport {
                url: url.to_string(),
                source: Box::new(source),
            })?;
        Ok(RemoteResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}
