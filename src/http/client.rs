use reqwest::{self, Url};
use serde::de::DeserializeOwned;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;

// Shared HTTP client instance.
lazy_static::lazy_static! {
    static ref CLIENT: Arc<reqwest::Client> = Arc::new(reqwest::Client::new());
}

/// Custom error type for HTTP requests.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("HTTP error {1} from {0}. Response body: {2}")]
    HttpError(Url, u16, String),
    #[error("Error deserializing JSON: {0}")]
    JsonError(String),
    #[error("Other error: {0}")]
    Other(String),
}

/// Makes a GET request to `url` and deserializes the JSON body.
pub async fn get<T: DeserializeOwned>(
    mut url: Url,                 // Full request URL, path already encoded.
    params: HashMap<&str, &str>,  // Optional query parameters.
    headers: HashMap<&str, &str>, // Optional header parameters.
    timeout: Option<Duration>,
) -> Result<T, RequestError> {
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }

    let mut req = CLIENT.get(url.as_str());

    for (k, v) in headers {
        req = req.header(k, v);
    }

    if let Some(timeout) = timeout {
        req = req.timeout(timeout);
    }

    let response = req
        .send()
        .await
        .map_err(|e| RequestError::Other(e.to_string()))?;

    // Get the response status code.
    let status = response.status();

    // Handle non-success status codes.
    if !status.is_success() {
        let body = response
            .text()
            .await
            .map_err(|e| RequestError::Other(e.to_string()))?;
        return Err(RequestError::HttpError(url, status.as_u16(), body));
    }

    // Deserialize the JSON response.
    response
        .json()
        .await
        .map_err(|e| RequestError::JsonError(e.to_string()))
}
