use axum::body;
use serde::de::DeserializeOwned;

/// Extracts the raw bytes from an HTTP response body and deserializes them into the
/// requested type. Panics and fails the test if either step goes wrong.
pub async fn deserialize_body<T: DeserializeOwned>(response_body: body::Body) -> T {
    let bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("Could not read data from response body!");

    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        panic!(
            "Could not parse body content into data structure! Error: {}, Received body: {:?}",
            err, bytes
        )
    })
}
