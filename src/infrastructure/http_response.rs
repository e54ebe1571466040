// HTTP response utilities for JSON envelopes with optional Brotli encoding
use async_compression::tokio::bufread::BrotliEncoder;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Response, StatusCode, header},
};
use serde::Serialize;
use tokio::io::AsyncReadExt;

#[derive(Serialize)]
struct SuccessEnvelope<'a, T: Serialize> {
    #[serde(rename = "Status")]
    status: bool,
    #[serde(rename = "Result")]
    result: &'a T,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    #[serde(rename = "Status")]
    status: bool,
    #[serde(rename = "Error")]
    error: &'a str,
}

/// Whether the client accepts Brotli.
pub fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

async fn brotli(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = BrotliEncoder::new(std::io::Cursor::new(bytes));
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await?;
    Ok(compressed)
}

/// Serialize `body` as JSON, Brotli-compressing it when `compress` is set.
pub async fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    compress: bool,
) -> Result<Response<Body>, StatusCode> {
    let json = serde_json::to_vec(body).map_err(|e| {
        tracing::error!("JSON serialization error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let (body_bytes, content_encoding) = if compress {
        let compressed = brotli(&json).await.map_err(|e| {
            tracing::error!("Brotli compression error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        tracing::debug!("Compressed response: {} -> {} bytes", json.len(), compressed.len());
        (compressed, Some("br"))
    } else {
        (json, None)
    };

    let content_length = HeaderValue::from_str(&body_bytes.len().to_string())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut response_builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, content_length);

    if let Some(encoding) = content_encoding {
        response_builder = response_builder.header(header::CONTENT_ENCODING, encoding);
    }

    response_builder.body(Body::from(body_bytes)).map_err(|e| {
        tracing::error!("Response build error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// `{"Status": true, "Result": ...}`
pub async fn envelope_response<T: Serialize>(result: &T, compress: bool) -> Result<Response<Body>, StatusCode> {
    json_response(
        StatusCode::OK,
        &SuccessEnvelope {
            status: true,
            result,
        },
        compress,
    )
    .await
}

/// `{"Status": false, "Error": ...}`, never compressed.
pub async fn error_response(status: StatusCode, message: &str) -> Result<Response<Body>, StatusCode> {
    json_response(
        status,
        &ErrorEnvelope {
            status: false,
            error: message,
        },
        false,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_compression::tokio::bufread::BrotliDecoder;

    #[test]
    fn test_accepts_brotli() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_brotli(&headers));

        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        assert!(accepts_brotli(&headers));
    }

    #[tokio::test]
    async fn test_envelope_round_trips_through_brotli() {
        let response = envelope_response(&vec![1, 2, 3], true).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mut decoder = BrotliDecoder::new(std::io::Cursor::new(bytes.to_vec()));
        let mut json = Vec::new();
        decoder.read_to_end(&mut json).await.unwrap();

        assert_eq!(json, br#"{"Status":true,"Result":[1,2,3]}"#);
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = error_response(StatusCode::BAD_REQUEST, "machine_id is required").await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"Status":false,"Error":"machine_id is required"}"#);
    }
}
