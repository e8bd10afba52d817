//! Outbound request rewriting.
//!
//! # Responsibilities
//! - Point the request at the selected upstream (scheme/authority)
//! - Keep the front-end host in the `Host` header
//! - Strip hop-by-hop headers and record the client in `X-Forwarded-For`

use std::net::IpAddr;

use axum::http::{
    header,
    request::Parts,
    uri::Scheme,
    HeaderMap, HeaderName, HeaderValue, Uri,
};

use crate::registry::strip_scheme;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that apply to a single connection and must not be forwarded.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Rewrite the request target to `http://<upstream><path>?<query>`.
pub fn direct(parts: &mut Parts, host: &str, upstream: &str) -> Result<(), axum::http::Error> {
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{}?{}", parts.uri.path(), query),
        None => parts.uri.path().to_string(),
    };

    parts.uri = Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(strip_scheme(upstream))
        .path_and_query(path_and_query)
        .build()?;
    parts.headers.insert(header::HOST, HeaderValue::from_str(host)?);
    Ok(())
}

/// The origin-form (`/path?query`) of a URI, as sent on an HTTP/1.1 request line.
pub fn origin_form(uri: &Uri) -> Uri {
    uri.path_and_query()
        .cloned()
        .map(Uri::from)
        .unwrap_or_else(|| Uri::from_static("/"))
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn remove_hop_by_hop_headers(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

/// Append the client address to `X-Forwarded-For`, joining any prior values.
pub fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        client.to_string()
    } else {
        format!("{}, {}", prior.join(", "), client)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str) -> Parts {
        Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_direct() {
        let mut p = parts("/api/v1?x=1");
        direct(&mut p, "localhost:9999", "http://127.0.0.1:7777").unwrap();

        assert_eq!(p.uri, "http://127.0.0.1:7777/api/v1?x=1");
        assert_eq!(p.headers[header::HOST], "localhost:9999");
        assert_eq!(origin_form(&p.uri), "/api/v1?x=1");
    }

    #[test]
    fn test_direct_absolute_form() {
        let mut p = parts("http://localhost:9999");
        direct(&mut p, "localhost:9999", "127.0.0.1:7778").unwrap();
        assert_eq!(p.uri, "http://127.0.0.1:7778/");
    }

    #[test]
    fn test_direct_invalid_upstream() {
        let mut p = parts("/");
        assert!(direct(&mut p, "localhost:9999", "bad host:1").is_err());
    }

    #[test]
    fn test_remove_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-custom"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-custom", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        remove_hop_by_hop_headers(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::ACCEPT], "*/*");
    }

    #[test]
    fn test_forwarded_for() {
        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, "10.0.0.1".parse().unwrap());
        assert_eq!(headers[&X_FORWARDED_FOR], "10.0.0.1");

        append_forwarded_for(&mut headers, "10.0.0.2".parse().unwrap());
        assert_eq!(headers[&X_FORWARDED_FOR], "10.0.0.1, 10.0.0.2");
    }
}
