//! OAuth 1.0a request signing.
//!
//! # Design
//! Signing is a capability behind the `Signer` trait so tests and hosts with
//! their own OAuth stack can swap it out. `OAuth1Signer` implements the
//! HMAC-SHA1 method of RFC 5849 and writes the result into an
//! `Authorization: OAuth ...` header. Query parameters and form-encoded body
//! parameters take part in the signature; JSON bodies do not.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sha1::Sha1;
use url::Url;

use crate::error::SigningError;
use crate::http::HttpRequest;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay literal, everything else is escaped.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// Consumer key and secret, plus the optional access token pair.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_secret: Option<String>,
}

impl Credentials {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: None,
            token_secret: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, token_secret: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self.token_secret = Some(token_secret.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Signs a request in place.
pub trait Signer: Send + Sync {
    fn sign(&self, request: &mut HttpRequest, credentials: &Credentials) -> Result<(), SigningError>;
}

/// HMAC-SHA1 OAuth 1.0a signer.
#[derive(Debug, Clone, Default)]
pub struct OAuth1Signer;

impl Signer for OAuth1Signer {
    fn sign(&self, request: &mut HttpRequest, credentials: &Credentials) -> Result<(), SigningError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SigningError::ExpectationFailed(format!("system clock before epoch: {e}")))?
            .as_secs();
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        self.sign_at(request, credentials, &nonce, timestamp)
    }
}

impl OAuth1Signer {
    /// Sign with a caller-chosen nonce and timestamp.
    pub fn sign_at(
        &self,
        request: &mut HttpRequest,
        credentials: &Credentials,
        nonce: &str,
        timestamp: u64,
    ) -> Result<(), SigningError> {
        if credentials.consumer_key.is_empty() {
            return Err(SigningError::ExpectationFailed("consumer key is empty".to_string()));
        }
        if credentials.consumer_secret.is_empty() {
            return Err(SigningError::ExpectationFailed("consumer secret is empty".to_string()));
        }

        let mut oauth_params = vec![
            ("oauth_consumer_key", credentials.consumer_key.clone()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp", timestamp.to_string()),
        ];
        if let Some(token) = &credentials.token {
            oauth_params.push(("oauth_token", token.clone()));
        }
        oauth_params.push(("oauth_version", OAUTH_VERSION.to_string()));

        let base = signature_base_string(request, &oauth_params)?;
        let signature = hmac_sha1(credentials, &base)?;
        oauth_params.push(("oauth_signature", signature));

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        request.set_header("Authorization", format!("OAuth {header}"));
        Ok(())
    }
}

/// Build the RFC 5849 signature base string for `request`.
pub fn signature_base_string(
    request: &HttpRequest,
    oauth_params: &[(&str, String)],
) -> Result<String, SigningError> {
    let url = Url::parse(&request.url)
        .map_err(|e| SigningError::ExpectationFailed(format!("malformed URL {}: {e}", request.url)))?;
    let host = url
        .host_str()
        .ok_or_else(|| SigningError::ExpectationFailed(format!("URL has no host: {}", request.url)))?;
    let base_url = match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    };

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .collect();

    let form_body = request
        .header("Content-Type")
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if let (true, Some(body)) = (form_body, &request.body) {
        params.extend(
            url::form_urlencoded::parse(body).map(|(k, v)| (encode(&k), encode(&v))),
        );
    }

    params.extend(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))));
    params.sort();

    let normalized = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        request.method.as_str(),
        encode(&base_url),
        encode(&normalized)
    ))
}

fn hmac_sha1(credentials: &Credentials, base: &str) -> Result<String, SigningError> {
    let key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(credentials.token_secret.as_deref().unwrap_or_default())
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| SigningError::MessageSigner(e.to_string()))?;
    mac.update(base.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn photos_credentials() -> Credentials {
        Credentials::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44")
            .with_token("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00")
    }

    fn photos_request() -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Get,
            "http://photos.example.net/photos?file=vacation.jpg&size=original",
        )
    }

    fn oauth_params(credentials: &Credentials, nonce: &str, timestamp: u64) -> Vec<(&'static str, String)> {
        vec![
            ("oauth_consumer_key", credentials.consumer_key.clone()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_token", credentials.token.clone().unwrap()),
            ("oauth_version", OAUTH_VERSION.to_string()),
        ]
    }

    #[test]
    fn base_string_for_query_parameters() {
        let creds = photos_credentials();
        let base = signature_base_string(
            &photos_request(),
            &oauth_params(&creds, "kllo9940pd9333jh", 1191242096),
        )
        .unwrap();
        assert_eq!(
            base,
            "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg\
             %26oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3Dkllo9940pd9333jh\
             %26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1191242096\
             %26oauth_token%3Dnnch734d00sl2jdk%26oauth_version%3D1.0%26size%3Doriginal"
        );
    }

    #[test]
    fn signs_query_request() {
        let mut req = photos_request();
        OAuth1Signer
            .sign_at(&mut req, &photos_credentials(), "kllo9940pd9333jh", 1191242096)
            .unwrap();
        let auth = req.header("Authorization").unwrap();
        assert!(auth.starts_with("OAuth "));
        assert!(auth.contains("oauth_signature=\"tR3%2BTy81lMeYAr%2FFid0kMTYa%2FWM%3D\""));
        assert!(auth.contains("oauth_token=\"nnch734d00sl2jdk\""));
    }

    #[test]
    fn form_body_parameters_are_signed() {
        let creds = Credentials::new("xvz1evFS4wEEPTGEFPHBog", "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw")
            .with_token(
                "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
                "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
            );
        let mut req = HttpRequest::new(
            HttpMethod::Post,
            "https://api.twitter.com/1.1/statuses/update.json?include_entities=true",
        );
        req.set_header("Content-Type", "application/x-www-form-urlencoded");
        req.body = Some(
            b"status=Hello%20Ladies%20%2b%20Gentlemen%2c%20a%20signed%20OAuth%20request%21".to_vec(),
        );
        OAuth1Signer
            .sign_at(&mut req, &creds, "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg", 1318622958)
            .unwrap();
        assert!(req
            .header("Authorization")
            .unwrap()
            .contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
    }

    #[test]
    fn json_body_is_not_signed() {
        let creds = photos_credentials();
        let params = oauth_params(&creds, "n", 1);
        let mut plain = photos_request();
        plain.method = HttpMethod::Post;
        let mut with_body = plain.clone();
        with_body.set_header("Content-Type", "application/json");
        with_body.body = Some(b"{\"a\":1}".to_vec());
        assert_eq!(
            signature_base_string(&plain, &params).unwrap(),
            signature_base_string(&with_body, &params).unwrap()
        );
    }

    #[test]
    fn default_port_is_dropped_and_custom_port_kept() {
        let creds = photos_credentials();
        let params = oauth_params(&creds, "n", 1);
        let default_port = HttpRequest::new(HttpMethod::Get, "HTTP://Example.COM:80/r");
        let custom_port = HttpRequest::new(HttpMethod::Get, "http://example.com:9080/r");
        assert!(signature_base_string(&default_port, &params)
            .unwrap()
            .starts_with("GET&http%3A%2F%2Fexample.com%2Fr&"));
        assert!(signature_base_string(&custom_port, &params)
            .unwrap()
            .starts_with("GET&http%3A%2F%2Fexample.com%3A9080%2Fr&"));
    }

    #[test]
    fn malformed_url_is_an_expectation_failure() {
        let mut req = HttpRequest::new(HttpMethod::Get, "not a url");
        let err = OAuth1Signer.sign(&mut req, &photos_credentials()).unwrap_err();
        assert!(matches!(err, SigningError::ExpectationFailed(_)));
        assert!(req.header("Authorization").is_none());
    }

    #[test]
    fn empty_consumer_key_is_rejected() {
        let mut req = photos_request();
        let err = OAuth1Signer.sign(&mut req, &Credentials::new("", "s")).unwrap_err();
        assert!(matches!(err, SigningError::ExpectationFailed(_)));
    }

    #[test]
    fn empty_consumer_secret_is_rejected() {
        let mut req = photos_request();
        let err = OAuth1Signer.sign(&mut req, &Credentials::new("k", "")).unwrap_err();
        assert!(matches!(err, SigningError::ExpectationFailed(msg) if msg.contains("secret")));
        assert!(req.header("Authorization").is_none());
    }

    #[test]
    fn fresh_nonce_per_signature() {
        let creds = Credentials::new("k", "s");
        let mut a = photos_request();
        let mut b = photos_request();
        OAuth1Signer.sign(&mut a, &creds).unwrap();
        OAuth1Signer.sign(&mut b, &creds).unwrap();
        assert_ne!(a.header("Authorization"), b.header("Authorization"));
        assert!(!a.header("Authorization").unwrap().contains("oauth_token"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let shown = format!("{:?}", photos_credentials());
        assert!(!shown.contains("kd94hf93k423kf44"));
        assert!(!shown.contains("pfkkdhi9sl3r4s00"));
        assert!(shown.contains("dpf43f3p2l4k3l03"));
    }
}
