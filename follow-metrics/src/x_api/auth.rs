//! Request authorization for the X API.
//!
//! Two schemes are supported: an app-only bearer token, or OAuth 1.0a user
//! context where every request carries an HMAC-SHA1 signature over its
//! method, URL and parameters.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;

use super::error::LookupError;

type HmacSha1 = Hmac<Sha1>;

/// Length of the random nonce sent with each signed request.
const NONCE_LEN: usize = 32;

/// OAuth 1.0a consumer and access-token pair.
#[derive(Clone)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

/// How requests are authorized.
#[derive(Clone)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Authorization: OAuth ...` with a per-request signature
    OAuth1(OAuth1Credentials),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credentials::OAuth1(c) => f.debug_tuple("OAuth1").field(c).finish(),
        }
    }
}

impl Credentials {
    /// Build the `Authorization` header value for a request.
    ///
    /// `url` must be the request URL without its query string; `params` are
    /// the query parameters that will be sent with it.
    pub fn authorization(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, LookupError> {
        match self {
            Credentials::Bearer(token) => Ok(format!("Bearer {token}")),
            Credentials::OAuth1(creds) => {
                let timestamp = chrono::Utc::now().timestamp().to_string();
                creds.authorization_with(method, url, params, &random_nonce(), &timestamp)
            }
        }
    }
}

impl OAuth1Credentials {
    /// OAuth header for a fixed nonce and timestamp.
    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, LookupError> {
        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let signature = self.signature(method, url, params, &oauth_params)?;

        let header_params = oauth_params
            .iter()
            .map(|(k, v)| (*k, *v))
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header_params}"))
    }

    /// Base64 HMAC-SHA1 over the signature base string.
    fn signature(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        oauth_params: &[(&str, &str)],
    ) -> Result<String, LookupError> {
        let mut encoded: Vec<(String, String)> = params
            .iter()
            .chain(oauth_params.iter())
            .map(|(k, v)| (encode(k), encode(v)))
            .collect();
        encoded.sort();

        let param_string = encoded
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            encode(url),
            encode(&param_string)
        );

        let signing_key = format!(
            "{}&{}",
            encode(&self.consumer_secret),
            encode(&self.access_token_secret)
        );

        let Ok(mut mac) = HmacSha1::new_from_slice(signing_key.as_bytes()) else {
            return Err(LookupError::InvalidRequest(
                "cannot build OAuth signing key".to_string(),
            ));
        };
        mac.update(base_string.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - . _ ~`.
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

fn random_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Credentials from the X developer documentation's signing walkthrough.
    fn doc_credentials() -> OAuth1Credentials {
        OAuth1Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        }
    }

    #[test]
    fn signature_matches_documented_example() {
        let header = doc_credentials().authorization_with(
            "POST",
            "https://api.twitter.com/1.1/statuses/update.json",
            &[
                ("include_entities", "true"),
                (
                    "status",
                    "Hello Ladies + Gentlemen, a signed OAuth request!",
                ),
            ],
            "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            "1318622958",
        )
        .unwrap();

        // hCtSmYh+iHYCEqBWrE7C7hYmtUk= percent-encoded
        assert!(
            header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""),
            "{header}"
        );
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_version=\"1.0\""));
    }

    #[test]
    fn bearer_header() {
        let creds = Credentials::Bearer("abc".to_string());
        assert_eq!(
            creds.authorization("GET", "https://x", &[]).unwrap(),
            "Bearer abc"
        );
    }

    #[test]
    fn oauth_nonce_changes_per_request() {
        let creds = Credentials::OAuth1(doc_credentials());
        let a = creds
            .authorization("GET", "https://api.x.com/2/users", &[("ids", "1")])
            .unwrap();
        let b = creds
            .authorization("GET", "https://api.x.com/2/users", &[("ids", "1")])
            .unwrap();
        assert!(a.starts_with("OAuth "));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_secrets_still_sign() {
        let creds = OAuth1Credentials {
            consumer_key: "ck".to_string(),
            consumer_secret: String::new(),
            access_token: "at".to_string(),
            access_token_secret: String::new(),
        };
        let header = creds
            .authorization_with("GET", "https://api.x.com/2/users", &[], "n", "1")
            .unwrap();
        assert!(header.contains("oauth_signature=\""));
    }

    #[test]
    fn encode_is_rfc3986() {
        assert_eq!(encode("a b+c,d~e_f.g-h!"), "a%20b%2Bc%2Cd~e_f.g-h%21");
    }

    #[test]
    fn debug_redacts_secrets() {
        let debug = format!("{:?}", Credentials::OAuth1(doc_credentials()));
        assert!(!debug.contains("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"));
        assert!(!debug.contains("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"));

        let debug = format!("{:?}", Credentials::Bearer("secret-token".to_string()));
        assert!(!debug.contains("secret-token"));
    }
}
