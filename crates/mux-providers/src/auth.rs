//! Per-attempt authentication.
//!
//! Each scheme takes the assembled envelope and attaches this attempt's
//! credential material. The SigV4 signer runs last during envelope assembly
//! because the signature covers every header already present.

use crate::profile::DEFAULT_BEDROCK_REGION;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use mux_core::{MuxError, MuxResult};
use mux_credentials::{ServiceAccountKey, TokenBroker};
use mux_transport::RequestEnvelope;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// API version header value sent with every Anthropic call.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
/// OAuth scope requested for service-account access tokens.
pub const VERTEX_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const SIGV4_ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGV4_SERVICE: &str = "bedrock";

type HmacSha256 = Hmac<Sha256>;

/// Attach a bearer token in the `Authorization` header.
#[must_use]
pub fn bearer(envelope: RequestEnvelope, credential: &SecretString) -> RequestEnvelope {
    envelope.with_header(
        "authorization",
        format!("Bearer {}", credential.expose_secret()),
    )
}

/// Attach the Anthropic key header pair.
#[must_use]
pub fn x_api_key(envelope: RequestEnvelope, credential: &SecretString) -> RequestEnvelope {
    envelope
        .with_header("x-api-key", credential.expose_secret().to_string())
        .with_header("anthropic-version", ANTHROPIC_VERSION)
}

/// Attach the credential as a `key` query parameter.
#[must_use]
pub fn query_key(mut envelope: RequestEnvelope, credential: &SecretString) -> RequestEnvelope {
    envelope
        .url
        .query_pairs_mut()
        .append_pair("key", credential.expose_secret());
    envelope
}

/// Attach a derived bearer token for a service account.
///
/// # Errors
/// Propagates token-minting failures from the broker.
pub async fn service_account(
    envelope: RequestEnvelope,
    key: &ServiceAccountKey,
    broker: &TokenBroker,
) -> MuxResult<RequestEnvelope> {
    let token = broker.access_token(key, VERTEX_SCOPE).await?;
    Ok(envelope.with_header(
        "authorization",
        format!("Bearer {}", token.expose_secret()),
    ))
}

/// A parsed AWS credential entry.
#[derive(Debug, Clone)]
pub struct AwsCredential {
    /// Access key id; appears in the Authorization header verbatim.
    pub key_id: String,
    /// Secret access key.
    pub secret: SecretString,
    /// Signing region.
    pub region: String,
}

impl AwsCredential {
    /// Parse a pool entry of the form `key-id:secret` or
    /// `key-id:secret:region`.
    ///
    /// # Errors
    /// [`MuxError::Configuration`] when either of the first two fields is
    /// missing or blank.
    pub fn parse(raw: &SecretString) -> MuxResult<Self> {
        let mut parts = raw.expose_secret().splitn(3, ':');
        let key_id = parts.next().unwrap_or_default().trim();
        let secret = parts.next().unwrap_or_default().trim();
        let region = parts
            .next()
            .map(str::trim)
            .filter(|region| !region.is_empty())
            .unwrap_or(DEFAULT_BEDROCK_REGION);

        if key_id.is_empty() || secret.is_empty() {
            return Err(MuxError::configuration(
                "Bedrock credential must be `key-id:secret` or `key-id:secret:region`",
            ));
        }
        Ok(Self {
            key_id: key_id.to_string(),
            secret: SecretString::new(secret.to_string()),
            region: region.to_string(),
        })
    }
}

/// Sign the envelope with AWS Signature Version 4.
///
/// # Errors
/// [`MuxError::Configuration`] when the target URL has no host.
pub fn sigv4(envelope: RequestEnvelope, credential: &AwsCredential) -> MuxResult<RequestEnvelope> {
    sign_with_time(envelope, credential, Utc::now())
}

fn sign_with_time(
    mut envelope: RequestEnvelope,
    credential: &AwsCredential,
    now: DateTime<Utc>,
) -> MuxResult<RequestEnvelope> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let host = match (envelope.url.host_str(), envelope.url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => {
            return Err(MuxError::configuration("Bedrock endpoint URL has no host"));
        }
    };
    let payload_hash = hex::encode(sha256_hash(&envelope.body));

    // Every header on the request is signed; the map sorts and dedups
    // names the way the canonical form requires.
    let mut signed: BTreeMap<String, String> = envelope
        .headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .collect();
    signed.insert("host".to_string(), host);
    signed.insert("x-amz-date".to_string(), amz_date.clone());
    signed.insert("x-amz-content-sha256".to_string(), payload_hash.clone());

    let signed_header_names = signed.keys().cloned().collect::<Vec<_>>().join(";");
    let canonical_headers: String = signed
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();
    let canonical_request = format!(
        "POST\n{}\n{}\n{}\n{}\n{}",
        envelope.url.path(),
        envelope.url.query().unwrap_or(""),
        canonical_headers,
        signed_header_names,
        payload_hash,
    );

    let credential_scope = format!(
        "{date_stamp}/{}/{SIGV4_SERVICE}/aws4_request",
        credential.region
    );
    let string_to_sign = format!(
        "{SIGV4_ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
        hex::encode(sha256_hash(canonical_request.as_bytes())),
    );

    let secret = credential.secret.expose_secret();
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, credential.region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, SIGV4_SERVICE.as_bytes())?;
    let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{SIGV4_ALGORITHM} Credential={}/{credential_scope}, \
         SignedHeaders={signed_header_names}, Signature={signature}",
        credential.key_id,
    );

    envelope.headers = signed.into_iter().collect();
    envelope
        .headers
        .push(("authorization".to_string(), authorization));
    Ok(envelope)
}

fn sha256_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> MuxResult<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| MuxError::internal(format!("HMAC key rejected: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}
