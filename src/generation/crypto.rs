//! Cryptographic material for `openssl` rules.
//!
//! Generation goes through the [`MaterialProvider`] trait, keyed by algorithm
//! name, so rule dispatch can be tested without real key generation.
//! [`BuiltinMaterialProvider`] implements every supported algorithm with
//! RustCrypto crates and draws fresh randomness from the OS on every call.
//!
//! # Algorithms
//!
//! | name      | arguments (default)                                              | output |
//! |-----------|------------------------------------------------------------------|--------|
//! | `rsa`     | `key_size` (2048), `encoding` `pem`/`der_b64` (`pem`)            | PKCS#1 `RSA PRIVATE KEY` |
//! | `ec`      | `curve` `secp256r1`/`secp384r1`/`secp521r1`/`secp256k1` (`secp256r1`), `encoding` `pem`/`der_b64` (`pem`) | SEC1 `EC PRIVATE KEY` |
//! | `ed25519` | `encoding` `pem`/`raw_b64` (`pem`)                               | PKCS#8 `PRIVATE KEY` |
//! | `x25519`  | `encoding` `pem`/`raw_b64` (`raw_b64`)                           | PKCS#8 `PRIVATE KEY` |
//! | `fernet`  | none                                                             | 32 bytes, URL-safe base64 |
//! | `random`  | `length` (32), `encoding` `hex`/`base64`/`base64url` (`hex`)     | random bytes |

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use indexmap::IndexMap;
use pkcs8::der::asn1::OctetStringRef;
use pkcs8::der::{Encode, EncodePem};
use pkcs8::{AlgorithmIdentifierRef, EncodePrivateKey, LineEnding, ObjectIdentifier, PrivateKeyInfo};
use rand::RngCore;
use rand::rngs::OsRng;
use serde_yaml::Value;

use crate::core::EnvgenError;

/// Rendered arguments of a crypto rule
pub type CryptoArgs = IndexMap<String, Value>;

/// Algorithm names implemented by [`BuiltinMaterialProvider`]
pub const SUPPORTED_ALGORITHMS: &[&str] = &["rsa", "ec", "ed25519", "x25519", "fernet", "random"];

const EC_CURVES: &[&str] = &["secp256r1", "secp384r1", "secp521r1", "secp256k1"];
const PEM_OR_DER: &[&str] = &["pem", "der_b64"];
const PEM_OR_RAW: &[&str] = &["pem", "raw_b64"];
const RANDOM_ENCODINGS: &[&str] = &["hex", "base64", "base64url"];

const MIN_RSA_KEY_SIZE: u64 = 1024;
const MAX_RSA_KEY_SIZE: u64 = 16384;

/// Upper bound on `random` output, in bytes before encoding
const MAX_RANDOM_LENGTH: u64 = 65536;

/// id-X25519 (RFC 8410)
const X25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.110");

/// Produces cryptographic material for a named algorithm
pub trait MaterialProvider {
    /// Generate material for `algorithm` using `args`
    ///
    /// # Errors
    ///
    /// Returns [`EnvgenError::UnsupportedAlgorithm`] for unknown algorithm names
    /// and [`EnvgenError::CryptoGeneration`] for invalid arguments.
    fn generate(&self, algorithm: &str, args: &CryptoArgs) -> Result<String, EnvgenError>;

    /// Names of the algorithms this provider implements
    fn supported(&self) -> Vec<String>;
}

/// Default provider backed by RustCrypto
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMaterialProvider;

impl MaterialProvider for BuiltinMaterialProvider {
    fn generate(&self, algorithm: &str, args: &CryptoArgs) -> Result<String, EnvgenError> {
        tracing::debug!(target: "crypto", "Generating {algorithm} material");
        match algorithm {
            "rsa" => rsa_key(args),
            "ec" => ec_key(args),
            "ed25519" => ed25519_key(args),
            "x25519" => x25519_key(args),
            "fernet" => Ok(URL_SAFE.encode(random_bytes(32))),
            "random" => random_value(args),
            other => Err(EnvgenError::UnsupportedAlgorithm {
                name: other.to_string(),
                supported: self.supported(),
            }),
        }
    }

    fn supported(&self) -> Vec<String> {
        SUPPORTED_ALGORITHMS.iter().map(|s| (*s).to_string()).collect()
    }
}

fn crypto_error(reason: impl Into<String>) -> EnvgenError {
    EnvgenError::CryptoGeneration {
        reason: reason.into(),
    }
}

/// Read a string choice, checking it against the allowed values
fn choice_arg<'a>(
    args: &'a CryptoArgs,
    key: &str,
    default: &'a str,
    allowed: &[&str],
    what: &str,
) -> Result<&'a str, EnvgenError> {
    let value = match args.get(key) {
        None | Some(Value::Null) => default,
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(crypto_error(format!("Invalid {what} {other:?}: expected a string")));
        }
    };

    if allowed.contains(&value) {
        Ok(value)
    } else {
        Err(crypto_error(format!(
            "Unsupported {what} '{value}'. Supported: {}",
            allowed.join(", ")
        )))
    }
}

/// Read a non-negative integer, accepting numeric strings from rendered templates
fn integer_arg(args: &CryptoArgs, key: &str, default: u64) -> Result<u64, EnvgenError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
            crypto_error(format!("Invalid value for '{key}': {n} is not a non-negative integer"))
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().map_err(|_| {
            crypto_error(format!("Invalid value for '{key}': '{s}' is not a non-negative integer"))
        }),
        Some(other) => {
            Err(crypto_error(format!("Invalid value for '{key}': {other:?} is not an integer")))
        }
    }
}

fn random_bytes(length: usize) -> Vec<u8> {
    let mut buf = vec![0u8; length];
    OsRng.fill_bytes(&mut buf);
    buf
}

fn rsa_key(args: &CryptoArgs) -> Result<String, EnvgenError> {
    use rsa::RsaPrivateKey;
    use rsa::pkcs1::EncodeRsaPrivateKey;

    let key_size = integer_arg(args, "key_size", 2048)?;
    let encoding = choice_arg(args, "encoding", "pem", PEM_OR_DER, "RSA encoding")?;
    if !(MIN_RSA_KEY_SIZE..=MAX_RSA_KEY_SIZE).contains(&key_size) {
        return Err(crypto_error(format!(
            "Unsupported RSA key_size {key_size}: must be between {MIN_RSA_KEY_SIZE} and {MAX_RSA_KEY_SIZE}"
        )));
    }
    let bits = usize::try_from(key_size)
        .map_err(|_| crypto_error(format!("Unsupported RSA key_size {key_size}")))?;

    let key = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| crypto_error(format!("RSA key generation failed: {e}")))?;

    if encoding == "pem" {
        let pem = key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| crypto_error(format!("RSA PEM encoding failed: {e}")))?;
        Ok(pem.as_str().to_owned())
    } else {
        let der = key
            .to_pkcs1_der()
            .map_err(|e| crypto_error(format!("RSA DER encoding failed: {e}")))?;
        Ok(STANDARD.encode(der.as_bytes()))
    }
}

/// SEC1 encode a freshly generated key for one curve crate
macro_rules! sec1_key {
    ($curve:ident, $encoding:expr) => {{
        let key = $curve::SecretKey::random(&mut OsRng);
        if $encoding == "pem" {
            key.to_sec1_pem(LineEnding::LF)
                .map(|pem| pem.as_str().to_owned())
                .map_err(|e| crypto_error(format!("EC PEM encoding failed: {e}")))
        } else {
            key.to_sec1_der()
                .map(|der| STANDARD.encode(der.as_slice()))
                .map_err(|e| crypto_error(format!("EC DER encoding failed: {e}")))
        }
    }};
}

fn ec_key(args: &CryptoArgs) -> Result<String, EnvgenError> {
    let curve = choice_arg(args, "curve", "secp256r1", EC_CURVES, "EC curve")?;
    let encoding = choice_arg(args, "encoding", "pem", PEM_OR_DER, "EC encoding")?;

    match curve {
        "secp256r1" => sec1_key!(p256, encoding),
        "secp384r1" => sec1_key!(p384, encoding),
        "secp521r1" => sec1_key!(p521, encoding),
        "secp256k1" => sec1_key!(k256, encoding),
        other => Err(crypto_error(format!(
            "Unsupported EC curve '{other}'. Supported: {}",
            EC_CURVES.join(", ")
        ))),
    }
}

fn ed25519_key(args: &CryptoArgs) -> Result<String, EnvgenError> {
    let encoding = choice_arg(args, "encoding", "pem", PEM_OR_RAW, "Ed25519 encoding")?;
    let key = ed25519_dalek::SigningKey::generate(&mut OsRng);

    if encoding == "pem" {
        let pem = key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| crypto_error(format!("Ed25519 PEM encoding failed: {e}")))?;
        Ok(pem.as_str().to_owned())
    } else {
        Ok(STANDARD.encode(key.to_bytes()))
    }
}

fn x25519_key(args: &CryptoArgs) -> Result<String, EnvgenError> {
    let encoding = choice_arg(args, "encoding", "raw_b64", PEM_OR_RAW, "X25519 encoding")?;
    let secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
    let raw = secret.to_bytes();

    if encoding == "pem" {
        // CurvePrivateKey ::= OCTET STRING, nested in the PKCS#8 privateKey field
        let curve_key = OctetStringRef::new(&raw)
            .and_then(|octets| octets.to_der())
            .map_err(|e| crypto_error(format!("X25519 key encoding failed: {e}")))?;
        let algorithm = AlgorithmIdentifierRef {
            oid: X25519_OID,
            parameters: None,
        };
        PrivateKeyInfo::new(algorithm, &curve_key)
            .to_pem(LineEnding::LF)
            .map_err(|e| crypto_error(format!("X25519 PEM encoding failed: {e}")))
    } else {
        Ok(STANDARD.encode(raw))
    }
}

fn random_value(args: &CryptoArgs) -> Result<String, EnvgenError> {
    let length = integer_arg(args, "length", 32)?;
    let encoding = choice_arg(args, "encoding", "hex", RANDOM_ENCODINGS, "random encoding")?;
    if length > MAX_RANDOM_LENGTH {
        return Err(crypto_error(format!(
            "Unsupported random length {length}: must be at most {MAX_RANDOM_LENGTH}"
        )));
    }
    let length = usize::try_from(length)
        .map_err(|_| crypto_error(format!("Unsupported random length {length}")))?;

    let raw = random_bytes(length);
    Ok(match encoding {
        "base64" => STANDARD.encode(raw),
        "base64url" => URL_SAFE.encode(raw),
        _ => hex::encode(raw),
    })
}
