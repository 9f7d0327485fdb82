//! EIP-191 Message Signing
//!
//! Keccak-256 hashing, `personal_sign` digests, address derivation and
//! signature recovery over secp256k1.

use regex::Regex;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};
use std::sync::OnceLock;

use super::WalletError;

/// Length of an encoded signature: r (32) || s (32) || v (1)
pub const SIGNATURE_LEN: usize = 65;

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Digest signed by `personal_sign`: the message prefixed with its byte length
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Lowercase `0x` address of a public key (last 20 bytes of the key hash)
pub fn address_from_public_key(public_key: &PublicKey) -> String {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Parse a hex private key, with or without `0x`
pub fn parse_secret_key(hex_key: &str) -> Result<SecretKey, WalletError> {
    let bytes = hex::decode(strip_hex_prefix(hex_key.trim()))
        .map_err(|e| WalletError::InvalidKey(e.to_string()))?;
    SecretKey::from_slice(&bytes).map_err(|e| WalletError::InvalidKey(e.to_string()))
}

/// Sign a message the way `personal_sign` does; returns `0x`-prefixed hex
pub fn sign_personal_message(secret_key: &SecretKey, message: &str) -> String {
    let secp = Secp256k1::signing_only();
    let digest = Message::from_digest(personal_message_hash(message));
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&digest, secret_key)
        .serialize_compact();

    let mut encoded = [0u8; SIGNATURE_LEN];
    encoded[..64].copy_from_slice(&compact);
    encoded[64] = 27 + recovery_id.to_i32() as u8;
    format!("0x{}", hex::encode(encoded))
}

/// Recover the signer address of a `personal_sign` signature
pub fn recover_personal_signer(message: &str, signature: &str) -> Result<String, WalletError> {
    let bytes = hex::decode(strip_hex_prefix(signature))
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(WalletError::InvalidSignature(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LEN,
            bytes.len()
        )));
    }

    let v = match bytes[64] {
        v @ 27..=28 => v - 27,
        v @ 0..=1 => v,
        v => {
            return Err(WalletError::InvalidSignature(format!(
                "invalid recovery byte {}",
                v
            )))
        }
    };

    let recovery_id = RecoveryId::from_i32(v as i32)
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))?;
    let signature = RecoverableSignature::from_compact(&bytes[..64], recovery_id)
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))?;

    let secp = Secp256k1::verification_only();
    let digest = Message::from_digest(personal_message_hash(message));
    let public_key = secp
        .recover_ecdsa(&digest, &signature)
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))?;

    Ok(address_from_public_key(&public_key))
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid address regex"))
}

/// Validate an address and return its lowercase form
pub fn normalize_address(address: &str) -> Result<String, WalletError> {
    let trimmed = address.trim();
    if address_pattern().is_match(trimmed) {
        Ok(trimmed.to_ascii_lowercase())
    } else {
        Err(WalletError::InvalidAddress(address.to_string()))
    }
}

/// Addresses compare case-insensitively (checksum casing is cosmetic)
pub fn same_address(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Shorten an address for display: `0xABCD…1234`
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
