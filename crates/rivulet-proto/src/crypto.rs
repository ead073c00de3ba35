//! Device lists and cross-signing material.
//!
//! # Security
//!
//! [`PrivateKeysInfo`] carries private key material. Its `Debug` impl redacts
//! every key so the value can appear in logs and test failures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One of the local account's devices, as listed by the homeserver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device ID.
    pub device_id: String,
    /// Owning user.
    pub user_id: String,
    /// Human readable device name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_name: Option<String>,
    /// Last time the device was seen, in milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_seen_ts: Option<u64>,
    /// Last IP the device was seen from.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_seen_ip: Option<String>,
}

/// Local and cross-signing trust of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceTrustLevel {
    /// Verified through a cross-signing chain.
    pub cross_signing_verified: bool,
    /// Verified manually on this device.
    pub locally_verified: bool,
}

/// A device as known to the crypto store, including its identity keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoDeviceInfo {
    /// Device ID.
    pub device_id: String,
    /// Owning user.
    pub user_id: String,
    /// Supported encryption algorithms.
    pub algorithms: Vec<String>,
    /// Identity keys by key ID (`ed25519:DEVICE`, `curve25519:DEVICE`).
    pub keys: BTreeMap<String, String>,
    /// Trust state.
    pub trust_level: DeviceTrustLevel,
    /// Whether sending keys to this device is blocked.
    pub is_blocked: bool,
}

impl CryptoDeviceInfo {
    /// Verified through either cross-signing or local verification.
    pub fn is_verified(&self) -> bool {
        self.trust_level.cross_signing_verified || self.trust_level.locally_verified
    }

    /// The device's ed25519 fingerprint key.
    pub fn fingerprint(&self) -> Option<&str> {
        self.keys.get(&format!("ed25519:{}", self.device_id)).map(String::as_str)
    }
}

/// Usage of a cross-signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyUsage {
    /// Master key.
    Master,
    /// Signs the owner's devices.
    SelfSigning,
    /// Signs other users' master keys.
    UserSigning,
}

/// A public cross-signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSigningKeyInfo {
    /// Owning user.
    pub user_id: String,
    /// What the key is used for.
    pub usage: KeyUsage,
    /// Unpadded base64 public key.
    pub public_key: String,
    /// Whether the key is trusted by the local account.
    pub trusted: bool,
}

/// Public cross-signing identity of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSigningInfo {
    /// User the keys belong to.
    pub user_id: String,
    /// Published keys.
    pub keys: Vec<CrossSigningKeyInfo>,
    /// Whether the local account trusts this identity.
    pub is_trusted: bool,
}

impl CrossSigningInfo {
    /// The master key, if published.
    pub fn master_key(&self) -> Option<&CrossSigningKeyInfo> {
        self.key(KeyUsage::Master)
    }

    /// The self-signing key, if published.
    pub fn self_signing_key(&self) -> Option<&CrossSigningKeyInfo> {
        self.key(KeyUsage::SelfSigning)
    }

    /// The user-signing key, if published.
    pub fn user_signing_key(&self) -> Option<&CrossSigningKeyInfo> {
        self.key(KeyUsage::UserSigning)
    }

    fn key(&self, usage: KeyUsage) -> Option<&CrossSigningKeyInfo> {
        self.keys.iter().find(|k| k.usage == usage)
    }
}

/// Private cross-signing keys held by the local account.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrivateKeysInfo {
    /// Master private key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub master: Option<String>,
    /// Self-signing private key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub self_signed: Option<String>,
    /// User-signing private key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<String>,
}

impl PrivateKeysInfo {
    /// All three private keys are present.
    pub fn all_known(&self) -> bool {
        self.master.is_some() && self.self_signed.is_some() && self.user.is_some()
    }
}

impl std::fmt::Debug for PrivateKeysInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeysInfo")
            .field("master", &self.master.as_ref().map(|_| "<redacted>"))
            .field("self_signed", &self.self_signed.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
