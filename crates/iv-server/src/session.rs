//! Signed admin session cookies.
//!
//! Cookie value: `base64(json(Session)) "." hex(hmac_sha256(secret, base64 part))`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Session data stored in the cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    /// Unix seconds.
    pub expires_at: i64,
}

impl Session {
    pub fn new(email: &str, timeout_hours: u64) -> Self {
        Self {
            email: email.to_string(),
            expires_at: chrono::Utc::now()
                .timestamp()
                .saturating_add(ttl_secs(timeout_hours)),
        }
    }

    pub fn is_valid(&self) -> bool {
        chrono::Utc::now().timestamp() < self.expires_at
    }

    /// Encode and sign.
    pub fn encode(&self, secret: &str) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = sign(secret, payload.as_bytes());
        format!("{payload}.{signature}")
    }

    /// Verify the signature and decode. Expired sessions are rejected.
    pub fn decode(value: &str, secret: &str) -> Option<Self> {
        let (payload, signature) = value.rsplit_once('.')?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(payload.as_bytes());
        let expected = hex::decode(signature).ok()?;
        mac.verify_slice(&expected).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let session: Session = serde_json::from_slice(&json).ok()?;
        session.is_valid().then_some(session)
    }
}

/// Session lifetime in seconds, saturating at `i64::MAX`.
pub fn ttl_secs(timeout_hours: u64) -> i64 {
    i64::try_from(timeout_hours.saturating_mul(3600)).unwrap_or(i64::MAX)
}

fn sign(secret: &str, payload: &[u8]) -> String {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

/// Generate a random cookie secret.
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
