//! Newly reported threats carried by `threat_update` messages.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::severity::Severity;
use super::wire::null_as_default;

/// A threat reported in `threat_update.data.new_threats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Threat {
    pub id: Option<String>,
    #[serde(alias = "threat_type", deserialize_with = "null_as_default")]
    pub attack: String,
    #[serde(deserialize_with = "null_as_default")]
    pub severity: Severity,
    #[serde(alias = "source_ip", deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl Threat {
    /// Server id, or `threat-<8 hex>` derived from the source and attack.
    pub fn threat_id(&self) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                let digest = self.digest();
                format!("threat-{}", hex::encode(&digest[..4]))
            }
        }
    }

    /// Reported coordinates, or a stable placement derived from the source
    /// so the same origin always lands at the same point.
    pub fn geo_point(&self) -> GeoPoint {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            if lat.is_finite() && lon.is_finite() {
                return GeoPoint {
                    lat: lat.clamp(-90.0, 90.0),
                    lon: wrap_longitude(lon),
                };
            }
        }

        let digest = Sha256::digest(self.source.as_bytes());
        let lat_bits = u16::from_be_bytes([digest[0], digest[1]]) as f64 / u16::MAX as f64;
        let lon_bits = u16::from_be_bytes([digest[2], digest[3]]) as f64 / u16::MAX as f64;
        GeoPoint {
            // Keep synthesized points off the poles.
            lat: -60.0 + lat_bits * 130.0,
            lon: -180.0 + lon_bits * 360.0,
        }
    }

    /// Short human label for notifications.
    pub fn headline(&self) -> String {
        let attack = if self.attack.is_empty() {
            "Unknown threat"
        } else {
            self.attack.as_str()
        };
        if self.source.is_empty() {
            format!("{} ({})", attack, self.severity)
        } else {
            format!("{} from {} ({})", attack, self.source, self.severity)
        }
    }

    fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.source.as_bytes());
        hasher.update(b"|");
        hasher.update(self.attack.as_bytes());
        hasher.update(b"|");
        hasher.update(self.description.as_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}
