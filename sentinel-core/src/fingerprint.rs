// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stable content fingerprints, used by the knowledge graph's
//! signature-based similarity search (§4.8) and anywhere else two records
//! need a short, deterministic identity derived from their content rather
//! than an assigned ID.

/// Hashes `parts` (joined with `\u{1f}`, a separator that cannot appear in
/// any of the plain-text fields this is used on) with BLAKE3 and returns
/// the first 16 hex characters -- 64 bits, enough to make accidental
/// collisions between unrelated anomalies negligible while keeping graph
/// signatures short enough to read in a log line.
pub fn fingerprint(parts: &[&str]) -> String {
    let joined = parts.join("\u{1f}");
    let hash = blake3::hash(joined.as_bytes());
    hex::encode(&hash.as_bytes()[..8])
}

/// A magnitude bucketed to one significant figure of its base-10
/// exponent, so that fingerprints treat "close enough" values (e.g. two
/// Z-scores of 4.1 and 4.3) as the same signature bucket rather than
/// differing on floating-point noise.
pub fn bucket_magnitude(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    let exponent = magnitude.log10().floor();
    let scale = 10f64.powf(exponent);
    let bucket = (magnitude / scale).round() * scale;
    format!("{:.3}", bucket.copysign(value))
}

/// Fingerprint of an anomaly's identity for graph similarity: source,
/// metric, optional symbol, and a magnitude bucket. Detection methods are
/// deliberately excluded -- two detectors disagreeing on *how* they saw
/// the same event should still be recognized as the same signature.
pub fn anomaly_signature(source: &str, metric: &str, symbol: Option<&str>, value: f64) -> String {
    let symbol = symbol.unwrap_or("");
    let bucket = bucket_magnitude(value);
    fingerprint(&[source, metric, symbol, &bucket])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint(&["cryptocurrency", "price", "BTC"]);
        let b = fingerprint(&["cryptocurrency", "price", "BTC"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn fingerprint_distinguishes_field_boundaries() {
        // Without a separator, ("ab", "c") and ("a", "bc") would collide.
        let a = fingerprint(&["ab", "c"]);
        let b = fingerprint(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn bucket_magnitude_groups_close_values() {
        assert_eq!(bucket_magnitude(4.1), bucket_magnitude(4.3));
        assert_ne!(bucket_magnitude(4.1), bucket_magnitude(40.0));
    }

    #[test]
    fn anomaly_signature_ignores_detection_method() {
        let a = anomaly_signature("cryptocurrency", "price", Some("BTC"), 5.0);
        let b = anomaly_signature("cryptocurrency", "price", Some("BTC"), 5.0);
        assert_eq!(a, b);
    }
}
