// evidence.rs — VerificationEvidence: the runtime proof bundle.
//
// Evidence arrives from device and review collaborators as loosely shaped
// JSON. Decoding is deliberately total: a missing block is `None`, and any
// field with the wrong primitive type reads as "not satisfied". The evaluator
// therefore never sees a decode error, only unsatisfied sub-conditions.
//
// Accepted shapes (every block optional):
//
//   {
//     "time":     {"present": true, "windowStart": "...Z", "windowEnd": "...Z"},
//     "location": {"present": true, "inside": true, "distance": 12.5},
//     "photo":    {"present": true,
//                  "validation": {"timeValid": true, "freshnessValid": true,
//                                 "locationValid": false}},
//     "manual":   {"present": true},
//     "partner":  {"reviewed": true, "approved": true}
//   }
//
// A block that exists but omits `present` counts as present. Photo validation
// flags may also sit directly on the photo block.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use quest_spec::SignalKind;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeEvidence {
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationEvidence {
    pub present: bool,
    /// Inside the goal's geofence.
    pub inside: bool,
    /// Metres from the geofence centre, when the device reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoValidation {
    pub time_valid: bool,
    pub freshness_valid: bool,
    pub location_valid: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoEvidence {
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<PhotoValidation>,
}

impl PhotoEvidence {
    pub fn time_valid(&self) -> bool {
        self.validation.is_some_and(|v| v.time_valid)
    }

    pub fn freshness_valid(&self) -> bool {
        self.validation.is_some_and(|v| v.freshness_valid)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ManualEvidence {
    pub present: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PartnerEvidence {
    pub reviewed: bool,
    pub approved: bool,
}

/// Everything a proof submission carries.
///
/// Deserialization goes through [`VerificationEvidence::from_json_lenient`],
/// so `serde_json::from_str` never fails on a well-formed JSON value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Value")]
pub struct VerificationEvidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual: Option<ManualEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<PartnerEvidence>,
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// `present` defaults to true for a block that exists.
fn presence(obj: &Map<String, Value>) -> bool {
    match obj.get("present") {
        None => true,
        Some(v) => v.as_bool().unwrap_or(false),
    }
}

fn instant(obj: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let raw = obj.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn photo_validation(obj: &Map<String, Value>) -> Option<PhotoValidation> {
    let source = match obj.get("validation") {
        Some(Value::Object(v)) => v,
        Some(_) => return None,
        None => obj,
    };
    let keys = ["timeValid", "freshnessValid", "locationValid"];
    if !keys.iter().any(|k| source.contains_key(*k)) {
        return None;
    }
    Some(PhotoValidation {
        time_valid: flag(source, "timeValid"),
        freshness_valid: flag(source, "freshnessValid"),
        location_valid: flag(source, "locationValid"),
    })
}

impl VerificationEvidence {
    /// Decode evidence from any JSON value. Never fails.
    pub fn from_json_lenient(raw: &Value) -> Self {
        let Some(doc) = raw.as_object() else {
            tracing::debug!("evidence is not a JSON object; treating as empty");
            return Self::default();
        };
        let block = |key: &str| doc.get(key).and_then(Value::as_object);

        Self {
            time: block("time").map(|o| TimeEvidence {
                present: presence(o),
                window_start: instant(o, "windowStart"),
                window_end: instant(o, "windowEnd"),
            }),
            location: block("location").map(|o| LocationEvidence {
                present: presence(o),
                inside: flag(o, "inside"),
                distance: o.get("distance").and_then(Value::as_f64),
            }),
            photo: block("photo").map(|o| PhotoEvidence {
                present: presence(o),
                validation: photo_validation(o),
            }),
            manual: block("manual").map(|o| ManualEvidence {
                present: presence(o),
            }),
            partner: block("partner").map(|o| PartnerEvidence {
                reviewed: flag(o, "reviewed"),
                approved: flag(o, "approved"),
            }),
        }
    }

    /// The most favourable evidence a submission naming `signals` could
    /// carry: every named block present, every flag true, no time window.
    pub fn best_case(signals: &BTreeSet<SignalKind>) -> Self {
        let mut evidence = Self::default();
        for signal in signals {
            match signal {
                SignalKind::Time => {
                    evidence.time = Some(TimeEvidence {
                        present: true,
                        ..Default::default()
                    })
                }
                SignalKind::Location => {
                    evidence.location = Some(LocationEvidence {
                        present: true,
                        inside: true,
                        distance: None,
                    })
                }
                SignalKind::Photo => {
                    evidence.photo = Some(PhotoEvidence {
                        present: true,
                        validation: Some(PhotoValidation {
                            time_valid: true,
                            freshness_valid: true,
                            location_valid: true,
                        }),
                    })
                }
                SignalKind::Manual => evidence.manual = Some(ManualEvidence { present: true }),
                SignalKind::Partner => {
                    evidence.partner = Some(PartnerEvidence {
                        reviewed: true,
                        approved: true,
                    })
                }
            }
        }
        evidence
    }

    pub fn time_present(&self) -> bool {
        self.time.as_ref().is_some_and(|t| t.present)
    }

    pub fn location_present(&self) -> bool {
        self.location.as_ref().is_some_and(|l| l.present)
    }

    /// Present and inside the geofence.
    pub fn location_inside(&self) -> bool {
        self.location.as_ref().is_some_and(|l| l.present && l.inside)
    }

    pub fn photo_present(&self) -> bool {
        self.photo.as_ref().is_some_and(|p| p.present)
    }

    pub fn manual_present(&self) -> bool {
        self.manual.as_ref().is_some_and(|m| m.present)
    }

    /// Signals with a present block, in canonical order.
    pub fn present_signals(&self) -> BTreeSet<SignalKind> {
        let mut signals = BTreeSet::new();
        if self.time_present() {
            signals.insert(SignalKind::Time);
        }
        if self.location_present() {
            signals.insert(SignalKind::Location);
        }
        if self.photo_present() {
            signals.insert(SignalKind::Photo);
        }
        if self.manual_present() {
            signals.insert(SignalKind::Manual);
        }
        if self.partner.as_ref().is_some_and(|p| p.reviewed) {
            signals.insert(SignalKind::Partner);
        }
        signals
    }
}

impl From<Value> for VerificationEvidence {
    fn from(raw: Value) -> Self {
        Self::from_json_lenient(&raw)
    }
}
