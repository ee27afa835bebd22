// Copyright 2025 LiveKit, Inc.
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

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::native::{normalize_candidate_sdp, NativeIceAgent};

pub const DEFAULT_SDP_MLINE_INDEX: u8 = 0;

#[derive(Error, Debug)]
pub enum IceCandidateError {
    #[error("sdpMLineIndex {0} is outside of [0, 255]")]
    SdpMLineIndexOutOfRange(i64),

    #[error("malformed native candidate sdp {sdp:?}: {reason}")]
    MalformedNativeSdp { sdp: String, reason: &'static str },

    #[error("invalid ice candidate json: {0}")]
    Json(#[from] serde_json::Error),
}

/// An ICE candidate as exchanged with the signalling layer.
///
/// See <https://www.w3.org/TR/webrtc/#rtcicecandidate-interface>
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IceCandidateJson")]
pub struct IceCandidate {
    /// The candidate-attribute as defined in section 15.1 of ICE (rfc5245).
    candidate: Option<String>,
    /// Identifier of the "media stream identification" (rfc3388) of the
    /// m-line this candidate is associated with.
    #[serde(rename = "sdpMid")]
    sdp_mid: Option<String>,
    /// Zero based index of the m-line this candidate is associated with.
    #[serde(rename = "sdpMLineIndex")]
    sdp_mline_index: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IceCandidateJson {
    #[serde(default)]
    candidate: Option<String>,
    #[serde(default)]
    sdp_mid: Option<String>,
    #[serde(default)]
    sdp_m_line_index: Option<i64>,
}

impl TryFrom<IceCandidateJson> for IceCandidate {
    type Error = IceCandidateError;

    fn try_from(json: IceCandidateJson) -> Result<Self, Self::Error> {
        let sdp_mline_index = match json.sdp_m_line_index {
            Some(index) => mline_index(index)?,
            None => DEFAULT_SDP_MLINE_INDEX,
        };

        Ok(Self { candidate: json.candidate, sdp_mid: json.sdp_mid, sdp_mline_index })
    }
}

fn mline_index(index: i64) -> Result<u8, IceCandidateError> {
    u8::try_from(index).map_err(|_| IceCandidateError::SdpMLineIndexOutOfRange(index))
}

impl IceCandidate {
    pub fn new(candidate: &str, sdp_mid: &str, sdp_mline_index: u8) -> Self {
        Self {
            candidate: Some(candidate.to_owned()),
            sdp_mid: Some(sdp_mid.to_owned()),
            sdp_mline_index,
        }
    }

    /// Same as [`IceCandidate::new`] for callers holding the index as a
    /// signalling-side integer.
    pub fn try_new(
        candidate: &str,
        sdp_mid: &str,
        sdp_mline_index: i32,
    ) -> Result<Self, IceCandidateError> {
        let sdp_mline_index = mline_index(sdp_mline_index.into())?;
        Ok(Self::new(candidate, sdp_mid, sdp_mline_index))
    }

    /// Builds a candidate from the attribute line generated by a native ICE
    /// agent, rewriting the attribute name to the canonical `candidate:` form.
    pub fn from_native_sdp(
        native_sdp: &str,
        sdp_mid: &str,
        sdp_mline_index: u8,
    ) -> Result<Self, IceCandidateError> {
        let candidate = normalize_candidate_sdp(native_sdp)?;
        log::trace!(
            "native ice_candidate {:?} (mid: {:?}, mline: {})",
            candidate,
            sdp_mid,
            sdp_mline_index
        );

        Ok(Self {
            candidate: Some(candidate),
            sdp_mid: Some(sdp_mid.to_owned()),
            sdp_mline_index,
        })
    }

    pub fn from_native<A: NativeIceAgent>(
        agent: &A,
        candidate: &A::Candidate,
        sdp_mid: &str,
        sdp_mline_index: u8,
    ) -> Result<Self, IceCandidateError> {
        let sdp = agent.generate_local_candidate_sdp(candidate);
        Self::from_native_sdp(&sdp, sdp_mid, sdp_mline_index)
    }

    pub fn from_json(json: &str) -> Result<Self, IceCandidateError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, IceCandidateError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn candidate(&self) -> Option<&str> {
        self.candidate.as_deref()
    }

    pub fn sdp_mid(&self) -> Option<&str> {
        self.sdp_mid.as_deref()
    }

    pub fn sdp_mline_index(&self) -> u8 {
        self.sdp_mline_index
    }

    pub fn set_candidate(&mut self, candidate: Option<&str>) {
        self.candidate = candidate.map(str::to_owned);
    }

    pub fn set_sdp_mid(&mut self, sdp_mid: Option<&str>) {
        self.sdp_mid = sdp_mid.map(str::to_owned);
    }

    pub fn set_sdp_mline_index(&mut self, sdp_mline_index: u8) {
        self.sdp_mline_index = sdp_mline_index;
    }

    /// Leaves the current index untouched on error.
    pub fn try_set_sdp_mline_index(
        &mut self,
        sdp_mline_index: i32,
    ) -> Result<(), IceCandidateError> {
        self.sdp_mline_index = mline_index(sdp_mline_index.into())?;
        Ok(())
    }
}

impl Display for IceCandidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.candidate().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "candidate:1 1 UDP 2130706431 192.168.1.1 12345 typ host";

    #[test]
    fn new_stores_fields() {
        for index in [0u8, 1, 127, 255] {
            let ic = IceCandidate::new(HOST, "audio", index);
            assert_eq!(ic.candidate(), Some(HOST));
            assert_eq!(ic.sdp_mid(), Some("audio"));
            assert_eq!(ic.sdp_mline_index(), index);
        }
    }

    #[test]
    fn new_copies_input() {
        let mut buf = String::from(HOST);
        let ic = IceCandidate::new(&buf, "0", 0);
        buf.clear();
        assert_eq!(ic.candidate(), Some(HOST));
    }

    #[test]
    fn default_is_unset() {
        let ic = IceCandidate::default();
        assert_eq!(ic.candidate(), None);
        assert_eq!(ic.sdp_mid(), None);
        assert_eq!(ic.sdp_mline_index(), DEFAULT_SDP_MLINE_INDEX);
        assert_eq!(ic.to_string(), "");
    }

    #[test]
    fn try_new_bounds() {
        assert_eq!(IceCandidate::try_new(HOST, "0", 0).unwrap().sdp_mline_index(), 0);
        assert_eq!(IceCandidate::try_new(HOST, "0", 255).unwrap().sdp_mline_index(), 255);

        assert!(matches!(
            IceCandidate::try_new(HOST, "0", 256),
            Err(IceCandidateError::SdpMLineIndexOutOfRange(256))
        ));
        assert!(matches!(
            IceCandidate::try_new(HOST, "0", -1),
            Err(IceCandidateError::SdpMLineIndexOutOfRange(-1))
        ));
    }

    #[test]
    fn setters_are_independent() {
        let mut ic = IceCandidate::new(HOST, "audio", 1);

        ic.set_sdp_mid(Some("video"));
        assert_eq!(ic.candidate(), Some(HOST));
        assert_eq!(ic.sdp_mline_index(), 1);

        ic.set_candidate(None);
        assert_eq!(ic.sdp_mid(), Some("video"));
        assert_eq!(ic.sdp_mline_index(), 1);

        ic.set_sdp_mline_index(3);
        assert_eq!(ic.candidate(), None);
        assert_eq!(ic.sdp_mid(), Some("video"));
    }

    #[test]
    fn last_write_wins() {
        let mut ic = IceCandidate::default();
        ic.set_sdp_mid(Some("a"));
        ic.set_sdp_mid(Some("b"));
        ic.set_sdp_mline_index(4);
        ic.set_sdp_mline_index(9);
        assert_eq!(ic.sdp_mid(), Some("b"));
        assert_eq!(ic.sdp_mline_index(), 9);
    }

    #[test]
    fn try_set_out_of_range_keeps_value() {
        let mut ic = IceCandidate::new(HOST, "0", 7);
        assert!(ic.try_set_sdp_mline_index(1000).is_err());
        assert_eq!(ic.sdp_mline_index(), 7);

        ic.try_set_sdp_mline_index(255).unwrap();
        assert_eq!(ic.sdp_mline_index(), 255);
    }

    #[test]
    fn display_is_candidate() {
        let ic = IceCandidate::new(HOST, "0", 0);
        assert_eq!(ic.to_string(), HOST);
    }

    #[test]
    fn clone_is_detached() {
        let ic = IceCandidate::new(HOST, "0", 0);
        let mut copy = ic.clone();
        copy.set_candidate(Some("candidate:2 1 UDP 1 10.0.0.1 9 typ host"));
        assert_eq!(ic.candidate(), Some(HOST));
        assert_ne!(ic, copy);
    }

    #[test]
    fn json_field_names() {
        let ic = IceCandidate::new(HOST, "0", 2);
        let value: serde_json::Value = serde_json::from_str(&ic.to_json().unwrap()).unwrap();

        assert_eq!(value["candidate"], HOST);
        assert_eq!(value["sdpMid"], "0");
        assert_eq!(value["sdpMLineIndex"], 2);
    }

    #[test]
    fn json_missing_fields() {
        let ic = IceCandidate::from_json(r#"{"candidate":"candidate:1 1 UDP 1 1.1.1.1 1 typ host"}"#)
            .unwrap();
        assert_eq!(ic.sdp_mid(), None);
        assert_eq!(ic.sdp_mline_index(), 0);

        let ic = IceCandidate::from_json(r#"{"candidate":null,"sdpMid":null,"sdpMLineIndex":null}"#)
            .unwrap();
        assert_eq!(ic, IceCandidate::default());
    }

    #[test]
    fn json_index_out_of_range() {
        let res = IceCandidate::from_json(r#"{"candidate":"","sdpMid":"0","sdpMLineIndex":300}"#);
        assert!(matches!(res, Err(IceCandidateError::Json(_))));
    }
}
