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

use crate::ice_candidate::IceCandidateError;

pub const SDP_ATTR_PREFIX: &str = "a=";
pub const SDP_CANDIDATE_ATTR: &str = "candidate";
pub const SDP_CANDIDATE_ATTR_LEN: usize = SDP_CANDIDATE_ATTR.len();

/// The part of a native ICE agent this crate relies on.
pub trait NativeIceAgent {
    type Candidate;

    /// Serializes a local candidate into its SDP attribute line, e.g.
    /// `a=candidate:1 1 UDP 2130706431 192.168.1.1 12345 typ host`.
    fn generate_local_candidate_sdp(&self, candidate: &Self::Candidate) -> String;
}

/// Replaces the attribute name emitted by a native agent with
/// `candidate:`. A leading `a=` is dropped, the remainder after the
/// attribute name is kept as is.
pub fn normalize_candidate_sdp(native_sdp: &str) -> Result<String, IceCandidateError> {
    let malformed = |reason| IceCandidateError::MalformedNativeSdp {
        sdp: native_sdp.to_owned(),
        reason,
    };

    let attr_line = native_sdp.strip_prefix(SDP_ATTR_PREFIX).unwrap_or(native_sdp);
    if attr_line.len() <= SDP_CANDIDATE_ATTR_LEN {
        return Err(malformed("shorter than the candidate attribute"));
    }

    if !attr_line.is_char_boundary(SDP_CANDIDATE_ATTR_LEN) {
        return Err(malformed("attribute name ends inside a utf-8 character"));
    }

    let (attr, rest) = attr_line.split_at(SDP_CANDIDATE_ATTR_LEN);

    let Some(value) = rest.strip_prefix(':') else {
        return Err(malformed("missing ':' after the attribute name"));
    };

    if attr != SDP_CANDIDATE_ATTR {
        log::debug!(
            "rewriting native candidate attribute {:?} to {:?}",
            attr,
            SDP_CANDIDATE_ATTR
        );
    }

    Ok(format!("{}:{}", SDP_CANDIDATE_ATTR, value))
}
