//! VMTP capability probing.
//!
//! The handshake reply is inspected once per session. Anything other than a
//! `250` reply listing the `VMTP` keyword means "not supported"; a failed
//! probe never aborts the session.

use crate::types::{Extension, Reply, ReplyCode};
use std::collections::HashSet;

/// Extensions advertised by an EHLO reply (the first line is the greeting).
#[must_use]
pub fn extensions(reply: &Reply) -> HashSet<Extension> {
    if reply.code != ReplyCode::OK {
        return HashSet::new();
    }
    reply
        .message
        .iter()
        .skip(1)
        .map(String::as_str)
        .map(Extension::parse)
        .collect()
}

/// Returns true if the EHLO reply advertises VMTP.
#[must_use]
pub fn probe(reply: &Reply) -> bool {
    extensions(reply).contains(&Extension::Vmtp)
}
