//! # SafeExam (Proof-of-Presence Codes)
//!
//! `safeexam` hands out a short, rotating code to people who can prove who they
//! are against the directory, and lets the exam client check that a code typed
//! in by a candidate is the one currently on screen.
//!
//! ## Components
//!
//! - **Code source** ([`code`]): a single current code, replaced on a fixed
//!   interval by a background task. Readers always see the value and its expiry
//!   as one pair.
//! - **Session registry** ([`session`]): in-memory map of session ids to expiry.
//!   Expired ids are evicted on lookup and by a periodic sweep.
//! - **Credential gate** ([`directory`]): username/password check against an
//!   Active Directory server over LDAP, optionally restricted to one group.
//! - **Orchestrator** ([`api`]): the HTTP handlers tying the three together.
//!
//! Each stateful component owns its own lock and never calls another component
//! while holding it.
//!
//! ## Wire Format
//!
//! The JSON API keeps the field names existing clients already send
//! (`User`, `Passwd`, `SessionID`, `Code`, `Expires`, `ServerTime`, `Status`).
//! Timestamps are nanoseconds since the Unix epoch, UTC.

pub mod api;
pub mod cli;
pub mod code;
pub mod directory;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
