//! Skill discovery, identity resolution, and synchronization.
//!
//! Skills are directories containing a `SKILL.md` manifest plus optional
//! `references/`, `assets/`, `scripts/`, and `templates/` content. The same
//! logical skill may exist under several platform roots, under user-added
//! custom roots, and in the remote registry; this crate scans those roots
//! into structured records, reconciles identity across them, detects
//! unpublished changes by content hash, and drives install/publish
//! filesystem mutations.

pub mod client;
pub mod group;
pub mod hash;
pub mod install;
pub mod parse;
pub mod provenance;
pub mod publish;
pub mod publish_state;
pub mod scan;
pub mod service;
pub mod types;
