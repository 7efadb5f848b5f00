//! Port implementations.
//!
//! `live` talks to real services, `recording` and `replaying` capture and
//! serve cassettes, `dry_run` previews writes, and `memory` keeps
//! everything in process.

pub mod dry_run;
pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
