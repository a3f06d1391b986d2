//! Application Layer
//!
//! Services that enforce the cross-entity rules on top of the repositories:
//! mirror sync after every write, vote transitions, the group cascade and
//! the backlog sweep. DTOs carry validated input and the sweep and cascade
//! reports.

pub mod dto;
pub mod services;
