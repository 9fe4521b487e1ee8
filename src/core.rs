//! # Core Utilities
//!
//! Small building blocks shared by the issuance and presentation flows:
//! PKCE material and random identifier generation.

pub mod generate;
pub mod pkce;
