// SPDX-License-Identifier: MIT

//! Answer state for condition evaluation
//!
//! This module provides:
//! - `Value` - the tagged union conditions compare against
//! - `Context` - the live answer map, with `Absent` for missing keys

mod context;
mod value;

pub use context::{Context, RISK_COUNT, SIGN_COUNT};
pub use value::Value;
