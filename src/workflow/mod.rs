// SPDX-License-Identifier: MIT

pub mod condition;
pub mod diagnosis;
pub mod loader;
pub mod script;
pub mod state;
pub mod types;
