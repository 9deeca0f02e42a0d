// SPDX-License-Identifier: MIT

//! Screen scripts and forward/backward navigation

mod navigator;
mod types;

pub use navigator::{NavigationListener, Navigator};
pub use types::{ConditionSite, Field, Screen, ScreenId};
