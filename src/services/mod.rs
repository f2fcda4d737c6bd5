// Author: Dustin Pilgrim
// License: MIT

pub mod activity;
pub mod processes;
pub mod session;
pub mod signals;
pub mod ticker;
