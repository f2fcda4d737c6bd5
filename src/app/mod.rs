// Author: Dustin Pilgrim
// License: MIT

pub mod command;
pub mod logging;
pub mod watch_mode;
