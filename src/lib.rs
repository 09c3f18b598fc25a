pub mod attack;
pub mod board;
pub mod config;
pub mod history;
pub mod legality;
pub mod rules;
pub mod session;
pub mod verdict;
pub mod web;

pub use attack::*;
pub use board::*;
pub use config::*;
pub use history::*;
pub use legality::*;
pub use session::*;
pub use verdict::*;
