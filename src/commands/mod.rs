mod count;
mod info;
mod pack;

pub use count::count;
pub use info::info;
pub use pack::{pack, run_packed};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
