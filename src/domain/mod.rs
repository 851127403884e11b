mod entry;
mod money;
mod period;
mod stats;

pub use entry::*;
pub use money::*;
pub use period::*;
pub use stats::*;
