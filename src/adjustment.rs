mod adjust;
mod profile;
mod reading;
mod table;

pub use adjust::*;
pub use profile::*;
pub use reading::*;
pub use table::*;
