pub mod check;
pub mod serve;
pub mod usage;

pub use check::Check;
pub use serve::Serve;
pub use usage::Usage;
