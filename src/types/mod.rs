pub mod alignment;
pub mod buildup;
pub mod chain;
pub mod levels;
pub mod migration;
pub mod report;
pub mod session;
pub mod skew;

pub use alignment::*;
pub use buildup::*;
pub use chain::*;
pub use levels::*;
pub use migration::*;
pub use report::*;
pub use session::*;
pub use skew::*;
