mod device;
mod logic;
mod scan;
pub use device::*;
pub use logic::*;
pub use scan::*;
