mod driver;
mod engine;
mod mode;
mod ticker;

pub use driver::CountdownDriver;
pub use engine::{CountdownEngine, Restored, TimerSnapshot, TimerState};
pub use mode::TimerMode;
pub use ticker::Ticker;
