mod scheduler;
mod window;

pub use scheduler::{RitualState, Scheduler};
pub use window::{in_window, ActiveWindow, ClockTime, MINUTES_PER_DAY};
