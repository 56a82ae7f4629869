mod detector;
mod os;
mod scripted;
mod system;

pub use detector::{Relapse, TriggerDetector, CHROMIUM_BROWSERS};
pub use os::{OsQuery, ProcessInfo, WindowInfo};
pub use scripted::ScriptedQuery;
pub use system::SystemQuery;
