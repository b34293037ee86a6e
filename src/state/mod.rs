//! In-memory monitor state.
//!
//! Two independent pieces of state drive alerting:
//!
//! - [`MonitorState`] turns raw level samples into confirmed low/restored
//!   [`Event`]s using a sustained-low debounce.
//! - [`CooldownGate`] spaces out outbound notifications of either kind.
//!
//! Both are plain values owned by the monitor loop. Neither performs I/O.

mod cooldown;
mod debounce;

pub use cooldown::CooldownGate;
pub use debounce::{Event, MonitorState, Phase};
