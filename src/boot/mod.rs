//! Boot sequence - the scripted terminal animation shown before page content
//!
//! The [`BootSequencer`] state machine is shared by the terminal player
//! ([`play`]) and mirrored by the `boot.js` asset shipped with the site.

mod player;
mod script;
mod sequencer;

pub use player::{play, play_until, BootOutcome, TokioTimer};
pub use script::{BootLine, BootScript, Delay};
pub use sequencer::{BootEvent, BootSequencer, BootState, Timer, TimerHandle};
