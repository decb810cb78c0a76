//! Polling wait engine
//!
//! Dependency order: `poller` → `locate` → `resolve`, all reached through
//! `WaitEngine`.

mod clock;
mod engine;
mod locate;
mod poller;
mod policy;
mod resolve;

pub use clock::{Clock, TokioClock};
pub use engine::WaitEngine;
pub use locate::{SearchOutcome, locate_and_act, locate_and_act_with};
pub use poller::{Evaluation, poll, poll_value_with, poll_with};
pub use policy::{ConditionMode, RetrySearchPolicy, WaitPolicy};
pub use resolve::{position_of, resolve_index, resolve_index_with};
