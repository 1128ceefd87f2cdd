// Interview core: session state machine, answer pipeline, and report aggregation.
// All provider calls go through the providers module traits.

pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod outcome;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod voice;

#[cfg(test)]
pub mod testing;
