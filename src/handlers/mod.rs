// handlers/mod.rs - Two handler tiers
//
// Public (no auth) → Protected (bearer token verified by the active strategy)
pub mod protected;
pub mod public;
