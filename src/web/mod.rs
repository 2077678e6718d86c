// Web module
// Edge gate for the admin area and the few HTML pages around it

pub mod gate;
pub mod pages;

pub use gate::{
    edge_gate, is_desktop_user_agent, EdgeGate, GateDecision, GateRequest, RedirectReason,
};
