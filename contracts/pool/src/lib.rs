pub mod contract;
pub mod guard;
pub mod math;
pub mod state;
