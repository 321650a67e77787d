mod capture;
mod decay;
mod reinforcement;

pub use capture::CaptureSystem;
pub use decay::DecaySystem;
pub use reinforcement::ReinforcementSystem;
