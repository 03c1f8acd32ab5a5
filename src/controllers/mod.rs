pub mod health;
pub mod speech;

pub use speech::SpeechController;
