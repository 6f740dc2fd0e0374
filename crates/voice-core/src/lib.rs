pub mod client;
pub mod input_history;
pub mod language;
pub mod message_history;
pub mod normalize;
pub mod reconcile;
pub mod sentence;
pub mod settings;
pub mod suggestion;
pub mod unicode;
