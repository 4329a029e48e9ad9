// Outbound phone screens: call placement, provider status callbacks, TwiML script.
// All provider traffic goes through the twilio::Telephony seam.

pub mod handlers;
pub mod orchestrator;
pub mod script;
pub mod store;
pub mod twilio;
