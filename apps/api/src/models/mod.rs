pub mod applicant;
pub mod conversation;
pub mod listing;
