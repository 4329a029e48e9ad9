// Listings: CSV upload, applicant ranking, interview-question settings, shortlist.

pub mod archive;
pub mod csv_reader;
pub mod handlers;
pub mod prompts;
pub mod questions;
pub mod store;
