//! Collaborator glue over the core clients

pub mod alerts;
