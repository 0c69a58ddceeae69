// Credvault shared type definitions

pub mod analysis;
pub mod blob;
pub mod errors;
pub mod gate;
pub mod record;
pub mod settings;
pub mod store;
