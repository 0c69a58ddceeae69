// Credvault state managers

pub mod vault_manager;
