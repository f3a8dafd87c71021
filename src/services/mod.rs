pub mod encoding;
pub mod export;
pub mod ledger;
pub mod loader;
pub mod qa;
pub mod workspace;
