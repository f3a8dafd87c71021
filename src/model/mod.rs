pub mod row;
pub mod session;
pub mod workspace;
