pub mod audit;
pub mod finalize;
pub mod land;
pub mod policy;
