pub mod backends;
pub mod grammar;
pub mod serialize;
pub mod structure;
pub mod syntax;
pub mod tree;
pub mod types;
pub mod walk;
