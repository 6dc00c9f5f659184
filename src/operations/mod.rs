pub mod boolean;
pub mod offset;
pub mod simplify;
