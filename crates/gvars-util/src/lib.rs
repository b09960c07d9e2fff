pub mod quote;
pub mod split;
