// Tabular import of transactions

mod import;

pub use import::*;
