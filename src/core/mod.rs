// Core modules implementing the value model, table storage, and error modeling.
pub mod error;
pub mod rational;
pub mod table;
pub mod value;
