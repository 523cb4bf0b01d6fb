pub mod baseline;
pub mod check;
pub mod history;
