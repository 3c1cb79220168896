pub mod claim;
pub mod history;
pub mod participant;
