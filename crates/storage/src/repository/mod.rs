pub mod award;
pub mod participant;
pub mod ranking;
