pub mod cli;
pub mod duties;
pub mod run;
pub mod state;
