pub use crate::error::Error;
pub use crate::machine::{Flow, Machine};

pub mod constants;
pub mod disassemble;
mod error;
mod instruction;
mod machine;
pub mod opcode;
mod operations;
pub mod stack;
pub mod state;
pub mod timer;
