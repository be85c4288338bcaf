/// Everything that can terminate a run.
///
/// None of these are retried: the clock driver stops and reports them to its
/// caller. The one exception is [`Error::UnknownInstruction`], which a caller
/// may choose to log and skip since the program counter has already been
/// advanced past the offending word by the time it surfaces.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("unknown instruction {0:#06X}")]
    UnknownInstruction(u16),

    #[error("call stack overflow: subroutines nested deeper than the stack capacity")]
    StackOverflow,

    #[error("call stack underflow: return with no saved address")]
    StackUnderflow,

    #[error("memory access out of bounds at {0:#05X}")]
    MemoryOutOfBounds(u16),

    #[error("ROM of {size} bytes does not fit in {max} bytes of program space")]
    RomTooLarge { size: usize, max: usize },
}
