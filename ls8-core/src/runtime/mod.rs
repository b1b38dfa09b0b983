pub mod alu;
pub mod disasm;
pub mod isa;
pub mod loader;
pub mod machine;
pub mod memory;
pub mod registers;
