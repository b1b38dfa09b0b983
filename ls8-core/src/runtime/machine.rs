//! Fetch-decode-execute engine of the LS8
//!
//! The machine owns its memory, register file and flags outright; nothing is
//! shared between instances. A run is `new` -> `load` -> `run` -> drop.

use std::io::{self, Stdout, Write};

use crate::error::{LoadError, VmError, VmResult};

use super::alu;
use super::disasm;
use super::isa::{self, Op};
use super::memory::Memory;
use super::registers::{Flags, RegisterFile};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineConfig {
    /// Log a trace line before every instruction.
    pub trace: bool,
    /// Stop with an error after this many instructions.
    pub step_limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Instructions executed during the run, HLT included.
    pub steps: u64,
}

pub struct Machine<W: Write = Stdout> {
    pc: u8,
    ir: u8, // last fetched opcode
    regs: RegisterFile,
    flags: Flags,
    memory: Memory,

    // Bytes at the bottom of memory the stack may not grow into
    program_len: usize,

    halted: bool,
    steps: u64,
    config: MachineConfig,
    output: W,
}

impl Machine<Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Machine<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Machine<W> {
    /// A machine whose PRN output goes to `output`.
    pub fn with_output(output: W) -> Self {
        Self::with_config(MachineConfig::default(), output)
    }

    pub fn with_config(config: MachineConfig, output: W) -> Self {
        Self {
            pc: 0,
            ir: 0,
            regs: RegisterFile::new(),
            flags: Flags::default(),
            memory: Memory::new(),
            program_len: 0,
            halted: false,
            steps: 0,
            config,
            output,
        }
    }

    /// Reset the machine and place a program image at address 0. Nothing from
    /// an earlier program survives a successful load.
    pub fn load(&mut self, image: &[u8]) -> Result<(), LoadError> {
        let mut memory = Memory::new();
        memory.load(image)?;

        self.memory = memory;
        self.regs = RegisterFile::new();
        self.flags = Flags::default();
        self.program_len = image.len();
        self.pc = 0;
        self.ir = 0;
        self.steps = 0;
        self.halted = false;

        log::debug!("loaded {} byte program", image.len());
        Ok(())
    }

    /// Run until HLT or the first error.
    pub fn run(&mut self) -> VmResult<RunSummary> {
        let start = self.steps;
        while self.step()? == State::Running {}

        let steps = self.steps - start;
        log::debug!("halted at {:02X} after {} instructions", self.pc, steps);
        Ok(RunSummary { steps })
    }

    /// Execute exactly one instruction. Any error leaves the machine halted.
    pub fn step(&mut self) -> VmResult<State> {
        if self.halted {
            return Ok(State::Halted);
        }

        if let Some(limit) = self.config.step_limit {
            if self.steps >= limit {
                self.halted = true;
                return Err(VmError::StepLimitExceeded(limit));
            }
        }

        if self.config.trace {
            log::info!("{}", disasm::trace_line(self));
        }

        match self.execute() {
            Ok(state) => {
                self.steps += 1;
                Ok(state)
            }
            Err(e) => {
                log::warn!("execution stopped at {:02X}: {}", self.pc, e);
                self.halted = true;
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> VmResult<State> {
        let addr = self.pc;
        self.ir = self.memory.read(addr);

        let op = Op::try_from(self.ir)
            .map_err(|opcode| VmError::UnknownInstruction { addr, opcode })?;

        // Operand bytes are read unconditionally; instructions that take fewer
        // simply ignore them.
        let operand_a = self.memory.read(addr.wrapping_add(1));
        let operand_b = self.memory.read(addr.wrapping_add(2));

        let jump_to = match op {
            Op::HLT => {
                self.halted = true;
                return Ok(State::Halted);
            }

            Op::LDI => {
                self.regs.set(operand_a, operand_b)?;
                None
            }
            Op::PRN => {
                let value = self.regs.get(operand_a)?;
                writeln!(self.output, "{}", value)?;
                None
            }

            // Stack
            Op::PUSH => {
                let value = self.regs.get(operand_a)?;
                self.push(value)?;
                None
            }
            Op::POP => {
                let value = self.pop()?;
                self.regs.set(operand_a, value)?;
                None
            }

            // Calls
            Op::CALL => {
                let target = self.regs.get(operand_a)?;
                self.push(addr.wrapping_add(2))?;
                Some(target)
            }
            Op::RET => Some(self.pop()?),

            // Jumping
            Op::JMP => Some(self.regs.get(operand_a)?),
            Op::JEQ => self.branch_if(self.flags.equal, operand_a)?,
            Op::JNE => self.branch_if(!self.flags.equal, operand_a)?,

            _ => {
                alu::apply(op, &mut self.regs, &mut self.flags, operand_a, operand_b)?;
                None
            }
        };

        self.pc = jump_to.unwrap_or_else(|| addr.wrapping_add(isa::instruction_len(self.ir)));
        Ok(State::Running)
    }

    fn branch_if(&self, taken: bool, reg: u8) -> VmResult<Option<u8>> {
        if taken {
            self.regs.get(reg).map(Some)
        } else {
            Ok(None)
        }
    }

    fn push(&mut self, value: u8) -> VmResult<()> {
        let sp = self.regs.sp();
        match sp.checked_sub(1) {
            Some(next) if next as usize >= self.program_len => {
                self.regs.set_sp(next);
                self.memory.write(next, value);
                Ok(())
            }
            _ => Err(VmError::StackOverflow { sp }),
        }
    }

    fn pop(&mut self) -> VmResult<u8> {
        let sp = self.regs.sp();
        let next = sp
            .checked_add(1)
            .ok_or(VmError::StackUnderflow { sp })?;

        let value = self.memory.read(sp);
        self.regs.set_sp(next);
        Ok(value)
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn ir(&self) -> u8 {
        self.ir
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::registers::SP;

    const LDI: u8 = Op::LDI as u8;
    const PRN: u8 = Op::PRN as u8;
    const HLT: u8 = Op::HLT as u8;
    const PUSH: u8 = Op::PUSH as u8;
    const POP: u8 = Op::POP as u8;
    const CALL: u8 = Op::CALL as u8;
    const RET: u8 = Op::RET as u8;
    const JMP: u8 = Op::JMP as u8;
    const JEQ: u8 = Op::JEQ as u8;
    const JNE: u8 = Op::JNE as u8;
    const CMP: u8 = Op::CMP as u8;

    fn machine(code: &[u8]) -> Machine<Vec<u8>> {
        let mut mach = Machine::with_output(Vec::<u8>::new());
        mach.load(code).unwrap();
        mach
    }

    fn printed(mach: Machine<Vec<u8>>) -> String {
        String::from_utf8(mach.into_output()).unwrap()
    }

    #[test]
    fn test_machine_initialization() {
        let mach = Machine::with_output(Vec::<u8>::new());
        assert_eq!(mach.pc(), 0);
        assert_eq!(mach.registers().get(SP).unwrap(), 0xF4);
        assert_eq!(mach.flags(), Flags::default());
        assert!(!mach.is_halted());
    }

    #[test]
    fn test_machine_run() {
        let mut mach = machine(&[LDI, 0, 8, PRN, 0, HLT]);
        let summary = mach.run().unwrap();
        assert_eq!(summary.steps, 3);
        assert!(mach.is_halted());
        assert_eq!(mach.pc(), 5);
        assert_eq!(printed(mach), "8\n");
    }

    #[test]
    fn step_after_halt_does_nothing() {
        let mut mach = machine(&[HLT]);
        assert_eq!(mach.step().unwrap(), State::Halted);
        assert_eq!(mach.step().unwrap(), State::Halted);
        assert_eq!(mach.steps(), 1);
    }

    #[test]
    fn default_advance_uses_top_bits() {
        let mut mach = machine(&[LDI, 1, 3, PUSH, 1, HLT]);
        mach.step().unwrap();
        assert_eq!(mach.pc(), 3);
        mach.step().unwrap();
        assert_eq!(mach.pc(), 5);
    }

    #[test]
    fn unknown_opcode_reports_address() {
        let mut mach = machine(&[LDI, 0, 1, 0b1111_1111]);
        let err = mach.run().unwrap_err();
        assert!(matches!(
            err,
            VmError::UnknownInstruction {
                addr: 3,
                opcode: 0xFF
            }
        ));
        assert!(mach.is_halted());
    }

    #[test]
    fn running_off_the_program_hits_zero_opcode() {
        let mut mach = machine(&[LDI, 0, 1]);
        let err = mach.run().unwrap_err();
        assert!(matches!(
            err,
            VmError::UnknownInstruction { addr: 3, opcode: 0 }
        ));
    }

    #[test]
    fn invalid_register_operand_halts() {
        let mut mach = machine(&[LDI, 9, 1, HLT]);
        assert!(matches!(mach.run(), Err(VmError::InvalidRegister(9))));
        assert!(mach.is_halted());
    }

    #[test]
    fn push_pop_round_trip() {
        let mut mach = machine(&[LDI, 0, 42, PUSH, 0, LDI, 0, 0, POP, 0, HLT]);
        mach.step().unwrap();
        mach.step().unwrap();
        assert_eq!(mach.registers().sp(), 0xF3);
        assert_eq!(mach.memory().read(0xF3), 42);

        mach.run().unwrap();
        assert_eq!(mach.registers().get(0).unwrap(), 42);
        assert_eq!(mach.registers().sp(), 0xF4);
    }

    #[test]
    fn pop_past_top_of_memory_underflows() {
        let mut mach = machine(&[LDI, 7, 0xFF, POP, 0, HLT]);
        assert!(matches!(
            mach.run(),
            Err(VmError::StackUnderflow { sp: 0xFF })
        ));
    }

    #[test]
    fn push_pop_with_relocated_sp() {
        let mut mach = machine(&[LDI, 7, 0xFC, LDI, 0, 9, PUSH, 0, POP, 1, HLT]);
        mach.run().unwrap();
        assert_eq!(mach.registers().get(1).unwrap(), 9);
        assert_eq!(mach.registers().sp(), 0xFC);
    }

    #[test]
    fn reload_starts_from_a_clean_machine() {
        let mut mach = machine(&[LDI, 0, 1, LDI, 1, 2, CMP, 0, 1, PUSH, 1, PRN, 1, HLT]);
        mach.run().unwrap();

        mach.load(&[LDI, 0, 7]).unwrap();
        assert_eq!(mach.steps(), 0);
        assert_eq!(mach.flags(), Flags::default());
        assert_eq!(mach.registers(), &RegisterFile::new());
        assert!(mach.memory().as_slice()[3..].iter().all(|&b| b == 0));

        let err = mach.run().unwrap_err();
        assert!(matches!(
            err,
            VmError::UnknownInstruction { addr: 3, opcode: 0 }
        ));
        assert_eq!(printed(mach), "2\n");
    }

    #[test]
    fn failed_reload_keeps_previous_program() {
        let mut mach = machine(&[LDI, 0, 1, HLT]);
        assert!(mach.load(&[0; 300]).is_err());
        mach.run().unwrap();
        assert_eq!(mach.registers().get(0).unwrap(), 1);
    }

    #[test]
    fn reload_resets_step_limit_budget() {
        let config = MachineConfig {
            step_limit: Some(3),
            ..MachineConfig::default()
        };
        let mut mach = Machine::with_config(config, Vec::<u8>::new());
        mach.load(&[LDI, 0, 1, LDI, 1, 2, HLT]).unwrap();
        mach.run().unwrap();

        mach.load(&[LDI, 0, 1, LDI, 1, 2, HLT]).unwrap();
        assert_eq!(mach.run().unwrap().steps, 3);
    }

    #[test]
    fn push_into_program_overflows() {
        // SP set just above the program image
        let mut mach = machine(&[LDI, 7, 5, PUSH, 0, HLT]);
        assert!(matches!(
            mach.run(),
            Err(VmError::StackOverflow { sp: 5 })
        ));
    }

    #[test]
    fn push_below_zero_overflows() {
        let mut mach = Machine::with_output(Vec::<u8>::new());
        mach.load(&[LDI, 7, 0, PUSH, 0, HLT]).unwrap();
        assert!(matches!(
            mach.run(),
            Err(VmError::StackOverflow { sp: 0 })
        ));
    }

    #[test]
    fn call_and_ret() {
        let code = [
            LDI, 1, 10, // 0: R1 = subroutine
            CALL, 1,    // 3
            PRN, 0,     // 5
            HLT,        // 7
            0, 0,       // 8: padding
            LDI, 0, 99, // 10: subroutine
            RET,        // 13
        ];
        let mut mach = machine(&code);

        mach.step().unwrap();
        mach.step().unwrap();
        assert_eq!(mach.pc(), 10);
        assert_eq!(mach.memory().read(mach.registers().sp()), 5);

        mach.step().unwrap();
        mach.step().unwrap();
        assert_eq!(mach.pc(), 5);
        assert_eq!(mach.registers().sp(), 0xF4);

        mach.run().unwrap();
        assert_eq!(printed(mach), "99\n");
    }

    #[test]
    fn ret_with_sp_at_top_underflows() {
        let mut mach = machine(&[LDI, 7, 0xFF, RET]);
        assert!(matches!(mach.run(), Err(VmError::StackUnderflow { sp: 0xFF })));
    }

    #[test]
    fn jmp_sets_pc() {
        let mut mach = machine(&[LDI, 2, 6, JMP, 2, HLT, PRN, 2, HLT]);
        mach.run().unwrap();
        assert_eq!(printed(mach), "6\n");
    }

    #[test]
    fn conditional_jumps_follow_equal_flag() {
        let equal = [LDI, 0, 4, LDI, 1, 4, LDI, 2, 0, CMP, 0, 1];

        let mut mach = machine(&[&equal[..], &[JEQ, 2][..]].concat());
        for _ in 0..5 {
            mach.step().unwrap();
        }
        assert_eq!(mach.pc(), 0);

        let mut mach = machine(&[&equal[..], &[JNE, 2][..]].concat());
        for _ in 0..5 {
            mach.step().unwrap();
        }
        assert_eq!(mach.pc(), 14);
    }

    #[test]
    fn step_limit_stops_infinite_loop() {
        let config = MachineConfig {
            step_limit: Some(10),
            ..MachineConfig::default()
        };
        let mut mach = Machine::with_config(config, Vec::<u8>::new());
        mach.load(&[LDI, 0, 0, JMP, 0]).unwrap();

        assert!(matches!(mach.run(), Err(VmError::StepLimitExceeded(10))));
        assert_eq!(mach.steps(), 10);
        assert!(mach.is_halted());
    }

    #[test]
    fn machines_are_independent() {
        let mut a = machine(&[LDI, 0, 1, HLT]);
        let mut b = machine(&[LDI, 0, 2, HLT]);
        a.run().unwrap();
        b.run().unwrap();
        assert_eq!(a.registers().get(0).unwrap(), 1);
        assert_eq!(b.registers().get(0).unwrap(), 2);
    }
}
