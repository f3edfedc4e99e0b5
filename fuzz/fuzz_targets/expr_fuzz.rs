#![no_main]

use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;
use emumon::debugger::memory::GuestMemory;
use emumon::debugger::registers::{Register, Registers};
use emumon::evaluate;

#[derive(Arbitrary, Debug)]
struct ExprFuzzInput {
    // Register contents
    eax: u32,
    esp: u32,

    // Word placed at the start of memory
    word: u32,

    // Expression text
    text: String,
}

fuzz_target!(|input: ExprFuzzInput| {
    let mut regs = Registers::new();
    regs.set(Register::Eax, input.eax);
    regs.set(Register::Esp, input.esp);

    let mut mem = GuestMemory::new(0x1000);
    let _ = mem.write_word(0, input.word);

    // Any input must either evaluate or fail cleanly, and do so the same
    // way twice
    let first = evaluate(&input.text, &regs, &mem);
    let second = evaluate(&input.text, &regs, &mem);
    assert_eq!(first, second);
});
