use emumon::debugger::registers::Register;
use emumon::{StopReason, NR_WATCHPOINTS};

use crate::test_helpers::{run, small_monitor};

#[test]
fn test_register_change_is_reported_once() {
    let mut monitor = small_monitor();
    monitor.machine_mut().registers.set(Register::Eax, 5);
    let id = monitor.create_watch("$eax").unwrap();

    monitor.machine_mut().registers.set(Register::Eax, 7);
    let changes = monitor.check_watches();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].id, id);
    assert_eq!((changes[0].old_value, changes[0].new_value), (5, 7));
    assert_eq!(monitor.lookup_watch(id).unwrap().old_value(), 7);

    assert!(monitor.check_watches().is_empty());
}

#[test]
fn test_deleted_watch_is_no_longer_checked() {
    let mut monitor = small_monitor();
    let keep = monitor.create_watch("$ebx").unwrap();
    let gone = monitor.create_watch("$eax").unwrap();

    assert!(monitor.delete_watch(gone));
    assert!(monitor.lookup_watch(gone).is_none());

    monitor.machine_mut().registers.set(Register::Eax, 1);
    assert!(monitor.check_watches().is_empty());

    monitor.machine_mut().registers.set(Register::Ebx, 1);
    let changes = monitor.check_watches();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].id, keep);
}

#[test]
fn test_ids_fill_the_pool() {
    let mut monitor = small_monitor();
    let mut ids: Vec<usize> = (0..NR_WATCHPOINTS)
        .map(|i| monitor.create_watch(&format!("$eax + {i}")).unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), NR_WATCHPOINTS);

    // Releasing one makes room for exactly one more
    assert!(monitor.delete_watch(ids[5]));
    assert_eq!(monitor.create_watch("1").unwrap(), ids[5]);
}

#[test]
#[should_panic(expected = "watchpoint pool exhausted")]
fn test_pool_exhaustion_is_fatal() {
    let mut monitor = small_monitor();
    for _ in 0..=NR_WATCHPOINTS {
        monitor.create_watch("1").unwrap();
    }
}

#[test]
fn test_run_stops_on_memory_watch() {
    let mut monitor = small_monitor();
    monitor.load_bytes(0x1000, &[0x90; 16]).unwrap();
    monitor.machine_mut().registers.set_eip(0x1000);
    monitor.create_watch("$eip >= 0x1008").unwrap();

    let reason = monitor.run(1000).unwrap();
    assert!(matches!(reason, StopReason::Watchpoint(ref changes) if changes[0].new_value == 1));
    assert_eq!(monitor.machine().registers.eip(), 0x1008);
    assert_eq!(monitor.steps(), 8);
}

#[test]
fn test_command_session() {
    let mut monitor = small_monitor();
    monitor.machine_mut().registers.set(Register::Esp, 0x2000);
    monitor.machine_mut().memory.write_word(0x2000, 0xabcd).unwrap();

    assert_eq!(run(&mut monitor, "p *$esp"), "43981\n");
    assert_eq!(run(&mut monitor, "w $eip == 3"), "Watchpoint 0: $eip == 3\n");
    assert_eq!(run(&mut monitor, "w *$esp"), "Watchpoint 1: *$esp\n");
    assert_eq!(run(&mut monitor, "info w"), "Num\tExpression\n1\t*$esp\n0\t$eip == 3\n");
    assert_eq!(
        run(&mut monitor, "c"),
        "\nWatchpoint 0: $eip == 3\nOld value = 0\nNew value = 1\n\n"
    );
    assert_eq!(run(&mut monitor, "d 0"), "Watchpoint 0 is deleted.\n");
    assert_eq!(run(&mut monitor, "d 0"), "Watchpoint 0 doesn't exist.\n");
    assert_eq!(run(&mut monitor, "x 2 $esp"), "0x00002000: 0x0000abcd\n0x00002004: 0x00000000\n");
}
