use std::thread;
use std::time::{Duration, Instant};

use icvm::{words, Channel, Exit, Interpreter, Ports, VmError, Word};
use pretty_assertions::assert_eq;

const TIMEOUT: Duration = Duration::from_secs(5);

fn wait_until(cond: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < TIMEOUT {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

fn permutations(values: &[i64]) -> Vec<Vec<i64>> {
    if values.len() <= 1 {
        return vec![values.to_vec()];
    }
    let mut result = Vec::new();
    for i in 0..values.len() {
        let mut rest = values.to_vec();
        let first = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            result.push(tail);
        }
    }
    result
}

#[test]
fn test_output_visible_before_input_block() {
    // out 7; in [20]; [20] += 1; out [20]
    let program = [104, 7, 3, 20, 1001, 20, 1, 20, 4, 20, 99];
    let handle = Interpreter::new(&program).spawn().unwrap();

    assert_eq!(handle.pop_output_timeout(TIMEOUT), Some(Word::from(7)));
    assert!(wait_until(|| handle.is_waiting()));
    assert!(!handle.is_halted());

    handle.push_input(7 * 2);
    assert_eq!(handle.pop_output_timeout(TIMEOUT), Some(Word::from(15)));

    let (vm, exit) = handle.join().unwrap();
    assert_eq!(exit, Ok(Exit::Halted));
    assert!(vm.is_halted());
    assert!(!vm.is_waiting());
    assert_eq!(vm.result(), words([7, 15]).as_slice());
}

#[test]
fn test_driver_reacts_to_each_output() {
    // loop { in x; if x == 0 halt; out x * 2; out x + 1 }
    let program = [
        3, 100, 1006, 100, 20, 1002, 100, 2, 101, 4, 101, 1001, 100, 1, 102, 4, 102, 1105, 1, 0,
        99,
    ];
    let handle = Interpreter::new(&program).spawn().unwrap();

    let mut pairs = Vec::new();
    let mut next = Word::from(1);
    for _ in 0..4 {
        handle.push_input(next);
        let pair = handle.pop_outputs(2).unwrap();
        next = pair[1].clone();
        pairs.push(pair);
    }
    handle.push_input(0);

    let (_, exit) = handle.join().unwrap();
    assert_eq!(exit, Ok(Exit::Halted));
    assert_eq!(
        pairs,
        vec![words([2, 2]), words([4, 3]), words([6, 4]), words([8, 5])]
    );
}

#[test]
fn test_halt_closes_output() {
    let handle = Interpreter::new(&[104, 1, 104, 2, 99]).spawn().unwrap();

    assert_eq!(handle.pop_output(), Some(Word::from(1)));
    assert_eq!(handle.pop_output(), Some(Word::from(2)));
    // Blocking pop returns once the run has ended
    assert_eq!(handle.pop_output(), None);
    assert!(handle.is_halted());
    assert!(handle.ports().output.is_closed());

    let _ = handle.join().unwrap();
}

#[test]
fn test_close_input_unblocks_waiting_vm() {
    let handle = Interpreter::new(&[3, 0, 99]).spawn().unwrap();
    assert!(wait_until(|| handle.is_waiting()));

    handle.close_input();

    let (vm, exit) = handle.join().unwrap();
    assert_eq!(exit, Err(VmError::InputClosed { ip: 0 }));
    assert!(vm.is_halted());
    assert!(!vm.is_waiting());
}

#[test]
fn test_unknown_opcode_on_background_thread() {
    let handle = Interpreter::new(&[104, 5, 77]).spawn().unwrap();

    assert_eq!(handle.pop_output_timeout(TIMEOUT), Some(Word::from(5)));
    assert!(wait_until(|| handle.is_halted()));

    let (_, exit) = handle.join().unwrap();
    assert_eq!(
        exit,
        Ok(Exit::UnknownOpcode {
            address: 2,
            word: Word::from(77)
        })
    );
}

const FEEDBACK_A: &[i64] = &[
    3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28,
    1005, 28, 6, 99, 0, 0, 5,
];
const FEEDBACK_B: &[i64] = &[
    3, 52, 1001, 52, -5, 52, 3, 53, 1, 52, 56, 54, 1007, 54, 5, 55, 1005, 55, 26, 1001, 54, -5,
    54, 1105, 1, 12, 1, 53, 54, 53, 1008, 54, 0, 55, 1001, 55, 1, 55, 2, 53, 55, 53, 4, 53, 1001,
    56, -1, 56, 1005, 56, 6, 99, 0, 0, 0, 0, 10,
];

/// Five interpreters in a ring, each reading the previous one's output
fn feedback_loop(program: &[i64], phases: &[i64]) -> Word {
    let channels: Vec<Channel> = phases.iter().map(|&p| Channel::from_values([p])).collect();
    channels[0].push(0);

    let handles: Vec<_> = (0..phases.len())
        .map(|i| {
            let ports = Ports::connect(
                channels[i].clone(),
                channels[(i + 1) % channels.len()].clone(),
            );
            Interpreter::with_ports(program, ports).spawn().unwrap()
        })
        .collect();

    for handle in handles {
        let (_, exit) = handle.join().unwrap();
        assert_eq!(exit, Ok(Exit::Halted));
    }

    channels[0].drain().pop().unwrap()
}

fn max_feedback_signal(program: &[i64]) -> Word {
    permutations(&[5, 6, 7, 8, 9])
        .iter()
        .map(|phases| feedback_loop(program, phases))
        .max()
        .unwrap()
}

#[test]
fn test_feedback_loop_fixed_phases() {
    assert_eq!(feedback_loop(FEEDBACK_A, &[9, 8, 7, 6, 5]), Word::from(139629729));
    assert_eq!(feedback_loop(FEEDBACK_B, &[9, 7, 8, 5, 6]), Word::from(18216));
}

#[test]
fn test_feedback_loop_best_phases() {
    assert_eq!(max_feedback_signal(FEEDBACK_A), Word::from(139629729));
    assert_eq!(max_feedback_signal(FEEDBACK_B), Word::from(18216));
}

#[test]
fn test_shared_ports_see_same_values() {
    let ports = Ports::with_input([3]);
    let handle = Interpreter::with_ports(&[3, 0, 4, 0, 99], ports.clone())
        .spawn()
        .unwrap();

    assert_eq!(ports.output.pop_timeout(TIMEOUT), Some(Word::from(3)));
    assert!(ports.input.same_channel(&handle.ports().input));

    let _ = handle.join().unwrap();
}

#[test]
fn test_wait_for_input_drives_prompt_loop() {
    // out 1; in [30]; out [30] * 10; in [30]; out [30] * 10
    let program = [
        104, 1, 3, 30, 1002, 30, 10, 31, 4, 31, 3, 30, 1002, 30, 10, 31, 4, 31, 99,
    ];
    let handle = Interpreter::new(&program).spawn().unwrap();

    let mut seen = Vec::new();
    let mut replies = [2, 3].into_iter();
    while handle.wait_for_input() {
        seen.extend(handle.ports().output.drain());
        handle.push_input(replies.next().unwrap());
    }
    seen.extend(handle.ports().output.drain());

    let (vm, exit) = handle.join().unwrap();
    assert_eq!(exit, Ok(Exit::Halted));
    assert_eq!(seen, words([1, 20, 30]));
    assert_eq!(replies.next(), None);
    assert!(!vm.is_waiting());
}

#[test]
fn test_wait_for_input_ends_on_close() {
    let handle = Interpreter::new(&[3, 0, 3, 0, 99]).spawn().unwrap();

    assert!(handle.wait_for_input());
    handle.close_input();
    assert!(!handle.wait_for_input());

    let (_, exit) = handle.join().unwrap();
    assert_eq!(exit, Err(VmError::InputClosed { ip: 0 }));
}
