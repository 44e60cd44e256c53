use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::{filter_commands, Command};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    NoInput,
    NoRightBracket,
    NoLeftBracket,
    /// Only reachable when [`RunOptions::max_steps`] is set.
    StepLimit,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::NoInput => "no_input",
            Status::NoRightBracket => "no_right_bracket",
            Status::NoLeftBracket => "no_left_bracket",
            Status::StepLimit => "step_limit",
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop with [`Status::StepLimit`] once this many instructions have been dispatched.
    pub max_steps: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: Status,
    pub output: Vec<u8>,
    pub tape: Vec<u8>,
    pub head: usize,
    pub step_count: u64,
    pub scan_count: u64,
    pub max_depth: u64,
}

impl RunResult {
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Growable byte tape.
///
/// Moving right past the end appends zero cells. Moving left from cell 0 prepends a
/// zero cell and keeps the head at 0, so the head always addresses a live cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: VecDeque<u8>,
    head: usize,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    pub fn new() -> Self {
        Self {
            cells: VecDeque::from([0u8]),
            head: 0,
        }
    }

    pub fn get(&self) -> u8 {
        self.cells[self.head]
    }

    pub fn set(&mut self, value: u8) {
        self.cells[self.head] = value;
    }

    pub fn inc(&mut self) {
        let cell = &mut self.cells[self.head];
        *cell = cell.wrapping_add(1);
    }

    pub fn dec(&mut self) {
        let cell = &mut self.cells[self.head];
        *cell = cell.wrapping_sub(1);
    }

    pub fn move_right(&mut self) {
        self.head += 1;
        while self.cells.len() <= self.head {
            self.cells.push_back(0);
        }
    }

    pub fn move_left(&mut self) {
        match self.head.checked_sub(1) {
            Some(head) => self.head = head,
            None => self.cells.push_front(0),
        }
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn into_parts(self) -> (Vec<u8>, usize) {
        (self.cells.into(), self.head)
    }
}

#[derive(Debug, Default)]
struct Counters {
    step_count: u64,
    scan_count: u64,
    max_depth: u64,
}

impl Counters {
    fn note_depth(&mut self, depth: u64) {
        self.max_depth = self.max_depth.max(depth);
    }
}

pub fn run(program: &[Command], input: &[u8]) -> RunResult {
    run_with_options(program, input, &RunOptions::default())
}

/// Filters `text` down to commands and runs it.
pub fn run_source(text: &str, input: &[u8]) -> RunResult {
    run(&filter_commands(text), input)
}

pub fn run_with_options(program: &[Command], input: &[u8], options: &RunOptions) -> RunResult {
    let mut tape = Tape::new();
    let mut input = input.iter().copied();
    let mut output: Vec<u8> = Vec::new();
    let mut counters = Counters::default();
    let mut status = Status::Ok;
    let mut ip = 0usize;

    while ip < program.len() {
        if options
            .max_steps
            .is_some_and(|max| counters.step_count >= max)
        {
            status = Status::StepLimit;
            break;
        }
        counters.step_count += 1;
        counters.scan_count += 1;

        match program[ip] {
            Command::Inc => tape.inc(),
            Command::Dec => tape.dec(),
            Command::Right => tape.move_right(),
            Command::Left => tape.move_left(),
            Command::Output => output.push(tape.get()),
            Command::Input => match input.next() {
                Some(b) => tape.set(b),
                None => {
                    status = Status::NoInput;
                    break;
                }
            },
            Command::LoopStart if tape.get() == 0 => {
                match scan_forward(program, ip, &mut counters) {
                    Some(close) => ip = close,
                    None => {
                        status = Status::NoRightBracket;
                        break;
                    }
                }
            }
            Command::LoopEnd if tape.get() != 0 => {
                match scan_backward(program, ip, &mut counters) {
                    Some(open) => ip = open,
                    None => {
                        status = Status::NoLeftBracket;
                        break;
                    }
                }
            }
            Command::LoopStart | Command::LoopEnd => {}
        }
        ip += 1;
    }

    let (tape, head) = tape.into_parts();
    debug!(
        status = status.as_str(),
        steps = counters.step_count,
        cells = tape.len(),
        output_bytes = output.len(),
        "run finished"
    );
    RunResult {
        status,
        output,
        tape,
        head,
        step_count: counters.step_count,
        scan_count: counters.scan_count,
        max_depth: counters.max_depth,
    }
}

/// Finds the `]` matching the `[` at `open`. Every position moved costs one scan.
fn scan_forward(program: &[Command], open: usize, counters: &mut Counters) -> Option<usize> {
    let mut depth: u64 = 1;
    counters.note_depth(depth);
    let mut idx = open;
    loop {
        counters.scan_count += 1;
        idx += 1;
        match program.get(idx)? {
            Command::LoopStart => {
                depth += 1;
                counters.note_depth(depth);
            }
            Command::LoopEnd if depth == 1 => return Some(idx),
            Command::LoopEnd => depth -= 1,
            _ => {}
        }
    }
}

/// Finds the `[` matching the `]` at `close`.
fn scan_backward(program: &[Command], close: usize, counters: &mut Counters) -> Option<usize> {
    let mut depth: u64 = 1;
    counters.note_depth(depth);
    let mut idx = close;
    loop {
        counters.scan_count += 1;
        idx = idx.checked_sub(1)?;
        match program[idx] {
            Command::LoopEnd => {
                depth += 1;
                counters.note_depth(depth);
            }
            Command::LoopStart if depth == 1 => return Some(idx),
            Command::LoopStart => depth -= 1,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_wrap_at_256() {
        let src = "+".repeat(256);
        let r = run_source(&src, b"");
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.tape, vec![0]);

        let r = run_source("-.", b"");
        assert_eq!(r.output, vec![255]);
    }

    #[test]
    fn move_right_extends_tape_with_zeros() {
        let r = run_source(">>>+", b"");
        assert_eq!(r.tape, vec![0, 0, 0, 1]);
        assert_eq!(r.head, 3);
    }

    #[test]
    fn move_left_at_origin_prepends_cell() {
        let r = run_source("+<++", b"");
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.tape, vec![2, 1]);
        assert_eq!(r.head, 0);

        let r = run_source("+<>.", b"");
        assert_eq!(r.output, vec![1]);
        assert_eq!(r.head, 1);
    }

    #[test]
    fn skipped_loop_counts_scanned_positions() {
        // `[` at 0 matches `]` at 3: three positions moved.
        let r = run_source("[+-].", b"");
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.step_count, 2);
        assert_eq!(r.scan_count, 2 + 3);
        assert_eq!(r.max_depth, 1);
    }

    #[test]
    fn nested_skip_records_depth() {
        let r = run_source("[[[]]]", b"");
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.max_depth, 3);
        assert_eq!(r.step_count, 1);
    }

    #[test]
    fn no_scan_leaves_depth_zero() {
        let r = run_source("+.", b"");
        assert_eq!(r.max_depth, 0);
        assert_eq!(r.scan_count, r.step_count);
    }

    #[test]
    fn loop_runs_until_cell_is_zero() {
        // 3 * 4 = 12 into cell 1.
        let r = run_source("+++[>++++<-]>.", b"");
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.output, vec![12]);
        assert_eq!(r.tape, vec![0, 12]);
        assert!(r.scan_count >= r.step_count);
    }

    #[test]
    fn unmatched_close_with_nonzero_cell_halts() {
        let r = run_source("+.]", b"");
        assert_eq!(r.status, Status::NoLeftBracket);
        assert_eq!(r.output, vec![1]);
    }

    #[test]
    fn unmatched_close_with_zero_cell_falls_through() {
        let r = run_source("].", b"");
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.output, vec![0]);
    }

    #[test]
    fn unmatched_open_with_nonzero_cell_falls_through() {
        let r = run_source("+[.-", b"");
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.output, vec![1]);
    }

    #[test]
    fn input_is_consumed_in_order() {
        let r = run_source(",.>,.,.", b"ab");
        assert_eq!(r.status, Status::NoInput);
        assert_eq!(r.output, b"ab".to_vec());
        assert_eq!(r.tape, vec![b'a', b'b']);
    }

    #[test]
    fn step_limit_stops_infinite_loop() {
        let program = filter_commands("+[]");
        let r = run_with_options(
            &program,
            b"",
            &RunOptions {
                max_steps: Some(100),
            },
        );
        assert_eq!(r.status, Status::StepLimit);
        assert_eq!(r.step_count, 100);
    }

    #[test]
    fn step_limit_does_not_affect_terminating_program() {
        let program = filter_commands("++[>+<-]>.");
        let unlimited = run(&program, b"");
        let limited = run_with_options(
            &program,
            b"",
            &RunOptions {
                max_steps: Some(1_000),
            },
        );
        assert_eq!(unlimited, limited);
    }

    #[test]
    fn status_serializes_snake_case() {
        let v = serde_json::to_value(Status::NoRightBracket).expect("serialize status");
        assert_eq!(v, serde_json::json!("no_right_bracket"));
    }
}
