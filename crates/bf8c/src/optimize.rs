use bf8_vm::Command;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeStats {
    /// Rounds that changed the stream.
    pub rounds: u32,
    pub cancelled_pairs: usize,
    pub dead_loops: usize,
    pub removed_commands: usize,
}

pub fn optimize(commands: &[Command]) -> Vec<Command> {
    optimize_with_stats(commands).0
}

/// Applies adjacent cancellation and dead-loop elision until neither matches.
///
/// Every rewrite removes commands, so the loop runs at most `commands.len()` rounds.
pub fn optimize_with_stats(commands: &[Command]) -> (Vec<Command>, OptimizeStats) {
    let mut stats = OptimizeStats::default();
    let mut cur = commands.to_vec();
    loop {
        let (next, pairs) = cancel_adjacent(&cur);
        let (next, loops) = elide_dead_loops(&next);
        if pairs == 0 && loops == 0 {
            break;
        }
        stats.rounds += 1;
        stats.cancelled_pairs += pairs;
        stats.dead_loops += loops;
        cur = next;
    }
    stats.removed_commands = commands.len() - cur.len();
    debug!(
        before = commands.len(),
        after = cur.len(),
        rounds = stats.rounds,
        "peephole optimization finished"
    );
    (cur, stats)
}

/// Deletes `+-`, `-+`, `<>`, `><`, including pairs exposed by earlier deletions.
fn cancel_adjacent(commands: &[Command]) -> (Vec<Command>, usize) {
    let mut out: Vec<Command> = Vec::with_capacity(commands.len());
    let mut pairs = 0usize;
    for &cmd in commands {
        if out.last().is_some_and(|&prev| prev.cancels(cmd)) {
            out.pop();
            pairs += 1;
        } else {
            out.push(cmd);
        }
    }
    (out, pairs)
}

/// Drops bracket-free loops that directly follow a `]`: the cell is zero on loop exit,
/// so the following loop never runs.
fn elide_dead_loops(commands: &[Command]) -> (Vec<Command>, usize) {
    let mut out: Vec<Command> = Vec::with_capacity(commands.len());
    let mut loops = 0usize;
    let mut i = 0usize;
    while i < commands.len() {
        let cmd = commands[i];
        out.push(cmd);
        i += 1;
        if cmd == Command::LoopEnd {
            while let Some(close) = flat_loop_at(commands, i) {
                i = close + 1;
                loops += 1;
            }
        }
    }
    (out, loops)
}

/// If a loop without inner brackets starts at `start`, returns the index of its `]`.
fn flat_loop_at(commands: &[Command], start: usize) -> Option<usize> {
    if commands.get(start) != Some(&Command::LoopStart) {
        return None;
    }
    let offset = commands[start + 1..]
        .iter()
        .position(|c| matches!(c, Command::LoopStart | Command::LoopEnd))?;
    let close = start + 1 + offset;
    (commands[close] == Command::LoopEnd).then_some(close)
}
