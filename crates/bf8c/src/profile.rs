use bf8_vm::{run_with_options, Command, RunOptions, Status};
use serde::Serialize;
use tracing::debug;

use crate::language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Maximum structural loop nesting.
    pub depth: u64,
    /// Cells allocated by an input-free simulation, up to the first read.
    pub cell_footprint: usize,
    /// How the simulation stopped.
    pub halt: Status,
    /// True when the simulation budget ran out before the program stopped.
    pub truncated: bool,
}

pub fn profile(commands: &[Command]) -> Profile {
    profile_with_budget(commands, language::limits::max_profile_steps())
}

pub fn profile_with_budget(commands: &[Command], max_steps: u64) -> Profile {
    let depth = loop_depth(commands);
    let sim = run_with_options(
        commands,
        &[],
        &RunOptions {
            max_steps: Some(max_steps),
        },
    );
    let out = Profile {
        depth,
        cell_footprint: sim.tape.len(),
        halt: sim.status,
        truncated: sim.status == Status::StepLimit,
    };
    debug!(
        depth = out.depth,
        cells = out.cell_footprint,
        halt = out.halt.as_str(),
        steps = sim.step_count,
        "profile finished"
    );
    out
}

/// Maximum prefix sum of `[` (+1) and `]` (-1).
///
/// The maximum starts from 0, so the empty stream and streams that only dip below
/// zero (such as `]]][`) have depth 0. Artifact names therefore never carry a
/// negative depth. Unmatched `]` still lowers the running sum for what follows.
pub fn loop_depth(commands: &[Command]) -> u64 {
    let mut running: i64 = 0;
    let mut max: i64 = 0;
    for cmd in commands {
        running += cmd.bracket_delta();
        max = max.max(running);
    }
    max as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf8_vm::filter_commands;

    fn prof(src: &str) -> Profile {
        profile_with_budget(&filter_commands(src), 10_000)
    }

    #[test]
    fn depth_is_structural() {
        assert_eq!(loop_depth(&filter_commands("")), 0);
        assert_eq!(loop_depth(&filter_commands("[[]][[[]]]")), 3);
        // The body never runs, depth still counts.
        assert_eq!(prof("[[[-]]]").depth, 3);
    }

    #[test]
    fn stray_closers_never_make_depth_negative() {
        assert_eq!(loop_depth(&filter_commands("]]][")), 0);
        assert_eq!(loop_depth(&filter_commands("]")), 0);
        // Closers seen first still offset later openers.
        assert_eq!(loop_depth(&filter_commands("]][[[")), 1);
        assert_eq!(prof("]]][").depth, 0);
    }

    #[test]
    fn footprint_counts_allocated_cells() {
        let p = prof(">>+<<.");
        assert_eq!(p.cell_footprint, 3);
        assert_eq!(p.halt, Status::Ok);
        assert!(!p.truncated);
    }

    #[test]
    fn footprint_stops_at_first_read() {
        let p = prof(">,>>>>");
        assert_eq!(p.cell_footprint, 2);
        assert_eq!(p.halt, Status::NoInput);
    }

    #[test]
    fn footprint_includes_left_extension() {
        let p = prof("<<+");
        assert_eq!(p.cell_footprint, 3);
    }

    #[test]
    fn footprint_follows_branches() {
        // Loop runs twice, moving right each time.
        let p = prof("++[>+<-]>[>+>+<<-]");
        assert_eq!(p.cell_footprint, 4);
    }

    #[test]
    fn non_terminating_program_is_truncated() {
        let p = prof("+[>+]");
        assert!(p.truncated);
        assert_eq!(p.halt, Status::StepLimit);
        assert!(p.cell_footprint > 1);
    }

    #[test]
    fn malformed_program_still_profiles() {
        let p = prof(">+]");
        assert_eq!(p.halt, Status::NoLeftBracket);
        assert_eq!(p.cell_footprint, 2);
    }
}
