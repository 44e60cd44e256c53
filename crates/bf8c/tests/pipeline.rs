use bf8_vm::{filter_commands, render, run_with_options, Command, RunOptions, Status};
use bf8c::compile::{build, BuildOptions};
use bf8c::module_source::MemoryModuleStore;
use bf8c::optimize::{optimize, optimize_with_stats};
use bf8c::profile::{loop_depth, profile_with_budget};

const MAX_STEPS: u64 = 20_000;

/// Small deterministic generator so failures reproduce from the seed alone.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// Random program biased toward cancel pairs and back-to-back loops.
fn gen_program(rng: &mut Lcg, len: usize) -> Vec<Command> {
    let mut out = Vec::with_capacity(len + 8);
    let mut open = 0usize;
    while out.len() < len {
        match rng.below(12) {
            0 | 1 => out.push(Command::Inc),
            2 => out.push(Command::Dec),
            3 => out.push(Command::Left),
            4 => out.push(Command::Right),
            5 => out.push(Command::Output),
            6 => out.push(Command::Input),
            7 => {
                out.push(Command::LoopStart);
                open += 1;
            }
            8 if open > 0 => {
                out.push(Command::LoopEnd);
                open -= 1;
            }
            9 => out.extend([Command::Inc, Command::Dec]),
            10 => out.extend([Command::Right, Command::Left]),
            _ => out.extend([Command::LoopStart, Command::Dec, Command::LoopEnd]),
        }
    }
    // Leave a stray bracket now and then so bracket-failure statuses get covered too.
    if rng.below(8) != 0 {
        out.extend(std::iter::repeat(Command::LoopEnd).take(open));
    }
    out
}

fn run_bounded(program: &[Command], input: &[u8]) -> bf8_vm::RunResult {
    run_with_options(
        program,
        input,
        &RunOptions {
            max_steps: Some(MAX_STEPS),
        },
    )
}

#[test]
fn optimization_preserves_output_and_status() {
    let mut rng = Lcg(0x5eed_0001);
    let mut checked = 0;
    for _ in 0..400 {
        let len = 4 + rng.below(60) as usize;
        let program = gen_program(&mut rng, len);
        let input: Vec<u8> = (0..rng.below(6)).map(|_| rng.below(256) as u8).collect();

        let before = run_bounded(&program, &input);
        if before.status == Status::StepLimit {
            continue;
        }
        let optimized = optimize(&program);
        let after = run_bounded(&optimized, &input);

        let shown = render(&program);
        assert_eq!(after.status, before.status, "program: {shown}");
        assert_eq!(after.output, before.output, "program: {shown}");
        assert!(after.step_count <= before.step_count, "program: {shown}");
        checked += 1;
    }
    assert!(checked > 100, "too few terminating programs: {checked}");
}

#[test]
fn optimization_reaches_a_fixed_point() {
    let mut rng = Lcg(0x5eed_0002);
    for _ in 0..200 {
        let len = 1 + rng.below(80) as usize;
        let program = gen_program(&mut rng, len);
        let once = optimize(&program);
        let (twice, stats) = optimize_with_stats(&once);
        assert_eq!(twice, once, "program: {}", render(&program));
        assert_eq!(stats.rounds, 0);

        for pair in once.windows(2) {
            assert!(
                !pair[0].cancels(pair[1]),
                "cancel pair left in {}",
                render(&once)
            );
        }
    }
}

#[test]
fn optimization_never_grows_metrics() {
    let mut rng = Lcg(0x5eed_0003);
    for _ in 0..200 {
        let len = 1 + rng.below(80) as usize;
        let program = gen_program(&mut rng, len);
        let optimized = optimize(&program);

        assert!(optimized.len() <= program.len());
        assert!(loop_depth(&optimized) <= loop_depth(&program));

        let p_before = profile_with_budget(&program, MAX_STEPS);
        if p_before.truncated {
            continue;
        }
        let p_after = profile_with_budget(&optimized, MAX_STEPS);
        assert!(!p_after.truncated, "program: {}", render(&program));
        assert!(
            p_after.cell_footprint <= p_before.cell_footprint,
            "program: {}",
            render(&program)
        );
    }
}

#[test]
fn composed_build_runs_like_hand_written_program() {
    let store = MemoryModuleStore::new()
        .with_module("io/newline", "\"\\n\"")
        .with_module("greet", "\"Hello\"(io/newline)")
        .with_module("twice", "(greet)(greet)");

    let artifact = build("(twice)", &BuildOptions::new("1.0"), &store).expect("build");
    let r = bf8_vm::run(&artifact.commands, b"");
    assert_eq!(r.status, Status::Ok);
    assert_eq!(r.output_text(), "Hello\nHello\n");
    assert_eq!(artifact.modules, vec!["greet", "io/newline", "twice"]);
    assert_eq!(artifact.profile.depth, 1);
    assert_eq!(artifact.profile.cell_footprint, 1);
    assert!(artifact.name.starts_with("bf8_v1.0+"));
    assert!(artifact.name.ends_with(".1.1.bf"));

    // Re-filtering the artifact text gives back the same stream.
    assert_eq!(filter_commands(&artifact.text()), artifact.commands);
}

#[test]
fn large_artifact_moves_to_next_size_class() {
    let body = ">".repeat(1500);
    let store = MemoryModuleStore::new().with_module("wide", body.as_str());
    let artifact = build("(wide)", &BuildOptions::new("9"), &store).expect("build");
    assert_eq!(artifact.size_bytes(), 1500);
    assert_eq!(artifact.name, "bf8_v9+2.0.1501.bf");
}
