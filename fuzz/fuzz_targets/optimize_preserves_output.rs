#![no_main]

use bf8_vm::{filter_commands, run_with_options, RunOptions, Status};
use libfuzzer_sys::fuzz_target;

const MAX_STEPS: u64 = 100_000;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 4 * 1024 {
        &data[..4 * 1024]
    } else {
        data
    };

    // First byte picks how much of the tail is program text; the rest is input.
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize).min(rest.len());
    let (program, input) = rest.split_at(split);

    let program = filter_commands(&String::from_utf8_lossy(program));
    let options = RunOptions {
        max_steps: Some(MAX_STEPS),
    };
    let before = run_with_options(&program, input, &options);
    if before.status == Status::StepLimit {
        return;
    }

    let optimized = bf8c::optimize::optimize(&program);
    let after = run_with_options(&optimized, input, &options);
    assert_eq!(after.status, before.status);
    assert_eq!(after.output, before.output);
    assert_eq!(bf8c::optimize::optimize(&optimized), optimized);
});
