pub const LANG_ID: &str = bf8_contracts::BF8_LANG_ID;

pub mod limits {
    /// Cap on the text produced by inclusion expansion.
    pub const MAX_EXPANDED_BYTES: usize = 64 * 1024 * 1024;
    /// Simulation budget of the static profiler.
    pub const MAX_PROFILE_STEPS: u64 = 10_000_000;

    pub fn max_expanded_bytes() -> usize {
        match std::env::var("BF8_MAX_EXPANDED_BYTES") {
            Ok(v) => v
                .parse::<usize>()
                .ok()
                .filter(|v| *v > 0)
                .unwrap_or(MAX_EXPANDED_BYTES),
            Err(_) => MAX_EXPANDED_BYTES,
        }
    }

    pub fn max_profile_steps() -> u64 {
        match std::env::var("BF8_MAX_PROFILE_STEPS") {
            Ok(v) => v
                .parse::<u64>()
                .ok()
                .filter(|v| *v > 0)
                .unwrap_or(MAX_PROFILE_STEPS),
            Err(_) => MAX_PROFILE_STEPS,
        }
    }
}
