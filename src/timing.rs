//! Timing model: internal scale counters to physical durations
//!
//! The test bench runs at 6 ns per command cycle. A row activation costs a
//! fixed 36 ns (tRAS) plus 30 ns per RAS scale step; a precharge costs 15 ns
//! (tRP). All functions here are pure arithmetic.

/// Nanoseconds per command cycle
pub const CYCLE_NS: u64 = 6;

/// Minimum row-active time in nanoseconds
pub const T_RAS_NS: u64 = 36;

/// Minimum row-precharge time in nanoseconds
pub const T_RP_NS: f64 = 15.0;

/// Base cycles of one activate/precharge round
const BASE_CYCLES: u64 = 9;

/// Cycles added per RAS (or RP) scale step
const CYCLES_PER_SCALE: u64 = 5;

/// Slack allowed above a wall-clock attack budget
pub const BUDGET_TOLERANCE_MS: f64 = 0.1;

/// Aggressor-row-open time for a RAS scale; `None` on overflow
pub fn t_agg_on_ns(ras_scale: u64) -> Option<u64> {
    ras_scale
        .checked_mul(CYCLES_PER_SCALE * CYCLE_NS)?
        .checked_add(T_RAS_NS)
}

/// Extra delay counter to nanoseconds; `None` on overflow
pub fn extra_delay_ns(extra_delay: u64) -> Option<u64> {
    extra_delay.checked_mul(CYCLE_NS)
}

/// Total attack time of `activation_count` activations at `ras_scale`;
/// `None` on overflow
pub fn attack_time_ns(ras_scale: u64, activation_count: u64) -> Option<u64> {
    ras_scale
        .checked_mul(CYCLES_PER_SCALE)?
        .checked_add(BASE_CYCLES)?
        .checked_mul(CYCLE_NS)?
        .checked_mul(activation_count)
}

/// Split an extra delay into (tAggON, tAggOFF) nanoseconds by `ratio`
pub fn extra_delay_ratio_to_on_off_ns(extra_delay: u64, ratio: f64) -> (f64, f64) {
    let delay_ns = extra_delay as f64 * CYCLE_NS as f64;
    let on = delay_ns * ratio + T_RAS_NS as f64;
    let off = (delay_ns - delay_ns * ratio) + T_RP_NS;
    (on, off)
}

// Program times are computed in f64: their inputs come from sweeps and
// budgets, and the result is a float anyway.
fn round_cycles(ras_scale: u64, rp_scale: u64) -> f64 {
    CYCLES_PER_SCALE as f64 * (ras_scale as f64 + rp_scale as f64) + BASE_CYCLES as f64
}

fn round_time_ms(num_rows: u64, ras_scale: u64, rp_scale: u64) -> f64 {
    round_cycles(ras_scale, rp_scale) * num_rows as f64 * CYCLE_NS as f64 / 1_000_000.0
}

/// Wall-clock time in milliseconds of a hammering program
pub fn program_time_ms(num_rows: u64, ras_scale: u64, rp_scale: u64, hammer_count: u64) -> f64 {
    round_cycles(ras_scale, rp_scale) * num_rows as f64 * hammer_count as f64 * CYCLE_NS as f64
        / 1_000_000.0
}

/// Largest hammer count whose program time fits in `time_budget_ms`
///
/// The budget is widened by [`BUDGET_TOLERANCE_MS`] unless it is below one
/// millisecond, in which case it is used as is. Returns 0 when a single
/// hammer already exceeds the budget, or when there are no aggressor rows.
pub fn hammer_count_for_budget(
    num_rows: u64,
    ras_scale: u64,
    rp_scale: u64,
    time_budget_ms: f64,
) -> u64 {
    let max_time = if time_budget_ms < 1.0 {
        time_budget_ms
    } else {
        time_budget_ms + BUDGET_TOLERANCE_MS
    };

    let unit = round_time_ms(num_rows, ras_scale, rp_scale);
    if unit <= 0.0 || unit > max_time {
        return 0;
    }

    (max_time / unit).floor() as u64
}

fn fa_round_time_ms(num_rows: u64, extra_cycles: u64) -> f64 {
    (extra_cycles as f64 + BASE_CYCLES as f64) * num_rows as f64 * CYCLE_NS as f64 / 1_000_000.0
}

/// Wall-clock time in milliseconds of a fixed-extra-cycle program
pub fn fa_program_time_ms(num_rows: u64, extra_cycles: u64, hammer_count: u64) -> f64 {
    fa_round_time_ms(num_rows, extra_cycles) * hammer_count as f64
}

/// Hammer count covering `time_budget_ms` with fixed extra cycles (rounded up)
pub fn hammer_count_for_fixed_extra_cycles(
    num_rows: u64,
    extra_cycles: u64,
    time_budget_ms: f64,
) -> u64 {
    let unit = fa_round_time_ms(num_rows, extra_cycles);
    if unit <= 0.0 {
        return 0;
    }
    (time_budget_ms / unit).ceil() as u64
}
