use std::collections::BTreeSet;
use std::time::{Duration, Instant};

pub fn slice_to_vec_of_owned(input: &[&str]) -> Vec<String> {
    input.iter().map(|x| x.to_string()).collect()
}

pub fn slice_to_set_of_owned(input: &[&str]) -> BTreeSet<String> {
    input.iter().map(|x| x.to_string()).collect()
}

pub fn run_repeatedly_and_average<F: FnMut()>(mut f: F, runs: u32) -> Duration {
    // Average wall-clock time of `runs` calls to `f`.
    let runs = runs.max(1);
    let start = Instant::now();
    for _ in 0..runs {
        f();
    }
    let average = start.elapsed() / runs;
    println!("Average time over {runs} run(s): {average:?}");
    average
}
