//! Command-line argument handling: one or more basenames, a zero-argument
//! usage message, and exit-status aggregation (spec 6)

use crate::driver;

/// Run the assembler over every basename in `args`, returning the process
/// exit status. Per-file non-fatal failures have already been reported by
/// [`driver::run`] and do not themselves change the exit status; only a
/// fatal error in any file (or zero arguments) does (spec 6). A fatal error
/// aborts the run immediately rather than processing the remaining
/// basenames (spec 6: "Per-file failures do not abort subsequent files
/// unless fatal").
pub fn run(args: &[String]) -> i32 {
    if args.is_empty() {
        eprintln!("usage: asm20465 <basename>...");
        return 1;
    }

    for basename in args {
        let outcome = driver::run(basename);
        if outcome.fatal {
            return 1;
        }
    }

    0
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn no_arguments_is_a_usage_error() {
        assert_eq!(run(&[]), 1);
    }

    #[test]
    fn a_fatal_basename_stops_before_later_basenames_run() {
        let missing = std::env::temp_dir().join("asm20465-cli-test-missing").display().to_string();
        let unreached = std::env::temp_dir().join("asm20465-cli-test-unreached").display().to_string();
        let _ = fs::remove_file(format!("{missing}.as"));
        // this second basename would assemble cleanly (and produce a `.ob`)
        // if the driver ever got to it
        fs::write(format!("{unreached}.as"), "stop\n").unwrap();
        let _ = fs::remove_file(format!("{unreached}.ob"));

        let status = run(&[missing, unreached.clone()]);

        assert_eq!(status, 1);
        // the fatal first basename must short-circuit the loop, so the
        // second basename was never even attempted
        assert!(!std::path::Path::new(&format!("{unreached}.ob")).exists());

        let _ = fs::remove_file(format!("{unreached}.as"));
        let _ = fs::remove_file(format!("{unreached}.am"));
        let _ = fs::remove_file(format!("{unreached}.ob"));
    }
}
