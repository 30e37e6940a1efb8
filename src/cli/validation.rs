use crate::cli::args::CliArgs;
use crate::dispatcher::DispatchStrategy;
use crate::output::OutputFormat;

pub const MAX_RANDOM_PATHS: usize = 1000;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            return Err("invalid concurrency, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(rate) = args.rate {
        if rate == 0 {
            return Err("invalid rate, expected positive integer".to_string());
        }
    }
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err("invalid workers, expected positive integer".to_string());
        }
    }
    if let Some(count) = args.random_paths {
        if count > MAX_RANDOM_PATHS {
            return Err(format!(
                "invalid random-paths {count}, expected at most {MAX_RANDOM_PATHS}"
            ));
        }
    }
    if let Some(raw) = args.strategy.as_deref() {
        if DispatchStrategy::parse(raw).is_none() {
            return Err(format!("invalid --strategy '{raw}', expected pool or waves"));
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json, or xml"
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["stressprobe"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn accepts_defaults() {
        assert!(validate(&parse(&[])).is_ok());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let err = validate(&parse(&["-c", "0"])).unwrap_err();
        assert!(err.contains("concurrency"));
    }

    #[test]
    fn rejects_zero_rate_and_timeout() {
        assert!(validate(&parse(&["--rate", "0"])).is_err());
        assert!(validate(&parse(&["--timeout", "0"])).is_err());
    }

    #[test]
    fn rejects_unknown_strategy_and_format() {
        assert!(validate(&parse(&["--strategy", "burst"])).is_err());
        assert!(validate(&parse(&["--output-format", "html"])).is_err());
        assert!(validate(&parse(&["--strategy", "waves"])).is_ok());
    }

    #[test]
    fn caps_random_paths() {
        assert!(validate(&parse(&["--random-paths", "1001"])).is_err());
        assert!(validate(&parse(&["--random-paths", "1000"])).is_ok());
    }
}
