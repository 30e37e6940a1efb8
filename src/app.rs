use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::dispatcher::DispatchStrategy;
use crate::output::{self, OutputFormat};
use crate::runner::{self, Options, Runner};
use crate::{catalog, logger, store};

const DEFAULT_WORKERS: usize = 4;

fn print_banner() {
    const BANNER: &str = r#"
         __                                          __
   _____/ /_________  ______________  _________  / /_  ___
  / ___/ __/ ___/ _ \/ ___/ ___/ __ \/ ___/ __ \/ __ \/ _ \
 (__  ) /_/ /  /  __(__  |__  ) /_/ / /  / /_/ / /_/ /  __/
/____/\__/_/   \___/____/____/ .___/_/   \____/_.___/\___/
                            /_/
       concurrent HTTP load and security probe
    "#;
    print!("{}", BANNER);
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn format_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| format!("/{}", p.trim_start_matches('/')))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Debug)]
struct RunConfig {
    options: Options,
    workers: usize,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
}

fn resolve_output_format(
    explicit: Option<String>,
    output_path: Option<&str>,
) -> Result<OutputFormat, String> {
    if let Some(raw) = explicit {
        return OutputFormat::parse(&raw).ok_or_else(|| {
            format!("invalid output format '{raw}', expected text, json, or xml")
        });
    }
    Ok(output_path
        .and_then(output::infer_format_from_path)
        .unwrap_or(OutputFormat::Text))
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let url = args
        .url
        .or(cfg.url)
        .unwrap_or_else(|| runner::DEFAULT_URL.to_string())
        .trim()
        .to_string();
    let pages = if args.pages.is_empty() {
        cfg.pages.unwrap_or_else(|| {
            catalog::payloads::VALID_PAGES
                .iter()
                .map(|p| p.to_string())
                .collect()
        })
    } else {
        args.pages.clone()
    };

    let requests = args
        .requests
        .or(cfg.requests)
        .unwrap_or(runner::DEFAULT_REQUESTS);
    let concurrency = args
        .concurrency
        .or(cfg.concurrency)
        .unwrap_or(runner::DEFAULT_CONCURRENCY);
    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(runner::DEFAULT_TIMEOUT_SECONDS);
    let rate = args.rate.or(cfg.rate);
    let workers = args.workers.or(cfg.workers).unwrap_or(DEFAULT_WORKERS);
    if workers == 0 {
        return Err("invalid workers, expected positive integer".to_string());
    }

    let include_security = args.security || cfg.security.unwrap_or(false);
    let random_path_count = args
        .random_paths
        .or(cfg.random_paths)
        .unwrap_or(catalog::DEFAULT_RANDOM_PATH_COUNT);
    if random_path_count > validation::MAX_RANDOM_PATHS {
        return Err(format!(
            "invalid random-paths {random_path_count}, expected at most {}",
            validation::MAX_RANDOM_PATHS
        ));
    }

    let strategy = match args.strategy.or(cfg.strategy) {
        Some(raw) => DispatchStrategy::parse(&raw)
            .ok_or_else(|| format!("invalid strategy '{raw}', expected pool or waves"))?,
        None => DispatchStrategy::default(),
    };
    let follow_redirects = args.follow_redirects || cfg.follow_redirects.unwrap_or(false);
    let max_errors_per_path = cfg
        .max_errors_per_path
        .unwrap_or(store::DEFAULT_MAX_ERRORS_PER_PATH);

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(p.trim()))
        .filter(|p| !p.is_empty());
    let output_format =
        resolve_output_format(args.output_format.or(cfg.output_format), output.as_deref())?;

    Ok(RunConfig {
        options: Options {
            url,
            pages,
            requests,
            concurrency,
            include_security,
            random_path_count,
            timeout_seconds: timeout,
            rate,
            strategy,
            follow_redirects,
            max_errors_per_path,
        },
        workers,
        output,
        output_format,
        no_color,
        verbose: args.verbose,
    })
}

async fn write_output(path: &str, rendered: &[u8]) -> Result<(), String> {
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(rendered)
        .await
        .map_err(|_| "failed to write output file".to_string())?;
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    let runner = Runner::new(run.options.clone()).map_err(|e| e.to_string())?;
    let opts = runner.options();

    format_kv_line("Target", runner.base_url());
    format_kv_line("Pages", &format_pages(&opts.pages));
    format_kv_line(
        "Load",
        &format!(
            "requests={} conc={} strategy={} rate={} workers={}",
            opts.requests,
            opts.concurrency,
            opts.strategy.label(),
            opts.rate
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unlimited".to_string()),
            run.workers,
        ),
    );
    format_kv_line(
        "HTTP",
        &format!(
            "timeout={}s redirects={}",
            opts.timeout_seconds,
            format_bool(opts.follow_redirects)
        ),
    );
    format_kv_line(
        "Security",
        &if opts.include_security {
            format!("on random_paths={}", opts.random_path_count)
        } else {
            "off".to_string()
        },
    );
    if let Some(path) = run.output.as_deref() {
        format_kv_line("Output", path);
    }
    println!();

    let pb = ProgressBar::new(opts.requests.max(1) as u64);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_style(
        ProgressStyle::with_template(
            ":: Progress: [{pos}/{len}] :: {per_sec} :: Duration: [{elapsed_precise}] :: {msg}",
        )
        .map_err(|e| format!("failed to build progress bar style: {e}"))?
        .progress_chars(r#"#>-"#),
    );

    let result = runner
        .run_with_progress(&pb)
        .await
        .map_err(|e| e.to_string())?;
    pb.finish_and_clear();

    print!("{}", output::console::render(&result.report, !run.no_color));

    if let Some(path) = run.output.as_deref() {
        let rendered = output::render(&result.report, run.output_format);
        write_output(path, &rendered).await?;
    }

    println!();
    println!(
        ":: Completed :: {} requests ({} failed) in {:.2}s ::",
        result.report.run.completed,
        result.report.run.failed,
        result.elapsed.as_secs_f64()
    );

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));

    if args.init_config {
        let path = user_config_path
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine config path".to_string())?;
        if config::ensure_default_config_file(&path)? {
            format_kv_line("Config", &format!("wrote {}", path.display()));
        } else {
            format_kv_line("Config", &format!("{} already exists", path.display()));
        }
        return Ok(());
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    logger::init_logging(run.verbose, run.no_color);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(run.workers)
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
