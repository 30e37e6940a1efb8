use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "stressprobe",
    version,
    about = "concurrent HTTP load and security probe tool",
    long_about = "Stressprobe issues a fixed number of GET requests against a target server with bounded concurrency, then reports latency percentiles and status-code distributions per path group.\nWith --security it also sends path traversal, well-known sensitive file and special-character paths and reports how many were blocked.\n\nExamples:\n  stressprobe -u http://localhost:8270\n  stressprobe -u http://localhost:8270 -n 5000 -c 50 --pages index.html about.html\n  stressprobe -u https://target.tld --security -o report.json\n\nTip: Use --config to persist run settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        long = "no-color",
        visible_alias = "nc",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output",
        visible_alias = "out",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the report to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "output-format",
        visible_alias = "of",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Report file format (text, json, xml). Inferred from the file extension when omitted."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        help_heading = "Target",
        help = "Server base URL (defaults to http://localhost:8270)."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'p',
        long = "pages",
        value_name = "PAGE",
        num_args = 1..,
        value_delimiter = ',',
        action = ArgAction::Append,
        help_heading = "Target",
        help = "Pages to test, relative to the base URL (space or comma separated, repeatable)."
    )]
    pub pages: Vec<String>,

    #[arg(
        short = 's',
        long = "security",
        help_heading = "Target",
        help = "Also send path traversal, sensitive file, special character and random paths."
    )]
    pub security: bool,

    #[arg(
        long = "random-paths",
        visible_alias = "rp",
        value_name = "N",
        help_heading = "Target",
        help = "Number of random long paths generated in security mode."
    )]
    pub random_paths: Option<usize>,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.stressprobe/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a default config file to the config path and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'n',
        long = "requests",
        visible_alias = "num-requests",
        value_name = "N",
        help_heading = "Load",
        help = "Total number of requests to send."
    )]
    pub requests: Option<usize>,

    #[arg(
        short = 'c',
        long = "concurrency",
        visible_alias = "cnc",
        value_name = "N",
        help_heading = "Load",
        help = "Max in-flight requests."
    )]
    pub concurrency: Option<usize>,

    #[arg(
        short = 'r',
        long = "rate",
        value_name = "RPS",
        help_heading = "Load",
        help = "Request rate limit (requests per second). Unlimited by default."
    )]
    pub rate: Option<u32>,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        help_heading = "Load",
        help = "Dispatch strategy: pool (steady worker pool) or waves (fixed batches of 2x concurrency)."
    )]
    pub strategy: Option<String>,

    #[arg(
        short = 'w',
        long = "workers",
        visible_alias = "wrk",
        value_name = "N",
        help_heading = "Load",
        help = "Number of runtime worker threads."
    )]
    pub workers: Option<usize>,

    #[arg(
        short = 'T',
        long = "timeout",
        visible_alias = "to",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'F',
        long = "follow-redirects",
        visible_alias = "frd",
        help_heading = "HTTP",
        help = "Follow HTTP redirects instead of recording the 3xx status."
    )]
    pub follow_redirects: bool,
}
