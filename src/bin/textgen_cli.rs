//! textgen-cli — 把任意 shell 命令包装成带缓存的文本生成器
//!
//! Usage:
//!   textgen-cli generate --cmd <shell> [OPTIONS] [TEXT...]   Run a prompt through a command
//!   textgen-cli count [--role <role>] [TEXT...]              Estimate prompt tokens
//!
//! The prompt is written to the command's stdin; its stdout becomes the response.

use ai_lib_textgen::generator::BoxError;
use ai_lib_textgen::tokens::{CharacterEstimator, TokenCounter};
use ai_lib_textgen::{
    GenerationConfig, GeneratorSettings, Message, Prompt, TextGenerationFunction, TextGenerator,
};
use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "generate" => cmd_generate(&args[2..]).await,
        "count" => cmd_count(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("textgen-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"textgen-cli — wrap any shell command as a cached text generator

USAGE:
    textgen-cli <COMMAND> [OPTIONS] [TEXT...]

COMMANDS:
    generate        Format the prompt, run it through --cmd, print the response JSON
    count           Print the estimated token count of the prompt
    version         Show version information
    help            Show this help message

OPTIONS:
    --cmd <shell>        Command that reads the prompt on stdin (generate only)
    --role <role>        Role for TEXT (default: user)
    --system <text>      Prepend a system message
    --raw                Send TEXT verbatim instead of formatting it as messages
    --no-cache           Bypass the response cache
    --cache-dir <dir>    Use a disk cache in <dir>
    --config <file>      YAML generator settings

TEXT defaults to stdin when omitted.

ENVIRONMENT:
    AI_LIB_TEXTGEN_CONFIG    Settings file used when --config is absent
    RUST_LOG                 Log filter (e.g. ai_lib_textgen=debug)"#
    );
}

#[derive(Debug, Default)]
struct Options {
    cmd: Option<String>,
    role: Option<String>,
    system: Option<String>,
    raw: bool,
    no_cache: bool,
    cache_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    text: Vec<String>,
}

fn parse_options(args: &[String]) -> anyhow::Result<Options> {
    let mut opts = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{name} requires a value"))
        };
        match arg.as_str() {
            "--cmd" => opts.cmd = Some(value("--cmd")?),
            "--role" => opts.role = Some(value("--role")?),
            "--system" => opts.system = Some(value("--system")?),
            "--cache-dir" => opts.cache_dir = Some(PathBuf::from(value("--cache-dir")?)),
            "--config" => opts.config = Some(PathBuf::from(value("--config")?)),
            "--raw" => opts.raw = true,
            "--no-cache" => opts.no_cache = true,
            flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
            text => opts.text.push(text.to_string()),
        }
    }
    Ok(opts)
}

async fn read_prompt(opts: &Options) -> anyhow::Result<Prompt> {
    let text = if opts.text.is_empty() {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("reading prompt from stdin")?;
        buf
    } else {
        opts.text.join(" ")
    };

    if opts.raw {
        return Ok(Prompt::Text(text));
    }
    let mut messages = Vec::new();
    if let Some(ref system) = opts.system {
        messages.push(Message::system(system.clone()));
    }
    messages.push(Message::new(
        opts.role.clone().unwrap_or_else(|| "user".to_string()),
        text.trim_end().to_string(),
    ));
    Ok(Prompt::Messages(messages))
}

fn load_settings(opts: &Options) -> anyhow::Result<GeneratorSettings> {
    let mut settings = match opts.config {
        Some(ref path) => GeneratorSettings::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GeneratorSettings::from_env()?,
    };
    if let Some(ref dir) = opts.cache_dir {
        settings.cache.backend = ai_lib_textgen::settings::CacheBackendSettings::Disk { dir: dir.clone() };
    }
    Ok(settings)
}

async fn cmd_generate(args: &[String]) -> anyhow::Result<()> {
    let opts = parse_options(args)?;
    let Some(cmd) = opts.cmd.clone() else {
        bail!("generate requires --cmd <shell>");
    };
    let settings = load_settings(&opts)?;
    let prompt = read_prompt(&opts).await?;

    let generator = settings.builder(ShellCommand { cmd }).await?.build();
    let config = GenerationConfig::default().with_cache(!opts.no_cache);
    let response = generator.generate(&prompt, &config).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn cmd_count(args: &[String]) -> anyhow::Result<()> {
    let opts = parse_options(args)?;
    let settings = load_settings(&opts)?;
    let prompt = read_prompt(&opts).await?;
    let counter = CharacterEstimator::with_ratio(settings.tokens.chars_per_token);
    println!("{}", counter.count_prompt(&prompt));
    Ok(())
}

/// Runs `sh -c <cmd>` with the prompt on stdin and returns its stdout.
struct ShellCommand {
    cmd: String,
}

#[async_trait]
impl TextGenerationFunction for ShellCommand {
    async fn generate_text(&self, prompt: &str) -> Result<String, BoxError> {
        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.cmd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).await?;
        }
        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(format!("`{}` exited with {}", self.cmd, output.status).into());
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}
