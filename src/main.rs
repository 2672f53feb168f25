use argh::FromArgs;
use smallsh::{Interpreter, io_adapters, signals};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(FromArgs, Debug)]
/// A small interactive shell with `cd`, `status` and `exit` built in.
struct Args {
    /// increase log verbosity on stderr; repeat for more detail.
    #[argh(switch, short = 'v')]
    verbose: i32,

    /// do not keep a line editing history.
    #[argh(switch)]
    no_history: bool,
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", args);

    // rustyline takes over SIGINT when it attaches to a terminal, so it goes first.
    let mut source = io_adapters::stdin_source(!args.no_history)?;
    signals::install_shell_handlers()?;
    let mut interpreter = Interpreter::default();

    match interpreter.run(source.as_mut()) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "shell terminated");
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
