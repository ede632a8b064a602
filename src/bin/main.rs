use std::{
    error::Error,
    io::{self, BufRead},
    sync::Arc,
    thread,
};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use craftd::{
    cli::{Cli, Commands, parse_args},
    config::{LaunchConfig, load_launch_config},
    error::SupervisorError,
    supervisor::Supervisor,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args();
    init_logging(&args);

    match args.command {
        Commands::Run { config } => {
            let config = load_launch_config(&config)?;
            config.validate()?;
            run_console(config)?;
        }
        Commands::Check { config } => {
            let config = load_launch_config(&config)?;
            config.validate()?;
            println!("launch command: {}", config.launch_args().join(" "));
            println!("working directory: {}", config.server_dir().display());
        }
    }

    Ok(())
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Runs the interactive console: server output is printed as it arrives,
/// typed lines are forwarded to the server, and `:`-prefixed lines are
/// control directives handled by the supervisor itself.
fn run_console(config: LaunchConfig) -> Result<(), Box<dyn Error>> {
    let supervisor = Arc::new(Supervisor::new());

    let output_rx = supervisor.subscribe_output();
    thread::spawn(move || {
        for event in output_rx {
            println!("[{}] {}", event.timestamp.format("%H:%M:%S"), event.text);
        }
    });

    let termination_rx = supervisor.subscribe_termination();
    thread::spawn(move || {
        for event in termination_rx {
            match (event.expected, event.exit_code) {
                (true, Some(code)) => info!("Server stopped (exit code {code})"),
                (true, None) => info!("Server stopped"),
                (false, code) => warn!(
                    "Server terminated unexpectedly (exit code {:?}); check the output above",
                    code
                ),
            }
        }
    });

    {
        let supervisor = Arc::clone(&supervisor);
        ctrlc::set_handler(move || {
            println!("craftd is shutting down...");
            let _ = supervisor.stop();
            std::process::exit(0);
        })?;
    }

    supervisor.start(&config)?;
    println!("Type server commands, or :stop / :start / :restart / :status / :quit");

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":exit" => break,
            ":status" => println!("server is {}", supervisor.status()),
            ":start" => report(supervisor.start(&config)),
            ":stop" => report(supervisor.stop()),
            ":restart" => report(supervisor.restart(&config)),
            directive if directive.starts_with(':') => {
                eprintln!("unknown directive '{directive}'");
            }
            command => {
                if let Err(err) = supervisor.send_command(command) {
                    error!("{err}");
                }
            }
        }
    }

    if supervisor.status().is_active() {
        supervisor.stop()?;
    }
    Ok(())
}

fn report(result: Result<(), SupervisorError>) {
    if let Err(err) = result {
        error!("{err}");
    }
}
