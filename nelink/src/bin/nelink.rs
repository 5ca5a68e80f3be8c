//! Run commands on a network element from the command line.
//!
//! ```bash
//! nelink 10.0.0.7 --kind pss --username admin --password secret "show version" "show card"
//! RUST_LOG=debug nelink 10.0.0.9 --kind sros "show router interface"
//! ```

use clap::Parser;
use nelink::{Command, DeviceKind, Endpoint};

#[derive(Parser, Debug)]
#[command(name = "nelink", version, about = "Run CLI commands on a network element over SSH")]
struct Args {
    /// Device IPv4 address
    address: String,

    /// Commands to run, in order
    #[arg(required = true)]
    commands: Vec<String>,

    /// SSH port; unusable values fall back to 22
    #[arg(short, long, default_value = "22")]
    port: String,

    /// Device kind selector (bash, pss, psd, gmre, sros, pss23.6, ose)
    #[arg(short, long)]
    kind: DeviceKind,

    /// Login username
    #[arg(short, long, default_value = "")]
    username: String,

    /// Login password
    #[arg(long, env = "NELINK_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Dial the local end of a tunnel (127.0.0.1) instead of the address
    #[arg(long)]
    tunnel: bool,

    /// Extra regex that also ends every command
    #[arg(long)]
    prompt: Option<String>,

    /// Display name for the device
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let mut builder = Endpoint::builder(&args.address)
        .port(&args.port)
        .username(&args.username)
        .password(args.password.as_str())
        .kind(args.kind)
        .via_tunnel(args.tunnel);
    if let Some(name) = &args.name {
        builder = builder.name(name);
    }
    let mut endpoint = builder.build()?;

    let commands = args
        .commands
        .iter()
        .map(|line| match &args.prompt {
            Some(prompt) => Command::new(line.as_str()).with_prompt(prompt),
            None => Ok(Command::new(line.as_str())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    endpoint.connect().await?;
    let label = endpoint.name().unwrap_or(endpoint.address()).to_string();

    let result = endpoint.run(commands).await;
    endpoint.disconnect().await;

    for (command, output) in result? {
        println!("=== {label}: {command}");
        print!("{output}");
        if !output.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
