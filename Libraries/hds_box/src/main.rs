use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, Layer};

use hds_box::reader::read_file;
use hds_box::writer::{
    create_bootstrap, create_fragment, create_media_segment, BootstrapConfig, FragmentConfig,
};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
enum LogLevel {
    Trace = 0, // Designates very fine-grained informational events, extremely verbose.
    Debug = 1, // Designates fine-grained informational events.
    Info = 2, // Designates informational messages.
    Warn = 3, // Designates hazardous situations.
    Error = 4, // Designates very serious errors.
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pretty-print every top-level box of a file
    Dump {
        file: PathBuf,
    },
    /// Write a bootstrap info box described by a JSON file
    Bootstrap {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write a movie fragment described by a JSON file
    Fragment {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Media data to append in an mdat box; the run's data offset points at it
        #[arg(short, long)]
        payload: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(author, version, about = "hds-box")]
struct Args {
    // Set the log level (possible values: error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_filter(match args.log_level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        });
    let subscriber = tracing_subscriber::registry().with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(e) = run(args.command) {
        error!("{}", e);
        return Err(e);
    }
    Ok(())
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Dump { file } => {
            let boxes = read_file(&file)?;
            info!("Read {} top-level boxes from {}", boxes.len(), file.display());
            for mut b in boxes {
                print!("{}", b.to_pretty_string(0));
            }
        }
        Command::Bootstrap { config, output } => {
            let config = BootstrapConfig::from_file(&config)?;
            let abst = create_bootstrap(&config);
            fs::write(&output, abst.as_box())?;
            info!("Wrote {} byte bootstrap box to {}", abst.boxed_size(), output.display());
        }
        Command::Fragment {
            config,
            output,
            payload,
        } => {
            let config = FragmentConfig::from_file(&config)?;
            let data = match payload {
                Some(payload) => create_media_segment(&config, &fs::read(payload)?),
                None => create_fragment(&config).as_box().to_vec(),
            };
            fs::write(&output, &data)?;
            info!("Wrote {} byte fragment to {}", data.len(), output.display());
        }
    }
    Ok(())
}
