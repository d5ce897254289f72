use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use dm2influx_core::{
    derive, entries_path, load_entries, HttpSink, OutputShape, Policy, Publisher, Row,
    TaggedShape, WideShape,
};

#[derive(Parser, Debug)]
#[command(
    name = "dm2influx",
    about = "Republish a local dailymile entry log into InfluxDB",
    long_about = None
)]
struct Cli {
    /// dailymile username
    #[arg(short = 'u')]
    user: Option<String>,

    /// Destination database name
    #[arg(short = 'd', default_value = "dailymile")]
    database: String,

    /// Max number of records to insert into the database (-1 = unbounded)
    #[arg(short = 'm', default_value_t = -1, allow_hyphen_values = true)]
    max_records: i64,

    /// Comma-delimited workout-type allow-list ("" = all types)
    #[arg(short = 't', default_value = "")]
    types: String,

    /// Output payload layout
    #[arg(long, value_enum, default_value_t = Shape::Wide)]
    shape: Shape,

    /// InfluxDB base URL
    #[arg(long, default_value = "http://localhost:8086")]
    url: String,

    /// InfluxDB username
    #[arg(long, default_value = "root")]
    influx_user: String,

    /// InfluxDB password
    #[arg(long, default_value = "root")]
    influx_password: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Shape {
    /// Three per-user series, one per metric (legacy)
    Wide,
    /// One `workout` measurement tagged with user and type
    Tagged,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // A missing or empty username is a usage request, not a failure.
    let user = match cli.user.as_deref() {
        Some(u) if !u.is_empty() => u.to_string(),
        _ => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not resolve home directory"))?;
    let log = load_entries(&entries_path(&home, &user))?;

    let policy = Policy::from_args(&cli.types, cli.max_records);
    let selected = policy.select(&log.entries);

    let mut rows = Vec::with_capacity(selected.len());
    for entry in selected {
        rows.push(Row {
            time: entry.time()?,
            activity_type: entry.workout.activity_type.clone(),
            metrics: derive(entry),
        });
    }

    let shape: Box<dyn OutputShape> = match cli.shape {
        Shape::Wide => Box::new(WideShape),
        Shape::Tagged => Box::new(TaggedShape),
    };

    let sink = HttpSink::new(&cli.url, &cli.influx_user, &cli.influx_password);
    let publisher = Publisher::new(&sink, cli.database);
    publisher.publish(shape.as_ref(), &user, &rows)?;

    println!("Published {} entries for {}", rows.len(), user);
    Ok(())
}
