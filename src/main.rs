use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs::File;
use std::path::PathBuf;

use timetable_solver::config::{ServerConfig, SolveConfig, Weights};
use timetable_solver::generator::{Generator, GeneratorConfig};
use timetable_solver::observe::LogObserver;
use timetable_solver::solver::SolveSession;
use timetable_solver::{loader, report, server};

#[derive(Parser)]
#[command(name = "timetable_solver")]
#[command(about = "School timetabling with a mixed-integer model")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP solve endpoint (default).
    Serve,

    /// Solve the CSV data in a directory and print the schedule.
    Solve {
        /// Directory holding teachers.csv, classes.csv, rooms.csv and time_slots.csv
        dir: PathBuf,
        /// Weight of the teacher gap objective
        #[arg(long, default_value = "1.0")]
        gaps: f64,
        /// Weight of the workload balance objective
        #[arg(long)]
        workload: Option<f64>,
        /// Weight of the class distribution objective
        #[arg(long)]
        distribution: Option<f64>,
        /// Time budget in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
        /// Only teachers listing a class's subject may teach it
        #[arg(long)]
        qualified_only: bool,
        /// Write the schedule as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write synthetic CSV data into a directory.
    Generate {
        dir: PathBuf,
        /// Use the full-size preset instead of the small one
        #[arg(long)]
        full: bool,
        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            server::run_server(ServerConfig::from_env()).await?;
        }

        Commands::Solve {
            dir,
            gaps,
            workload,
            distribution,
            timeout,
            qualified_only,
            output,
        } => {
            let timetable = loader::load_dir(&dir)
                .with_context(|| format!("loading {}", dir.display()))?;
            let mut config = SolveConfig::with_weights(Weights {
                gaps: Some(gaps),
                workload,
                distribution,
            });
            config.timeout_secs = timeout;
            config.extensions.subject_qualification = qualified_only;

            let mut session = SolveSession::new(&timetable, config)?;
            let solved = session.run(&LogObserver)?;
            info!(
                "{:?} solution, objective {:.2}, {} assignments",
                solved.status,
                solved.objective,
                solved.assignments.len()
            );

            let schedule = session.schedule()?;
            print!("{schedule}");

            let stats = report::statistics(&schedule);
            println!("Total classes: {}", stats.total_classes);
            println!("Average classes per day: {:.2}", stats.avg_classes_per_day);
            println!(
                "Teacher workload: max {}, min {}",
                stats.max_teacher_workload, stats.min_teacher_workload
            );
            println!("Teacher gaps: {}", report::count_gaps(&schedule));

            if let Some(path) = output {
                let file = File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                report::export_csv(&schedule, file)?;
                info!("Schedule written to {}", path.display());
            }
        }

        Commands::Generate { dir, full, seed } => {
            let preset = if full {
                GeneratorConfig::full()
            } else {
                GeneratorConfig::small()
            };
            let input = Generator::new(preset, seed).write_dir(&dir)?;
            println!(
                "Generated {} teachers, {} classes and {} rooms in {}",
                input.teachers.len(),
                input.classes.len(),
                input.rooms.len(),
                dir.display()
            );
        }
    }

    Ok(())
}
