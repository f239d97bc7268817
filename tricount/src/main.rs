use clap::Parser;

mod exact;
mod merge;
mod oracle;
mod preprocess;
mod results;
mod run;
mod stream;

#[derive(Parser, Debug)]
#[command(
    name = "tricount",
    about = "Approximate triangle counting over edge streams",
    version
)]
enum Command {
    /// Estimate triangle counts with a bounded-memory sampler
    Run(run::Opts),
    /// Count triangles exactly, as the reference answer
    Exact(exact::Opts),
    /// Build a heaviness predictor from a preprocessed stream
    Oracle(oracle::Opts),
    /// Normalize a raw edge list into `u v t` form
    Preprocess(preprocess::Opts),
    /// Merge graph snapshots into one fully-dynamic stream
    Merge(merge::Opts),
}

fn main() {
    flexi_logger::Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
        .unwrap_or_else(|e| panic!("Logger initialization failed with {e}"));

    let result = match Command::parse() {
        Command::Run(opts) => run::run(opts),
        Command::Exact(opts) => exact::run(opts),
        Command::Oracle(opts) => oracle::run(opts),
        Command::Preprocess(opts) => preprocess::run(opts),
        Command::Merge(opts) => merge::run(opts),
    };

    if let Err(e) = result {
        println!("Error: {e}");
        for cause in e.chain().skip(1) {
            println!("\tcaused by: {cause}");
        }
        std::process::exit(1);
    }
}
