mod cli;

use junoprep::{Options, Preprocessed};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("JUNOPREP_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Preprocess(preprocess_cli) => preprocess(preprocess_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn preprocess(cli: cli::PreprocessCommand) -> anyhow::Result<()> {
    let lines = load(&cli.input)?;
    let options = Options {
        max_inheritance_passes: cli.options.max_passes,
        expand_apply_path: !cli.options.no_apply_path,
        expand_wildcards: !cli.options.no_wildcards,
        ..Options::default()
    };
    anyhow::ensure!(options.max_inheritance_passes > 0, "--max-passes must be at least 1");

    let preprocessed = junoprep::preprocess(lines, &options)?;
    output(&cli.output, &preprocessed)?;
    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Vec<junoprep::statement::Line>> {
    let text = match &input.file {
        Some(file_path) => {
            tracing::info!(path=%file_path.display(), "loading file");
            std::fs::read_to_string(file_path)?
        }
        None => std::io::read_to_string(std::io::stdin())?,
    };

    Ok(junoprep::statement::read(&text))
}

fn output(output: &cli::OutputArgs, preprocessed: &Preprocessed) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Set => {
            print!("{preprocessed}");
            for issue in &preprocessed.issues {
                eprintln!("{}: {issue}", issue.severity());
            }
        }
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), preprocessed)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), preprocessed)?,
    };

    Ok(())
}

/// (junoprep-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let lines = load(&cli.input)?;

    match cli.command {
        Lines => println!("{lines:#?}"),
        Tree { group, deactivated } => {
            let preprocessed = junoprep::preprocess(lines, &Options::default())?;
            let hierarchy = &preprocessed.hierarchy;
            let tree = match (&group, deactivated) {
                (Some(name), _) => hierarchy
                    .group(name)
                    .ok_or_else(|| anyhow::anyhow!("no such group: {name}"))?,
                (None, true) => hierarchy.deactivation_tree(),
                (None, false) => hierarchy.master(),
            };
            print!("{}", tree.to_set_lines(""));
        }
    }

    Ok(())
}
