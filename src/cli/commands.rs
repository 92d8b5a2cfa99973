//! Command dispatch

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{PruneService, PrunedQuestion};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{Pruner, Question};
use crate::infrastructure::traits::read_stdin;
use crate::infrastructure::{InfraError, RealFileSystem};
use crate::tree_traits::{LabelStyle, TreeNodeConvert};

pub fn execute(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Prune {
            input,
            tags,
            report,
        }) => cmd_prune(cli, input, *tags, *report),
        Some(Commands::Show { input, tags }) => cmd_show(cli, input, *tags),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            cmd_completion(*shell);
            Ok(())
        }
        None => Err(CliError::Usage("no command given, see --help".into())),
    }
}

fn build_service(settings: &Settings) -> PruneService {
    let pruner = Pruner::new(settings.pruner.to_options());
    debug!("build_service: {:?}", pruner.options());
    PruneService::new(Arc::new(RealFileSystem), pruner)
}

fn style(tags: bool) -> LabelStyle {
    if tags {
        LabelStyle::Tagged
    } else {
        LabelStyle::Plain
    }
}

fn read_questions(service: &PruneService, input: &Path) -> CliResult<Vec<Question>> {
    if Cli::is_stdin(input) {
        let text = read_stdin().map_err(|e| InfraError::io("read stdin", e))?;
        Ok(service.parse_questions(&text)?)
    } else if input.is_dir() {
        Err(CliError::InvalidArgs(format!(
            "{} is a directory, expected a token table file",
            input.display()
        )))
    } else {
        Ok(service.read_questions(input)?)
    }
}

#[instrument(skip(cli))]
fn cmd_prune(cli: &Cli, input: &Path, tags: bool, report: bool) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let service = build_service(&settings);
    let questions = read_questions(&service, input)?;
    debug!("cmd_prune: {} questions", questions.len());

    let pruned = service.prune_all(questions)?;
    let style = style(tags || settings.output.show_tags);
    let report = report || settings.output.report;
    for item in &pruned {
        print_pruned(item, style, report);
    }
    Ok(())
}

fn print_pruned(item: &PrunedQuestion, style: LabelStyle, report: bool) {
    let PrunedQuestion { question, report: stats } = item;
    output::header(question.display_name());
    output::info(&question.tree.to_tree_string_with(style));
    if stats.is_empty_result() {
        output::warning(&format!(
            "'{}' was pruned to an empty tree",
            question.display_name()
        ));
    }
    if !report {
        return;
    }

    let counts = stats
        .stages
        .iter()
        .filter(|s| s.removed > 0)
        .map(|s| format!("{}={}", s.stage, s.removed))
        .join(", ");
    output::detail(&format!(
        "nodes {} -> {}, depth {} -> {}{}{}",
        stats.nodes_before,
        stats.nodes_after,
        stats.depth_before,
        stats.depth_after,
        if counts.is_empty() { "" } else { ": " },
        counts
    ));
    for (modifier, merged) in &stats.merged_modifiers {
        output::diff_add(&format!("{} => {}", modifier, merged));
    }
    for modifier in &stats.discarded_modifiers {
        output::diff_remove(modifier);
    }
}

#[instrument(skip(cli))]
fn cmd_show(cli: &Cli, input: &Path, tags: bool) -> CliResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let service = build_service(&settings);
    let style = style(tags || settings.output.show_tags);
    for question in read_questions(&service, input)? {
        debug!(
            "cmd_show: {} leaves: {}",
            question.display_name(),
            question.tree.leaf_nodes().join(" ")
        );
        output::header(question.display_name());
        output::info(&question.tree.to_tree_string_with(style));
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory available on this platform"),
        },
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
