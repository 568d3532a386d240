use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use tourguide_dom::SelectorEvaluator;
use tourguide_registry::{
    parse_tours, tour_files, Registry, RegistryError, RegistryImpl, TourDefinition,
};
use tracing::warn;

use super::context::CliContext;
use super::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Tour files or directories (default: `tour_paths` from the config)
    pub paths: Vec<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    /// Tour files or directories (default: `tour_paths` from the config)
    pub paths: Vec<PathBuf>,

    /// Only check that files load; skip compiling trigger selectors
    #[arg(long)]
    pub no_selectors: bool,
}

#[derive(Debug, Serialize)]
struct TourSummary {
    name: String,
    steps: usize,
    url: String,
    skip_enabled: bool,
}

impl From<&TourDefinition> for TourSummary {
    fn from(tour: &TourDefinition) -> Self {
        Self {
            name: tour.name.clone(),
            steps: tour.len(),
            url: tour.options.url.clone(),
            skip_enabled: tour.options.skip_enabled,
        }
    }
}

pub fn cmd_list(args: ListArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let paths = ctx.tour_paths(&args.paths);
    let registry = ctx.load_registry(&paths)?;
    let mut tours = Vec::new();
    for name in registry.list() {
        let tour = registry.get(&name)?;
        tours.push(TourSummary::from(tour.as_ref()));
    }

    match output {
        OutputFormat::Json => print_json(&tours)?,
        OutputFormat::Human => {
            if tours.is_empty() {
                println!("No tours found");
            }
            for tour in &tours {
                let url = if tour.url.is_empty() { "-" } else { &tour.url };
                let skip = if tour.skip_enabled { ", skippable" } else { "" };
                println!("{:<32} {:>3} steps  {}{}", tour.name, tour.steps, url, skip);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    tours: Vec<String>,
    problems: Vec<String>,
}

pub fn cmd_validate(args: ValidateArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let evaluator = (!args.no_selectors).then(SelectorEvaluator::new);
    let mut reports = Vec::new();
    for path in ctx.tour_paths(&args.paths) {
        match tour_files(&path) {
            Ok(files) => {
                for file in files {
                    reports.push(validate_file(&file, evaluator.as_ref()));
                }
            }
            Err(err) => reports.push(FileReport {
                file: path.display().to_string(),
                tours: Vec::new(),
                problems: vec![err.to_string()],
            }),
        }
    }

    let failed = reports.iter().filter(|r| !r.problems.is_empty()).count();
    match output {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Human => {
            for report in &reports {
                if report.problems.is_empty() {
                    println!("ok      {} ({} tours)", report.file, report.tours.len());
                } else {
                    println!("FAILED  {}", report.file);
                    for problem in &report.problems {
                        println!("        - {}", problem);
                    }
                }
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} tour files failed validation", failed, reports.len());
    }
    Ok(())
}

/// Check one file in isolation: it must parse, every tour must register,
/// and (optionally) every trigger must compile as a selector.
fn validate_file(file: &Path, evaluator: Option<&SelectorEvaluator>) -> FileReport {
    let origin = file.display().to_string();
    let mut report = FileReport {
        file: origin.clone(),
        tours: Vec::new(),
        problems: Vec::new(),
    };
    let tours = match fs::read_to_string(file)
        .map_err(|err| RegistryError::Load {
            origin: origin.clone(),
            reason: err.to_string(),
        })
        .and_then(|source| parse_tours(&source, &origin))
    {
        Ok(tours) => tours,
        Err(err) => {
            report.problems.push(err.to_string());
            return report;
        }
    };

    let registry = RegistryImpl::new();
    for tour in tours {
        if registry.contains(&tour.name) {
            warn!(tour = %tour.name, file = %origin, "tour defined twice in one file");
            report
                .problems
                .push(format!("tour {} is defined more than once", tour.name));
        }
        if let Some(evaluator) = evaluator {
            for (index, step) in tour.steps.iter().enumerate() {
                let predicates = std::iter::once(&step.trigger).chain(step.extra_trigger.as_ref());
                for predicate in predicates.filter(|p| !p.is_blank()) {
                    if let Err(err) = evaluator.compile(predicate) {
                        report
                            .problems
                            .push(format!("tour {}: step {}: {}", tour.name, index, err));
                    }
                }
            }
        }
        match registry.register(&tour.name, tour.options, tour.steps) {
            Ok(definition) => report.tours.push(definition.name.clone()),
            Err(err) => report.problems.push(err.to_string()),
        }
    }
    report
}
