//! `ailmi` command line.
//!
//! Reads JSON inputs, runs the model components and writes JSON reports.
//! Logs go to stderr so stdout can be piped.

use ailmi::economic::impact::NewsArticle;
use ailmi::economic::tables::RatePair;
use ailmi::economic::{
    BaselineRate, EmploymentMatrix, ImpactCalculator, ImpactInputs, ImpactResult,
    IndustryAggregator, IndustryEmployment, IndustryRate, MappingResults, MappingValidator,
    MonteCarloEngine, OccupationExtractor, OccupationImpactReport, ProjectionEngine, Scenario,
    SocCodeMapper, ValidationReport,
};
use ailmi::Config;
use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ailmi", version)]
#[command(about = "AI Labor Market Impact Index", long_about = None)]
struct Cli {
    /// Config file (default: <config_dir>/ailmi/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Standardize SOC codes and show their group defaults
    Soc {
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Extract occupation impact records from raw third-party data
    Extract {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate occupation impacts to industry rates and validate them
    Map {
        /// Output of `extract`
        #[arg(long)]
        impacts: PathBuf,
        /// Employment matrix (industry -> SOC -> employment); estimated when absent
        #[arg(long)]
        employment: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate industry rates, optionally against a baseline
    Validate {
        rates: PathBuf,
        #[arg(long)]
        baseline: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the point-in-time impact
    Impact {
        #[command(flatten)]
        inputs: ImpactArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Project an impact result forward under adoption scenarios
    Project {
        impact: PathBuf,
        #[arg(long)]
        years: Option<u32>,
        #[arg(long = "scenario")]
        scenarios: Vec<Scenario>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Monte Carlo confidence intervals for an impact result
    Confidence {
        impact: PathBuf,
        #[arg(long)]
        years: Option<u32>,
        #[arg(long)]
        runs: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the whole pipeline and write every report
    Run {
        /// Raw occupation data
        #[arg(long)]
        occupations: PathBuf,
        /// Employment matrix (industry -> SOC -> employment)
        #[arg(long)]
        matrix: Option<PathBuf>,
        #[command(flatten)]
        inputs: ImpactArgs,
        #[arg(long)]
        seed: Option<u64>,
        /// Defaults to `output.dir` from the config
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ImpactArgs {
    /// Industry employment snapshot ({"industries": {name: {current, previous}}})
    #[arg(long)]
    employment: PathBuf,
    /// Output of `map` (used for occupation-weighted displacement)
    #[arg(long)]
    rates: Option<PathBuf>,
    /// Output of `extract` (average rates for the uniform fallback)
    #[arg(long = "occupation-report")]
    occupation_report: Option<PathBuf>,
    /// AI job postings ({"total_ai_postings": n})
    #[arg(long)]
    jobs: Option<PathBuf>,
    /// News articles ({"articles": [{title, description}]})
    #[arg(long)]
    news: Option<PathBuf>,
    /// Reporting period as YYYY-MM (default: current month)
    #[arg(long)]
    date: Option<String>,
}

#[derive(Serialize)]
struct MapOutput<'a> {
    mapping: &'a MappingResults,
    validation: &'a ValidationReport,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load_or_default(cli.config.as_deref())?;
    let tables = config.tables();
    let pretty = config.output.pretty;

    match cli.command {
        Commands::Soc { codes } => {
            let mapper = SocCodeMapper::new(tables.soc_groups.clone());
            let rows: Vec<Value> = codes
                .iter()
                .map(|raw| {
                    let code = mapper.standardize(raw);
                    serde_json::json!({
                        "input": raw,
                        "soc_code": code,
                        "major_group": mapper.major_group_name(raw),
                        "defaults": mapper.ai_susceptibility_defaults(raw),
                    })
                })
                .collect();
            emit(&rows, None, pretty)?;
        }
        Commands::Extract { input, output } => {
            let extractor = OccupationExtractor::new(SocCodeMapper::new(tables.soc_groups.clone()));
            let report = extractor.process(&read_json(&input)?)?;
            let validation = extractor.validate_processed(&report)?;
            tracing::info!(
                passed = validation.validation_passed,
                quality_score = validation.quality_score,
                "extraction validation"
            );
            emit(&report, output.as_deref(), pretty)?;
            if report.error.is_some() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Map {
            impacts,
            employment,
            output,
        } => {
            let report: OccupationImpactReport = read_json_as(&impacts)?;
            let matrix = load_matrix(employment.as_deref())?;
            let mapper = SocCodeMapper::new(tables.soc_groups.clone());
            let mapping = IndustryAggregator::new(&mapper, &tables.industries)
                .map(&matrix, &report.occupation_impacts)?;
            let validation = MappingValidator::new(&tables.industries).validate(&mapping.industry_rates);
            emit(
                &MapOutput {
                    mapping: &mapping,
                    validation: &validation,
                },
                output.as_deref(),
                pretty,
            )?;
        }
        Commands::Validate {
            rates,
            baseline,
            output,
        } => {
            let rates = load_rates(&rates)?;
            let validator = MappingValidator::new(&tables.industries);
            let mut report = validator.validate(&rates);
            if let Some(path) = baseline {
                let baseline: BTreeMap<String, BaselineRate> =
                    serde_json::from_value(industry_rates_value(read_json(&path)?))
                        .with_context(|| format!("invalid baseline rates in {}", path.display()))?;
                report.baseline_comparison = Some(validator.compare_with_baseline(&rates, &baseline));
            }
            emit(&report, output.as_deref(), pretty)?;
            if !report.validation_passed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Impact { inputs, output } => {
            let inputs = impact_inputs(&inputs, &config, None, None)?;
            let result = ImpactCalculator::new(&tables).calculate_net_impact(&inputs)?;
            emit(&result, output.as_deref(), pretty)?;
            if !result.validation.validation_passed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Project {
            impact,
            years,
            scenarios,
            output,
        } => {
            let impact: ImpactResult = read_json_as(&impact)?;
            let scenarios = if scenarios.is_empty() {
                config.projection.scenarios.clone()
            } else {
                scenarios
            };
            let engine = ProjectionEngine::new(&tables, years.unwrap_or(config.projection.years))?;
            let report = engine.generate(&impact, &scenarios)?;
            emit(&report, output.as_deref(), pretty)?;
        }
        Commands::Confidence {
            impact,
            years,
            runs,
            seed,
            output,
        } => {
            let impact: ImpactResult = read_json_as(&impact)?;
            let engine = MonteCarloEngine::new(
                &tables.perturbation,
                runs.unwrap_or(config.simulation.runs),
            )?;
            let mut rng = make_rng(seed.or(config.simulation.seed));
            let report = engine.run(&impact, years.unwrap_or(config.projection.years), &mut rng)?;
            emit(&report, output.as_deref(), pretty)?;
        }
        Commands::Run {
            occupations,
            matrix,
            inputs,
            seed,
            output_dir,
        } => {
            let dir = output_dir.unwrap_or_else(|| config.output_dir());
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create output directory {}", dir.display()))?;

            let mapper = SocCodeMapper::new(tables.soc_groups.clone());
            let extractor = OccupationExtractor::new(mapper.clone());
            let report = extractor.process(&read_json(&occupations)?)?;
            if let Some(err) = &report.error {
                bail!("occupation extraction failed: {err}");
            }
            emit(&report, Some(dir.join("occupation_impacts.json").as_path()), pretty)?;

            let matrix = load_matrix(matrix.as_deref())?;
            let mapping = IndustryAggregator::new(&mapper, &tables.industries)
                .map(&matrix, &report.occupation_impacts)?;
            let validation = MappingValidator::new(&tables.industries).validate(&mapping.industry_rates);
            emit(
                &MapOutput {
                    mapping: &mapping,
                    validation: &validation,
                },
                Some(dir.join("industry_rates.json").as_path()),
                pretty,
            )?;

            let inputs = impact_inputs(
                &inputs,
                &config,
                Some(mapping.industry_rates.clone()),
                report.average_rates(),
            )?;
            let impact = ImpactCalculator::new(&tables).calculate_net_impact(&inputs)?;
            emit(&impact, Some(dir.join("ai_labor_impact.json").as_path()), pretty)?;

            let projections = ProjectionEngine::new(&tables, config.projection.years)?
                .generate(&impact, &config.projection.scenarios)?;
            emit(&projections, Some(dir.join("projections.json").as_path()), pretty)?;

            let mut rng = make_rng(seed.or(config.simulation.seed));
            let confidence = MonteCarloEngine::new(&tables.perturbation, config.simulation.runs)?
                .run(&impact, config.projection.years, &mut rng)?;
            emit(&confidence, Some(dir.join("confidence_intervals.json").as_path()), pretty)?;

            tracing::info!(
                dir = %dir.display(),
                total_impact = impact.total_impact,
                jobs_affected = impact.jobs_affected,
                "pipeline complete"
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            tracing::info!(seed, "using seeded random generator");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn read_json_as<T: DeserializeOwned>(path: &Path) -> Result<T> {
    serde_json::from_value(read_json(path)?)
        .with_context(|| format!("unexpected structure in {}", path.display()))
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote report");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn load_matrix(path: Option<&Path>) -> Result<EmploymentMatrix> {
    match path {
        Some(path) => Ok(EmploymentMatrix::from_value(&read_json(path)?)?),
        None => {
            tracing::warn!("no employment matrix given, using estimated employment shares");
            Ok(EmploymentMatrix::estimated())
        }
    }
}

/// `{"industry_rates": {...}}` (a `map` report) or a bare rate map.
fn industry_rates_value(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("mapping") => map
            .remove("mapping")
            .map(industry_rates_value)
            .unwrap_or(Value::Null),
        Value::Object(mut map) if map.contains_key("industry_rates") => {
            map.remove("industry_rates").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn load_rates(path: &Path) -> Result<BTreeMap<String, IndustryRate>> {
    serde_json::from_value(industry_rates_value(read_json(path)?))
        .with_context(|| format!("invalid industry rates in {}", path.display()))
}

/// Industry snapshot, skipping entries that don't parse.
fn load_employment(path: &Path) -> Result<BTreeMap<String, IndustryEmployment>> {
    let value = read_json(path)?;
    let industries = match value {
        Value::Object(mut map) if map.contains_key("industries") => {
            map.remove("industries").unwrap_or(Value::Null)
        }
        other => other,
    };
    let Value::Object(industries) = industries else {
        bail!("{}: employment data must be an object of industries", path.display());
    };

    let mut out = BTreeMap::new();
    for (industry, entry) in industries {
        match serde_json::from_value::<IndustryEmployment>(entry) {
            Ok(emp) => {
                out.insert(industry, emp);
            }
            Err(e) => tracing::warn!(industry = %industry, error = %e, "skipping malformed employment entry"),
        }
    }
    Ok(out)
}

fn load_news(path: &Path) -> Result<Vec<NewsArticle>> {
    let articles = match read_json(path)? {
        Value::Object(mut map) => map.remove("articles").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(articles).with_context(|| format!("invalid articles in {}", path.display()))
}

fn load_postings(path: &Path) -> Result<u64> {
    let value = read_json(path)?;
    value
        .get("total_ai_postings")
        .and_then(Value::as_u64)
        .with_context(|| format!("{}: missing total_ai_postings", path.display()))
}

fn parse_period(date: Option<&str>, config: &Config) -> Result<(i32, u32)> {
    match date {
        Some(raw) => {
            let (year, month) = raw
                .split_once('-')
                .with_context(|| format!("expected YYYY-MM, got {raw}"))?;
            let year: i32 = year.parse().with_context(|| format!("invalid year in {raw}"))?;
            let month: u32 = month.parse().with_context(|| format!("invalid month in {raw}"))?;
            if !(1..=12).contains(&month) {
                bail!("invalid month in {raw}");
            }
            Ok((year, month))
        }
        None => Ok((config.reference_year(), Utc::now().month())),
    }
}

fn impact_inputs(
    args: &ImpactArgs,
    config: &Config,
    mapped_rates: Option<BTreeMap<String, IndustryRate>>,
    average_rates: Option<(f64, f64)>,
) -> Result<ImpactInputs> {
    let (year, month) = parse_period(args.date.as_deref(), config)?;
    let mut inputs = ImpactInputs::new(year, month, load_employment(&args.employment)?);

    inputs.industry_rates = match (&args.rates, mapped_rates) {
        (Some(path), _) => Some(load_rates(path)?),
        (None, mapped) => mapped,
    };
    let averages = match &args.occupation_report {
        Some(path) => read_json_as::<OccupationImpactReport>(path)?.average_rates(),
        None => average_rates,
    };
    inputs.average_rates = averages.map(|(automation, augmentation)| RatePair {
        automation,
        augmentation,
    });
    if let Some(path) = &args.jobs {
        inputs.ai_job_postings = Some(load_postings(path)?);
    }
    if let Some(path) = &args.news {
        inputs.news = load_news(path)?;
    }
    Ok(inputs)
}
