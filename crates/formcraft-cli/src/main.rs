mod wizard;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use formcraft_component::{
    edit_schema, get_answers_schema, lint_schema, render_card, render_edit, render_edit_text,
    render_print, render_view, render_view_text,
};
use formcraft_spec::{AnswerSet, FormSpec, PageSize, RenderOptions};
use serde_json::{Value, json};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wizard::WizardPresenter;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "FORMCRAFT_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Form schema CLI",
    long_about = "Renders, fills, edits, and lints formcraft schema documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RenderMode {
    /// Editable form.
    Edit,
    /// Read-only view.
    View,
    /// Paper form.
    Print,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Card,
    Html,
}

#[derive(Subcommand)]
enum Command {
    /// Render a schema against an answer set.
    Render {
        /// Path to the schema document (field array or form envelope).
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON file containing answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderMode::Edit)]
        mode: RenderMode,
        /// Output format; print mode defaults to html, the others to text.
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// JSON file with render options (placeholder_rows, table_rows, page).
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Page size for print output; overrides the config file.
        #[arg(long, value_name = "SIZE")]
        page: Option<PageSize>,
    },
    /// Fill a form interactively in the terminal.
    Fill {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON file containing initial answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Also print the final answers as JSON.
        #[arg(long)]
        answers_json: bool,
    },
    /// Apply one edit operation to a schema.
    Edit {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Edit operation as JSON, e.g. {"op":"append","type":"text"}.
        #[arg(long, value_name = "JSON")]
        op: String,
        /// Write the edited schema here instead of stdout.
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
    },
    /// Report schema problems; exits non-zero when the schema is invalid.
    Lint {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
    },
    /// Print the JSON Schema of the answers a schema produces.
    AnswersSchema {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
    },
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Render {
            schema,
            answers,
            mode,
            format,
            config,
            page,
        } => run_render(&schema, answers.as_deref(), mode, format, config.as_deref(), page),
        Command::Fill {
            schema,
            answers,
            answers_json,
        } => run_fill(&schema, answers.as_deref(), answers_json),
        Command::Edit { schema, op, out } => run_edit(&schema, &op, out.as_deref()),
        Command::Lint { schema } => run_lint(&schema),
        Command::AnswersSchema { schema } => run_answers_schema(&schema),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .try_init();
}

/// Schema file contents plus the component config pointing at them.
struct LoadedSchema {
    form_id: String,
    raw: String,
}

impl LoadedSchema {
    fn read(path: &Path) -> CliResult<Self> {
        let raw = fs::read_to_string(path)?;
        let spec = FormSpec::from_json(&raw)?;
        debug!(form = %spec.id, fields = spec.fields.len(), "schema loaded");
        Ok(Self {
            form_id: spec.id,
            raw,
        })
    }

    fn config(&self, options: &RenderOptions) -> String {
        json!({ "schema_json": self.raw, "options": options }).to_string()
    }
}

fn read_answers(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)?;
            let value: Value = serde_json::from_str(&contents)?;
            Ok(value.to_string())
        }
        None => Ok("{}".to_string()),
    }
}

fn read_options(config: Option<&Path>, page: Option<PageSize>) -> CliResult<RenderOptions> {
    let mut options = match config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => RenderOptions::default(),
    };
    if let Some(page) = page {
        options.page = page;
    }
    Ok(options)
}

fn run_render(
    schema_path: &Path,
    answers_path: Option<&Path>,
    mode: RenderMode,
    format: Option<OutputFormat>,
    config_path: Option<&Path>,
    page: Option<PageSize>,
) -> CliResult<()> {
    let schema = LoadedSchema::read(schema_path)?;
    let options = read_options(config_path, page)?;
    let config = schema.config(&options);
    let answers = read_answers(answers_path)?;
    let form_id = schema.form_id.as_str();

    let format = format.unwrap_or(match mode {
        RenderMode::Print => OutputFormat::Html,
        RenderMode::Edit | RenderMode::View => OutputFormat::Text,
    });
    let output = match (mode, format) {
        (RenderMode::Edit, OutputFormat::Text) => {
            parse_component_text(render_edit_text(form_id, &config, &answers))?
        }
        (RenderMode::Edit, OutputFormat::Json) => {
            pretty(parse_component_result(&render_edit(form_id, &config, &answers))?)?
        }
        (RenderMode::Edit, OutputFormat::Card) => {
            pretty(parse_component_result(&render_card(form_id, &config, &answers))?)?
        }
        (RenderMode::View | RenderMode::Print, OutputFormat::Text) => {
            parse_component_text(render_view_text(form_id, &config, &answers))?
        }
        (RenderMode::View | RenderMode::Print, OutputFormat::Json) => {
            pretty(parse_component_result(&render_view(form_id, &config, &answers))?)?
        }
        (RenderMode::View | RenderMode::Print, OutputFormat::Html) => {
            parse_component_text(render_print(form_id, &config, &answers))?
        }
        (mode, format) => {
            return Err(format!("{:?} output is not available in {:?} mode", format, mode).into());
        }
    };
    println!("{}", output);
    Ok(())
}

fn run_fill(schema_path: &Path, answers_path: Option<&Path>, answers_json: bool) -> CliResult<()> {
    let spec = FormSpec::from_json(&fs::read_to_string(schema_path)?)?;
    let initial = match answers_path {
        Some(path) => AnswerSet::from_value(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => AnswerSet::new(),
    };
    let presenter = WizardPresenter::new(answers_json);
    wizard::fill(&spec, initial, &presenter)?;
    Ok(())
}

fn run_edit(schema_path: &Path, op: &str, out: Option<&Path>) -> CliResult<()> {
    let schema = LoadedSchema::read(schema_path)?;
    let config = schema.config(&RenderOptions::default());
    let edited = parse_component_result(&edit_schema(&schema.form_id, &config, op))?;
    let rendered = pretty(edited)?;
    match out {
        Some(path) => {
            fs::write(path, format!("{}\n", rendered))?;
            println!("Schema written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn run_lint(schema_path: &Path) -> CliResult<()> {
    let schema = LoadedSchema::read(schema_path)?;
    let config = schema.config(&RenderOptions::default());
    let report = parse_component_result(&lint_schema(&schema.form_id, &config))?;
    let issues = report["issues"].as_array().cloned().unwrap_or_default();

    if issues.is_empty() {
        println!("No issues found.");
    }
    for issue in &issues {
        println!(
            "{} {} [{}]: {}",
            issue["severity"].as_str().unwrap_or("warning"),
            issue["path"].as_str().unwrap_or_default(),
            issue["code"].as_str().unwrap_or_default(),
            issue["message"].as_str().unwrap_or_default()
        );
    }

    if report["valid"].as_bool().unwrap_or(false) {
        Ok(())
    } else {
        Err("schema is invalid".into())
    }
}

fn run_answers_schema(schema_path: &Path) -> CliResult<()> {
    let schema = LoadedSchema::read(schema_path)?;
    let config = schema.config(&RenderOptions::default());
    let generated = parse_component_result(&get_answers_schema(&schema.form_id, &config))?;
    println!("{}", pretty(generated)?);
    Ok(())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

/// Text responses are passed through unless they are an error object.
fn parse_component_text(response: String) -> CliResult<String> {
    if let Ok(value) = serde_json::from_str::<Value>(&response)
        && let Some(error) = value.get("error").and_then(Value::as_str)
    {
        return Err(error.into());
    }
    Ok(response)
}

fn pretty(value: Value) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(&value)?)
}
