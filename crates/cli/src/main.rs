use atestado_core::{
    cid::CidSearch,
    date::{mask_date_input, parse_date, today},
    print::print_document,
    words::number_to_words,
    CoreConfig, FormField, FormState, HttpCidSearch,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "atestado")]
#[command(about = "Medical leave certificate (atestado médico) generator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the certificate text for the given values
    Render {
        /// Patient name
        #[arg(long, default_value = "")]
        name: String,
        /// Patient identifier (CPF or record number)
        #[arg(long, default_value = "")]
        id: String,
        /// ICD-10 code
        #[arg(long, default_value = "")]
        cid: String,
        /// Number of days off
        #[arg(long, default_value = "")]
        days: String,
        /// Leave start date (DD/MM/YYYY, digits are masked)
        #[arg(long)]
        start: Option<String>,
        /// Certificate date (DD/MM/YYYY, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Emit the full print document instead of the plain text
        #[arg(long)]
        html: bool,
        /// Write the output to this file instead of stdout
        #[arg(long)]
        out: Option<std::path::PathBuf>,
    },
    /// Spell a number of days out in Portuguese
    Words {
        /// Value as typed in the days field
        value: String,
    },
    /// Check whether a date is a real DD/MM/YYYY calendar date
    CheckDate {
        /// Date to check
        date: String,
    },
    /// Apply the DD/MM/YYYY input mask to raw text
    MaskDate {
        /// Raw input
        raw: String,
    },
    /// Search ICD-10 codes by name
    Cid {
        /// Search term (at least three characters, not itself a code)
        term: String,
    },
}

fn config_from_env() -> Result<CoreConfig, Box<dyn std::error::Error>> {
    Ok(CoreConfig::from_env_values(
        std::env::var("ATESTADO_CID_SEARCH_URL").ok(),
        std::env::var("ATESTADO_CID_DEBOUNCE_MS").ok(),
        std::env::var("ATESTADO_LOCALITY").ok(),
        std::env::var("ATESTADO_STYLESHEET_URL").ok(),
    )?)
}

/// Builds a form from command-line values, masking dates the way the form does.
fn fill_form(
    name: &str,
    id: &str,
    cid: &str,
    days: &str,
    start: Option<&str>,
    date: Option<&str>,
) -> FormState {
    let mut form = FormState::new(today());
    form.update_field(FormField::PatientName, name);
    form.update_field(FormField::PatientId, id);
    form.update_field(FormField::Cid, cid);
    form.update_field(FormField::DaysOffNumeric, days);
    if let Some(start) = start {
        form.update_field(FormField::StartDate, start);
    }
    if let Some(date) = date {
        form.update_field(FormField::AttestationDate, date);
    }
    form
}

/// The certificate text, or the full print document when `print_config` is given.
fn render_output(
    form: &FormState,
    print_config: Option<&CoreConfig>,
) -> Result<String, Box<dyn std::error::Error>> {
    let Some(cfg) = print_config else {
        return Ok(form.generated_text().to_string());
    };
    if !form.can_print() {
        return Err(form.print_tooltip().into());
    }
    Ok(print_document(form.data(), form.generated_text(), cfg)?)
}

fn date_verdict(date: &str) -> String {
    match parse_date(date) {
        Some(parsed) => format!("valid: {}", parsed),
        None => "invalid".to_string(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render {
            name,
            id,
            cid,
            days,
            start,
            date,
            html,
            out,
        }) => {
            let form = fill_form(&name, &id, &cid, &days, start.as_deref(), date.as_deref());
            if let Some(error) = form.start_date_error() {
                eprintln!("{}", error);
            }

            let cfg = if html { Some(config_from_env()?) } else { None };
            let output = render_output(&form, cfg.as_ref())?;

            match out {
                Some(path) => {
                    std::fs::write(&path, output)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", output),
            }
        }
        Some(Commands::Words { value }) => {
            println!("{}", number_to_words(&value));
        }
        Some(Commands::CheckDate { date }) => {
            let verdict = date_verdict(&date);
            println!("{}", verdict);
            if verdict == "invalid" {
                std::process::exit(1);
            }
        }
        Some(Commands::MaskDate { raw }) => {
            println!("{}", mask_date_input(&raw));
        }
        Some(Commands::Cid { term }) => {
            let cfg = config_from_env()?;
            let searcher = HttpCidSearch::from_config(&cfg)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let results = runtime.block_on(searcher.search(&term))?;
            if results.is_empty() {
                println!("No matches.");
            } else {
                for suggestion in results {
                    println!("{} - {}", suggestion.code, suggestion.name);
                }
            }
        }
        None => {}
    }

    Ok(())
}
