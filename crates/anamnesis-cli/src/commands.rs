use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Result, WrapErr, eyre};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::models::diagnosis::RetroFeedback;
use anamnesis_core::models::training::{Difficulty, Specialty, StudentHypotheses, StudentPlan};
use anamnesis_export::docx::generate_docx;
use anamnesis_export::file_name::export_file_name;
use anamnesis_export::render::{render_anamnesis, render_case_report};
use anamnesis_export::styles::DocumentStyles;
use anamnesis_gemini::assistant::Assistant;
use anamnesis_gemini::client::{ClientSettings, GeminiClient};
use anamnesis_storage::api_key::ApiKeyStore;
use anamnesis_storage::cases::CaseStore;
use anamnesis_storage::store::LocalStore;

use crate::config::{self, AnamnesisConfig};
use crate::output;
use crate::session::Session;
use crate::state::Action;

#[derive(Parser, Debug)]
#[command(name = "anamnesis", version)]
#[command(about = "Clinical anamnesis assistant backed by Gemini")]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Gemini API key (overrides GEMINI_API_KEY, API_KEY and the saved key)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Config directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save the Gemini API key on this machine (read from stdin when omitted)
    SetKey {
        key: Option<String>,
        /// Forget the saved key instead
        #[arg(long, conflicts_with = "key")]
        clear: bool,
    },
    /// Show or initialize the configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Ranked probable and differential diagnoses
    Analyze {
        /// Anamnesis as .json, .txt or .pdf
        file: PathBuf,
    },
    /// Checklist and management plan for one or more diagnoses
    Details {
        file: PathBuf,
        #[arg(required = true)]
        diagnoses: Vec<String>,
    },
    /// Checklist for one diagnosis with presence hints
    Check { file: PathBuf, diagnosis: String },
    /// Chronological events of the HDA
    Timeline { file: PathBuf },
    /// Literature summary for a diagnosis, grounded on web search
    Research { diagnosis: String },
    /// Condense a lab report (.txt or .pdf) into one line of results
    SummarizeExam { file: PathBuf },
    /// Structure a recorded interview into an anamnesis
    Transcribe {
        audio: PathBuf,
        /// Write the anamnesis JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Interactive simulated case
    Train {
        #[arg(long, default_value = "intermediario")]
        difficulty: Difficulty,
        #[arg(long, default_value = "geral")]
        specialty: Specialty,
    },
    /// Fold checklist answers and the conducted plan into the anamnesis, then analyze again
    Reevaluate {
        file: PathBuf,
        /// Feedback JSON (`checklistUpdates`, `conductedPlan`)
        feedback: PathBuf,
    },
    /// Fold feedback into a final anamnesis and print it as sectioned text
    Finalize {
        file: PathBuf,
        feedback: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Adopt an edited final anamnesis text: structure it again and re-analyze
    ApplyFinal {
        /// Edited sectioned text, as printed by `finalize`
        text: PathBuf,
        /// Write the structured anamnesis JSON here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Saved case history
    Cases {
        #[command(subcommand)]
        action: CasesCommand,
    },
    /// Analyze an anamnesis and save it to the case history
    Save { file: PathBuf },
    /// Export an anamnesis as sectioned text or DOCX
    Export {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Concise chart entry for an anamnesis
    Summary { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    /// Write the current (or default) configuration to disk
    Init,
}

#[derive(Subcommand, Debug)]
pub enum CasesCommand {
    List,
    Show { id: String },
    Delete { id: String },
    /// Export a saved case report
    Export {
        id: String,
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Append a chart summary (calls the model)
        #[arg(long)]
        with_summary: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Docx,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Docx => "docx",
        }
    }
}

struct Context {
    json: bool,
    api_key: Option<String>,
    config_dir: PathBuf,
    config: AnamnesisConfig,
    local: LocalStore,
}

impl Context {
    async fn open(cli: &Cli) -> Result<Self> {
        let config_dir = match &cli.config_dir {
            Some(dir) => dir.clone(),
            None => config::config_dir()?,
        };
        let config = config::load_config(&config_dir)?;
        let data_dir = config::data_dir(&config)?;
        let local = LocalStore::open(&data_dir).await?;
        Ok(Self {
            json: cli.json,
            api_key: cli.api_key.clone(),
            config_dir,
            config,
            local,
        })
    }

    fn cases(&self) -> CaseStore {
        CaseStore::new(self.local.clone())
    }

    async fn session(&self) -> Result<Session<GeminiClient>> {
        let stored = ApiKeyStore::new(self.local.clone()).load_api_key().await?;
        let (api_key, source) =
            config::resolve_api_key(self.api_key.as_deref(), |name| std::env::var(name).ok(), stored)
                .ok_or_else(|| {
                    eyre!("no Gemini API key: run `anamnesis set-key` or set GEMINI_API_KEY")
                })?;
        info!(source = source.describe(), key = %config::redact_api_key(&api_key), "using API key");

        let settings = ClientSettings {
            model: self.config.model.clone(),
            base_url: self.config.api_base_url.clone(),
            ..ClientSettings::new(api_key)
        };
        let assistant = Assistant::new(GeminiClient::new(settings)?)
            .with_retry_policy(self.config.retry.policy());
        Ok(Session::new(assistant).with_case_store(self.cases()))
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T) -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", human(value));
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Load an anamnesis into the session: `.json` is read as-is, `.txt` and
/// `.pdf` go through the import path.
async fn load_anamnesis(session: &Session<GeminiClient>, path: &Path) -> Result<AnamnesisData> {
    if !is_json(path) {
        return Ok(session.import_anamnesis_file(path).await?);
    }
    let contents = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let data: AnamnesisData = serde_json::from_str(&contents)
        .wrap_err_with(|| format!("{} is not an anamnesis JSON document", path.display()))?;
    let data = data.clean();
    session.store().dispatch(Action::SetAnamnesis(data.clone())).await;
    Ok(data)
}

async fn read_feedback(path: &Path) -> Result<RetroFeedback> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).wrap_err_with(|| format!("{} is not a feedback JSON document", path.display()))
}

/// Write `rendered` as text or DOCX and return the path written.
fn write_export(rendered: &str, format: ExportFormat, out: PathBuf) -> Result<PathBuf> {
    let bytes = match format {
        ExportFormat::Text => rendered.as_bytes().to_vec(),
        ExportFormat::Docx => generate_docx(rendered, &DocumentStyles::default())?,
    };
    std::fs::write(&out, bytes).wrap_err_with(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), ?format, "export written");
    Ok(out)
}

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::open(&cli).await?;

    match cli.command {
        Command::SetKey { key, clear } => {
            let keys = ApiKeyStore::new(ctx.local.clone());
            if clear {
                let removed = keys.clear_api_key().await?;
                println!("{}", if removed { "Chave removida." } else { "Nenhuma chave salva." });
                return Ok(());
            }
            let key = match key {
                Some(key) => key,
                None => {
                    eprint!("Chave da API Gemini: ");
                    std::io::stderr().flush()?;
                    let mut line = String::new();
                    std::io::stdin().read_line(&mut line)?;
                    line
                }
            };
            keys.save_api_key(&key).await?;
            println!("Chave salva ({}).", config::redact_api_key(key.trim()));
        }

        Command::Config { action } => match action {
            ConfigCommand::Show => ctx.emit(&ctx.config, |c| {
                format!(
                    "model: {}\napi_base_url: {}\nretry: {} tentativas, {} ms inicial, {} ms jitter\nconfig: {}\n",
                    c.model,
                    c.api_base_url,
                    c.retry.max_retries,
                    c.retry.initial_delay_ms,
                    c.retry.max_jitter_ms,
                    ctx.config_dir.display(),
                )
            })?,
            ConfigCommand::Init => {
                config::save_config(&ctx.config_dir, &ctx.config)?;
                println!("Configuração salva em {}.", ctx.config_dir.display());
            }
        },

        Command::Analyze { file } => {
            let session = ctx.session().await?;
            load_anamnesis(&session, &file).await?;
            let diagnoses = session.run_analysis().await?;
            let state = session.snapshot().await;
            if ctx.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "diagnoses": diagnoses,
                        "timeline": state.timeline,
                    }))?
                );
            } else {
                print!("{}\n{}", output::diagnoses(&diagnoses), output::timeline(&state.timeline));
            }
        }

        Command::Details { file, diagnoses } => {
            let session = ctx.session().await?;
            load_anamnesis(&session, &file).await?;
            for name in &diagnoses {
                session.select_by_name(name).await;
            }
            let panel = session.investigate_selected().await?;
            let checklist = session.annotated_checklist().await;
            if ctx.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "checklist": checklist,
                        "plan": panel.merged().plan,
                        "failures": panel.failures(),
                    }))?
                );
            } else {
                print!("{}", output::details(&panel, &checklist));
            }
        }

        Command::Check { file, diagnosis } => {
            let session = ctx.session().await?;
            load_anamnesis(&session, &file).await?;
            session.select_custom(&diagnosis).await;
            let panel = session.investigate_selected().await?;
            if let Some((name, error)) = panel.failures().first() {
                return Err(eyre!("failed to fetch the checklist for {name}: {error}"));
            }
            let checklist = session.annotated_checklist().await;
            ctx.emit(&checklist, |c| output::details(&panel, c))?;
        }

        Command::Timeline { file } => {
            let session = ctx.session().await?;
            let data = load_anamnesis(&session, &file).await?;
            let events = session.assistant().fetch_timeline(&data.hpi).await;
            ctx.emit(&events, |e| output::timeline(e))?;
        }

        Command::Research { diagnosis } => {
            let session = ctx.session().await?;
            let result = session.academic_search(&diagnosis).await?;
            ctx.emit(&result, output::academic)?;
        }

        Command::SummarizeExam { file } => {
            let session = ctx.session().await?;
            let summary = session.import_exam_file(&file).await?;
            ctx.emit(&summary, |s| format!("{s}\n"))?;
        }

        Command::Transcribe { audio, out } => {
            let session = ctx.session().await?;
            let data = session.import_audio(&audio).await?;
            let json = serde_json::to_string_pretty(&data)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                    println!("Anamnese salva em {}.", path.display());
                }
                None => println!("{json}"),
            }
        }

        Command::Train {
            difficulty,
            specialty,
        } => {
            let session = ctx.session().await?;
            train(&ctx, &session, difficulty, specialty).await?;
        }

        Command::Reevaluate { file, feedback } => {
            let session = ctx.session().await?;
            load_anamnesis(&session, &file).await?;
            let feedback = read_feedback(&feedback).await?;
            let diagnoses = session.reevaluate(&feedback).await?;
            ctx.emit(&diagnoses, output::diagnoses)?;
        }

        Command::Finalize {
            file,
            feedback,
            out,
        } => {
            let session = ctx.session().await?;
            load_anamnesis(&session, &file).await?;
            let feedback = read_feedback(&feedback).await?;
            let final_data = session.finalize(&feedback).await;
            match out {
                Some(path) => {
                    std::fs::write(&path, serde_json::to_string_pretty(&final_data)?)
                        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                    println!("Anamnese final salva em {}.", path.display());
                }
                None if ctx.json => println!("{}", serde_json::to_string_pretty(&final_data)?),
                None => println!("{}", render_anamnesis(&final_data)?),
            }
        }

        Command::ApplyFinal { text, out } => {
            let session = ctx.session().await?;
            let edited = tokio::fs::read_to_string(&text)
                .await
                .wrap_err_with(|| format!("failed to read {}", text.display()))?;
            let diagnoses = session.apply_final_text(&edited).await?;
            let state = session.snapshot().await;
            if let Some(path) = out {
                std::fs::write(&path, serde_json::to_string_pretty(&state.anamnesis)?)
                    .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "final anamnesis written");
            }
            if ctx.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "anamnesis": state.anamnesis,
                        "diagnoses": diagnoses,
                        "timeline": state.timeline,
                    }))?
                );
            } else {
                print!("{}\n{}", output::diagnoses(&diagnoses), output::timeline(&state.timeline));
            }
        }

        Command::Cases { action } => cases(&ctx, action).await?,

        Command::Save { file } => {
            let session = ctx.session().await?;
            load_anamnesis(&session, &file).await?;
            session.run_analysis().await?;
            let case = session.save_current_case().await?;
            ctx.emit(&case, |c| format!("Caso salvo: {} ({})\n", c.name, c.id))?;
        }

        Command::Export { file, format, out } => {
            // JSON input needs no API key.
            let data = if is_json(&file) {
                let contents = std::fs::read_to_string(&file)
                    .wrap_err_with(|| format!("failed to read {}", file.display()))?;
                serde_json::from_str::<AnamnesisData>(&contents)?.clean()
            } else {
                let session = ctx.session().await?;
                load_anamnesis(&session, &file).await?
            };
            let rendered = render_anamnesis(&data)?;
            let out = out.unwrap_or_else(|| PathBuf::from(export_file_name(&data, format.extension())));
            let path = write_export(&rendered, format, out)?;
            println!("Exportado: {}", path.display());
        }

        Command::Summary { file } => {
            let session = ctx.session().await?;
            load_anamnesis(&session, &file).await?;
            let summary = session.prontuary_summary().await?;
            ctx.emit(&summary, |s| format!("{s}\n"))?;
        }
    }

    Ok(())
}

async fn cases(ctx: &Context, action: CasesCommand) -> Result<()> {
    let store = ctx.cases();
    match action {
        CasesCommand::List => {
            let cases = store.load_cases().await;
            ctx.emit(&cases, |c| output::case_list(c))?;
        }
        CasesCommand::Show { id } => {
            let case = store
                .find_case(&id)
                .await
                .ok_or_else(|| eyre!("saved case not found: {id}"))?;
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&case)?);
            } else {
                println!("{}", render_case_report(&case, None)?);
            }
        }
        CasesCommand::Delete { id } => {
            let remaining = store.delete_case(&id).await?;
            println!("Caso apagado. {} restante(s).", remaining.len());
        }
        CasesCommand::Export {
            id,
            format,
            out,
            with_summary,
        } => {
            let session = if with_summary {
                Some(ctx.session().await?)
            } else {
                None
            };
            let case = store
                .find_case(&id)
                .await
                .ok_or_else(|| eyre!("saved case not found: {id}"))?;
            let summary = match &session {
                Some(session) => {
                    session.load_case(&id).await?;
                    Some(session.prontuary_summary().await?)
                }
                None => None,
            };
            let rendered = render_case_report(&case, summary.as_deref())?;
            let out = out.unwrap_or_else(|| {
                PathBuf::from(export_file_name(&case.anamnesis_data, format.extension()))
            });
            let path = write_export(&rendered, format, out)?;
            println!("Exportado: {}", path.display());
        }
    }
    Ok(())
}

const END_INVESTIGATION: &str = "/fim";

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.unwrap_or_default().trim().to_string())
}

/// Investigation loop on stdin, then the student's hypotheses and plan.
async fn train(
    ctx: &Context,
    session: &Session<GeminiClient>,
    difficulty: Difficulty,
    specialty: Specialty,
) -> Result<()> {
    let case = session.start_training(difficulty, specialty).await?;
    let rendered = render_anamnesis(&case)?;
    println!("{rendered}\n");
    if let Some(entry) = session.snapshot().await.investigation_log.entries().first() {
        println!("{}", output::log_entry(entry));
    }
    println!("Solicite exames ou achados de exame físico. Digite {END_INVESTIGATION} para concluir.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        if request.eq_ignore_ascii_case(END_INVESTIGATION) {
            break;
        }
        match session.investigate(request).await {
            Ok(answer) => println!("{answer}\n"),
            Err(e) => eprintln!("{e}\n"),
        }
    }

    let principal = prompt(&mut lines, "\nHipótese principal: ").await?;
    let differentials = prompt(&mut lines, "Diagnósticos diferenciais (separados por vírgula): ").await?;
    let plan = StudentPlan {
        requested_exams: prompt(&mut lines, "Exames solicitados: ").await?,
        prescription: prompt(&mut lines, "Prescrição: ").await?,
        referrals: prompt(&mut lines, "Encaminhamentos: ").await?,
    };
    let hypotheses = StudentHypotheses {
        principal,
        differentials: differentials
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect(),
    };

    let evaluation = session.submit_student_analysis(&hypotheses, &plan).await?;
    let state = session.snapshot().await;
    let correct = state.anamnesis.correct_diagnosis.clone().unwrap_or_default();

    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "evaluation": evaluation,
                "correctDiagnosis": correct,
                "diagnosisRationale": state.anamnesis.diagnosis_rationale,
                "principalMatches": hypotheses.principal_matches(&correct),
                "assistantDiagnoses": state.diagnoses,
            }))?
        );
        return Ok(());
    }

    println!("\n{}", output::evaluation(&evaluation));
    let verdict = if hypotheses.principal_matches(&correct) {
        "acertou"
    } else {
        "não acertou"
    };
    println!("Diagnóstico correto: {correct} (você {verdict})");
    if let Some(rationale) = &state.anamnesis.diagnosis_rationale {
        println!("{rationale}");
    }
    if !state.diagnoses.is_empty() {
        println!("\n{}", output::diagnoses(&state.diagnoses));
    }
    Ok(())
}
