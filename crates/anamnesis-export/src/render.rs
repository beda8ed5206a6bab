use serde::Serialize;
use tera::{Context, Tera};

use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::models::diagnosis::Diagnosis;
use anamnesis_core::models::saved_case::SavedCase;
use anamnesis_core::models::timeline::TimelineEvent;

use crate::error::ExportError;

const ANAMNESIS_TEMPLATE_NAME: &str = "anamnesis.md";
const CASE_REPORT_TEMPLATE_NAME: &str = "case_report.md";

/// The editable, sectioned form of an anamnesis. Vital signs fall back to
/// `NI` (não informado); other empty sections stay blank.
pub const ANAMNESIS_TEMPLATE: &str = "\
# Idade:
{{ idade }}

# Sexo:
{{ sexo }}

# Comorbidades: (HAS, DM, DPOC, etc.)
{{ comorbidades }}

# Medicamentos em Uso:
{{ medicamentosEmUso }}

# Alergias:
{{ alergias }}

# História Pregressa Relevante: (Cirurgias, internações, hábitos importantes como tabagismo e etilismo)
{{ historiaPregressa }}

# Queixa Principal (QP): (Motivo principal da consulta, com tempo de evolução)
{{ queixaPrincipal }}

# História da Doença Atual (HDA): (Início, evolução, sintomas associados, tratamentos prévios)
{{ hda }}

# Sinais Vitais:
PA: {% if pa %}{{ pa }}{% else %}NI{% endif %}
FC: {% if fc %}{{ fc }}{% else %}NI{% endif %}
FR: {% if fr %}{{ fr }}{% else %}NI{% endif %}
Temp: {% if temp %}{{ temp }}{% else %}NI{% endif %}
SpO₂: {% if spo2 %}{{ spo2 }}{% else %}NI{% endif %}

# Peso/Altura (opcional):
{{ pesoAltura }}

# Exame Físico Sumário: (Inspeção geral, achados mais relevantes no segmento afetado)
{{ exameFisicoSumario }}

# Resultados de Exames Relevantes:
{{ resultadosExames }}

# Hipóteses Diagnósticas (Médico):
{{ hipotesesDiagnosticas }}

# Conduta Inicial (Médico):
{{ condutaInicial }}
";

pub const CASE_REPORT_TEMPLATE: &str = "\
# {{ name }}
Salvo em: {{ saved_at }}

{{ anamnesis }}

## Diagnósticos Prováveis
{% if probable %}{% for d in probable %}- **{{ d.diagnostico }}** ({{ d.probabilidade }}%): {{ d.justificativa }}
{% endfor %}{% else %}Nenhum.
{% endif %}
## Diagnósticos Diferenciais
{% if differential %}{% for d in differential %}- **{{ d.diagnostico }}** ({{ d.probabilidade }}%): {{ d.justificativa }}
{% endfor %}{% else %}Nenhum.
{% endif %}
{% if timeline %}## Linha do Tempo
{% for e in timeline %}- **{{ e.time }}**: {{ e.event }}
{% endfor %}{% endif %}
{% if summary %}## Resumo para Prontuário
{{ summary }}
{% endif %}";

fn render(name: &str, template: &str, context: &Context) -> Result<String, ExportError> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, template)
        .map_err(|e| ExportError::TemplateParse(e.to_string()))?;
    let rendered = tera.render(name, context)?;
    Ok(rendered.trim().to_string())
}

/// Render the anamnesis as sectioned `# Heading` text.
///
/// The hidden training fields are not part of the output.
pub fn render_anamnesis(data: &AnamnesisData) -> Result<String, ExportError> {
    let value = serde_json::to_value(data.without_answer_key())?;
    let context = Context::from_value(value).map_err(|e| ExportError::TemplateRender(e.to_string()))?;
    render(ANAMNESIS_TEMPLATE_NAME, ANAMNESIS_TEMPLATE, &context)
}

#[derive(Serialize)]
struct CaseReportContext<'a> {
    name: &'a str,
    saved_at: String,
    anamnesis: String,
    probable: &'a [Diagnosis],
    differential: &'a [Diagnosis],
    timeline: &'a [TimelineEvent],
    summary: Option<&'a str>,
}

/// Render a full case: anamnesis sections, ranked diagnoses, timeline and an
/// optional chart summary.
pub fn render_case_report(case: &SavedCase, summary: Option<&str>) -> Result<String, ExportError> {
    let report = CaseReportContext {
        name: &case.name,
        saved_at: case.saved_at.strftime("%Y-%m-%d %H:%M UTC").to_string(),
        anamnesis: render_anamnesis(&case.anamnesis_data)?,
        probable: &case.diagnoses,
        differential: &case.differential_diagnoses,
        timeline: &case.timeline_events,
        summary: summary.map(str::trim).filter(|s| !s.is_empty()),
    };
    let context = Context::from_serialize(&report)?;
    render(CASE_REPORT_TEMPLATE_NAME, CASE_REPORT_TEMPLATE, &context)
}
