//! Response schemas sent with structured-output requests.
//!
//! These use the OpenAPI subset the Gemini API accepts (`OBJECT`, `ARRAY`,
//! `STRING`, `INTEGER`). Property names match the serde renames in
//! `anamnesis_core::models`.

use serde_json::{Map, Value, json};

const ANAMNESIS_FIELDS: [&str; 18] = [
    "idade",
    "sexo",
    "comorbidades",
    "medicamentosEmUso",
    "alergias",
    "historiaPregressa",
    "queixaPrincipal",
    "hda",
    "pa",
    "fc",
    "fr",
    "temp",
    "spo2",
    "pesoAltura",
    "exameFisicoSumario",
    "resultadosExames",
    "hipotesesDiagnosticas",
    "condutaInicial",
];

fn diagnosis_list(description: &str, item_description: &str) -> Value {
    json!({
        "type": "ARRAY",
        "description": description,
        "items": {
            "type": "OBJECT",
            "properties": {
                "diagnostico": { "type": "STRING", "description": "O nome da condição médica." },
                "probabilidade": { "type": "INTEGER", "description": "A probabilidade estimada, de 0 a 100." },
                "justificativa": { "type": "STRING", "description": item_description }
            },
            "required": ["diagnostico", "probabilidade", "justificativa"]
        }
    })
}

pub fn diagnosis() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "diagnosticosProvaveis": diagnosis_list(
                "Uma lista dos diagnósticos mais prováveis com base nos dados fornecidos.",
                "A justificativa para este diagnóstico provável.",
            ),
            "diagnosticosDiferenciais": diagnosis_list(
                "Diagnósticos diferenciais importantes ('zebras'), menos comuns mas que não devem ser descartados.",
                "O motivo pelo qual este diagnóstico diferencial deve ser considerado.",
            )
        },
        "required": ["diagnosticosProvaveis", "diagnosticosDiferenciais"]
    })
}

pub fn diagnosis_detail() -> Value {
    let string_list = |description: &str| json!({ "type": "ARRAY", "description": description, "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "checklistAnamnese": {
                "type": "ARRAY",
                "description": "Perguntas e itens de exame físico para confirmar ou descartar o diagnóstico.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "item": { "type": "STRING", "description": "A pergunta ou item do exame físico a ser verificado." },
                        "justificativa": { "type": "STRING", "description": "O motivo pelo qual este item é importante." }
                    },
                    "required": ["item", "justificativa"]
                }
            },
            "planoConduta": {
                "type": "OBJECT",
                "properties": {
                    "examesConfirmacao": string_list("Exames laboratoriais ou de imagem para confirmar o diagnóstico."),
                    "medicacoesSugeridas": string_list("Sugestões de tratamento medicamentoso inicial."),
                    "encaminhamentos": string_list("Sugestões de encaminhamento para especialistas.")
                },
                "required": ["examesConfirmacao", "medicacoesSugeridas", "encaminhamentos"]
            }
        },
        "required": ["checklistAnamnese", "planoConduta"]
    })
}

fn anamnesis_properties() -> Map<String, Value> {
    ANAMNESIS_FIELDS
        .iter()
        .map(|field| (field.to_string(), json!({ "type": "STRING" })))
        .collect()
}

pub fn anamnesis() -> Value {
    json!({
        "type": "OBJECT",
        "properties": anamnesis_properties(),
        "required": ANAMNESIS_FIELDS,
    })
}

/// The anamnesis schema plus the hidden answer-key fields.
pub fn training_case() -> Value {
    let mut properties = anamnesis_properties();
    let hidden = [
        ("diagnosticoCorreto", "O diagnóstico correto e conciso para este caso clínico."),
        ("resumoDiagnostico", "Resumo do raciocínio clínico que leva ao diagnóstico correto."),
        ("hiddenPhysicalExam", "Descrição detalhada e completa do exame físico oculto, com achados normais e anormais."),
        ("hiddenLabResults", "Resultados detalhados de exames laboratoriais e de imagem ocultos, com valores."),
    ];
    let mut required: Vec<&str> = ANAMNESIS_FIELDS.to_vec();
    for (name, description) in hidden {
        properties.insert(
            name.to_string(),
            json!({ "type": "STRING", "description": description }),
        );
        required.push(name);
    }
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

pub fn evaluation() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "INTEGER", "description": "Pontuação final de 0 a 100, calculada pela rubrica." },
            "scoreJustificativa": { "type": "STRING", "description": "Como a pontuação foi calculada." },
            "pontosPositivos": { "type": "STRING", "description": "Acertos do estudante." },
            "pontosMelhorar": { "type": "STRING", "description": "O que o estudante poderia ter feito diferente." },
            "analiseDaConduta": { "type": "STRING", "description": "Análise da investigação e do plano de conduta." },
            "raciocinioCorreto": { "type": "STRING", "description": "Raciocínio clínico correto até o diagnóstico." }
        },
        "required": ["score", "scoreJustificativa", "pontosPositivos", "pontosMelhorar", "analiseDaConduta", "raciocinioCorreto"]
    })
}

pub fn timeline() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "timeline": {
                "type": "ARRAY",
                "description": "Eventos cronológicos extraídos da HDA, do mais antigo para o mais recente.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "time": { "type": "STRING", "description": "Marcador de tempo do evento (ex: 'Há 5 dias', 'Ontem')." },
                        "event": { "type": "STRING", "description": "O que aconteceu naquele momento." }
                    },
                    "required": ["time", "event"]
                }
            }
        },
        "required": ["timeline"]
    })
}
