//! Prompt builders for each clinical operation.
//!
//! Prompts are written in Portuguese, the language of the clinical records
//! and of the answers we want back.

use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::models::diagnosis::RetroFeedback;
use anamnesis_core::models::training::{Difficulty, InvestigationLog, Specialty, StudentHypotheses, StudentPlan};

const NOT_INFORMED: &str = "Não informado";
const NI: &str = "NI";

fn or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

/// The visible anamnesis as a labelled list. Hidden training fields are
/// never included.
pub fn anamnesis_text(data: &AnamnesisData) -> String {
    let d = data;
    [
        format!("- Idade: {}", or(&d.age, NOT_INFORMED)),
        format!("- Sexo: {}", or(&d.sex, NOT_INFORMED)),
        format!("- Comorbidades: {}", or(&d.comorbidities, NOT_INFORMED)),
        format!("- Medicamentos em Uso: {}", or(&d.current_medications, NOT_INFORMED)),
        format!("- Alergias: {}", or(&d.allergies, NOT_INFORMED)),
        format!("- História Pregressa Relevante: {}", or(&d.past_history, NOT_INFORMED)),
        format!("- Queixa Principal (QP): {}", or(&d.chief_complaint, NOT_INFORMED)),
        format!("- História da Doença Atual (HDA): {}", or(&d.hpi, NOT_INFORMED)),
        format!(
            "- Sinais Vitais: PA: {}, FC: {}, FR: {}, Temp: {}, SpO2: {}",
            or(&d.blood_pressure, NI),
            or(&d.heart_rate, NI),
            or(&d.respiratory_rate, NI),
            or(&d.temperature, NI),
            or(&d.spo2, NI),
        ),
        format!("- Peso/Altura: {}", or(&d.weight_height, NOT_INFORMED)),
        format!("- Exame Físico Sumário: {}", or(&d.physical_exam, NOT_INFORMED)),
        format!("- Resultados de Exames: {}", or(&d.exam_results, NOT_INFORMED)),
    ]
    .join("\n")
}

pub fn diagnoses(data: &AnamnesisData) -> String {
    format!(
        "Aja como um assistente médico especialista em diagnósticos diferenciais.
Com base na seguinte anamnese estruturada, forneça duas listas separadas de diagnósticos:
1. 'diagnosticosProvaveis': os diagnósticos mais comuns e prováveis, com base nos dados.
2. 'diagnosticosDiferenciais': diagnósticos menos comuns, mas clinicamente importantes, que não devem ser descartados (as \"zebras\" médicas). Considere condições graves mesmo que raras.

Para cada diagnóstico, inclua o nome da condição, uma probabilidade estimada (0-100) e uma breve justificativa.

A anamnese é:
{}

Responda apenas com o JSON estruturado conforme o schema, preenchendo as duas listas.",
        anamnesis_text(data)
    )
}

pub fn diagnosis_details(data: &AnamnesisData, diagnosis: &str) -> String {
    format!(
        "Aja como um assistente médico especialista. O usuário selecionou um diagnóstico específico e precisa de mais detalhes para aprofundar a investigação.
O diagnóstico selecionado é: \"{diagnosis}\".
A anamnese atual do paciente é:
{anamnesis}

Com base nessas informações, forneça:
1. 'checklistAnamnese': um checklist COMPLETO de perguntas-chave e itens de exame físico cruciais para confirmar ou descartar \"{diagnosis}\", cada um com uma breve justificativa.
2. 'planoConduta': um plano inicial para \"{diagnosis}\", com exames de confirmação (laboratoriais, imagem), tratamento medicamentoso inicial e possíveis encaminhamentos.

Responda apenas com o JSON estruturado conforme o schema.",
        anamnesis = anamnesis_text(data)
    )
}

pub fn integrate_feedback(current_json: &str, feedback: &RetroFeedback) -> String {
    let updates = serde_json::to_string(&feedback.checklist_updates).unwrap_or_default();
    let conducted = serde_json::to_string(&feedback.conducted_plan).unwrap_or_default();
    format!(
        "Aja como um escriba médico assistente. Sua tarefa é integrar novas informações em um registro de anamnese existente.
NÃO adicione cabeçalhos como \"**Atualização**\". Integre as informações nos campos mais apropriados de forma fluida.
Por exemplo: um novo achado de exame físico vai para 'exameFisicoSumario', uma nova medicação para 'medicamentosEmUso' ou 'condutaInicial', um novo sintoma para 'hda' e um resultado laboratorial para 'resultadosExames'.

Anamnese atual:
{current_json}

Novas informações a integrar:
Novas informações do checklist: {updates}
Plano de conduta realizado: {conducted}

Retorne o objeto JSON COMPLETO da anamnese atualizado. Mantenha os dados existentes e apenas adicione ou modifique os campos relevantes."
    )
}

fn difficulty_guideline(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => {
            "Caso \"de livro\": condição comum, de baixa complexidade e apresentação clássica, que um médico recém-formado diagnosticaria sem dificuldade. Poucas comorbidades."
        }
        Difficulty::Intermediate => {
            "Doença comum com leve complicação, apresentação um pouco atípica ou comorbidade que possa confundir o raciocínio. O desafio está em notar a nuance."
        }
        Difficulty::Hard => {
            "Caso complexo: doença comum com apresentação muito atípica, ou doença menos comum mas importante. Pode envolver múltiplas comorbidades que mascaram o quadro principal."
        }
        Difficulty::Extreme => {
            "Desafio de alta complexidade: doença rara, apresentação totalmente atípica de doença comum, ou múltiplos problemas ativos que se confundem. Inclua pistas falsas."
        }
    }
}

pub fn training_case(difficulty: Difficulty, specialty: Specialty) -> String {
    format!(
        "Aja como um médico educador experiente, criando um caso clínico para simulação e treinamento.
A dificuldade do caso deve ser: **{difficulty}**.
A especialidade do caso deve ser: **{specialty}**. Se a especialidade for 'Geral', escolha qualquer área médica. Se uma especialidade específica for fornecida, o diagnóstico correto DEVE pertencer a essa área.

Gere uma anamnese COMPLETA, REALISTA e DIVERSIFICADA, com uma \"verdade fundamental\" (diagnóstico, exame físico e exames) oculta para o estudante descobrir.
Para cada nova geração, crie um diagnóstico e um cenário clínico originais. Evite repetir diagnósticos.

Diretriz de dificuldade: {guideline}

Diretrizes gerais:
- O caso deve ser PLAUSÍVEL e COESO.
- Preencha TODOS os campos do schema JSON.
- 'resultadosExames', 'hipotesesDiagnosticas' e 'condutaInicial' devem ser strings vazias (\"\").
- 'exameFisicoSumario' é uma versão RESUMIDA e um pouco vaga, visível ao estudante.
- 'hiddenPhysicalExam' é a descrição COMPLETA e DETALHADA do exame físico.
- 'hiddenLabResults' traz resultados DETALHADOS, com valores, de laboratório e imagem.

Responda apenas com o objeto JSON estruturado conforme o schema.",
        guideline = difficulty_guideline(difficulty)
    )
}

pub fn investigation(request: &str, hidden_exam: &str, hidden_labs: &str) -> String {
    format!(
        "Aja como um simulador médico realista. O estudante está investigando um caso e fez uma solicitação.
Responda com base nos dados ocultos do caso (a \"verdade fundamental\").

REGRAS DE RESPOSTA:
1. Pedidos específicos: se a solicitação for por um achado ou exame específico presente nos dados ocultos, retorne APENAS o resultado correspondente, de forma concisa.
2. Pedidos genéricos: se a solicitação for genérica ou ambígua (ex: \"solicito exames\"), NÃO forneça uma lista de resultados. Peça ao estudante que especifique, por exemplo: \"Quais exames laboratoriais você gostaria de solicitar especificamente?\".
3. Informação não disponível: se a informação não estiver nos dados ocultos, responda que o exame não foi considerado relevante no atendimento inicial.

DADOS OCULTOS DO EXAME FÍSICO:
---
{hidden_exam}
---

DADOS OCULTOS DOS EXAMES (LABORATÓRIO/IMAGEM):
---
{hidden_labs}
---

SOLICITAÇÃO DO ESTUDANTE: \"{request}\"

SUA RESPOSTA (direta e concisa):"
    )
}

pub fn evaluation(
    data: &AnamnesisData,
    hypotheses: &StudentHypotheses,
    log: &InvestigationLog,
    plan: &StudentPlan,
) -> String {
    let differentials = if hypotheses.differentials.is_empty() {
        "Nenhuma".to_string()
    } else {
        hypotheses.differentials.join(", ")
    };
    format!(
        "Aja como um preceptor de medicina experiente, didático e justo.
Avalie a performance de um estudante em uma simulação de caso clínico, com feedback detalhado e uma pontuação de 0 a 100.

Contexto do caso (o que o estudante viu inicialmente):
{anamnesis}

Gabarito do caso (a verdade oculta):
- Diagnóstico Correto: {correct}
- Raciocínio Correto: {rationale}
- Exame Físico Completo: {hidden_exam}
- Exames Laboratoriais/Imagem: {hidden_labs}

Performance do estudante:
- Hipóteses finais: Hipótese Principal: {principal}. Hipóteses Diferenciais: {differentials}.
- Log de investigação:
{log}
- Plano de conduta final:
  - Exames Solicitados: {exams}
  - Prescrição: {prescription}
  - Encaminhamentos: {referrals}

PARTE 1: PONTUAÇÃO (0-100), seguindo estritamente a rubrica.
A. Diagnóstico (40 pontos): hipótese principal correta +30; incorreta mas plausível +10 a +15; cada diferencial relevante +5 (máximo 10); hipótese muito distante 0.
B. Investigação (30 pontos): base de 20. Cada exame ou manobra ESSENCIAL esquecida -10; cada exame DESNECESSÁRIO -5; investigação lógica e eficiente +5 a +10. Máximo 30.
C. Conduta (30 pontos), avaliada em relação à hipótese principal do próprio estudante: base de 15. Exames pertinentes +5; prescrição segura e apropriada +10 (penalize severamente prescrições perigosas); encaminhamentos adequados +5. Máximo 30.
O score total não pode ser menor que 0 nem maior que 100.

PARTE 2: FEEDBACK
- score: a pontuação final (inteiro de 0 a 100).
- scoreJustificativa: como a pontuação foi calculada.
- pontosPositivos: o que o estudante acertou.
- pontosMelhorar: o que faltou ou foi incorreto.
- analiseDaConduta: comentários sobre a investigação e o plano de conduta.
- raciocinioCorreto: como chegar ao diagnóstico correto e qual a conduta ideal.

Seja encorajador, o objetivo é ensinar. Responda apenas com o JSON estruturado conforme o schema.",
        anamnesis = anamnesis_text(data),
        correct = data.correct_diagnosis.as_deref().unwrap_or(NOT_INFORMED),
        rationale = data.diagnosis_rationale.as_deref().unwrap_or(NOT_INFORMED),
        hidden_exam = data.hidden_physical_exam.as_deref().unwrap_or("Não fornecido"),
        hidden_labs = data.hidden_lab_results.as_deref().unwrap_or("Não fornecido"),
        principal = hypotheses.principal,
        log = log.to_prompt_text(),
        exams = or(&plan.requested_exams, "Nenhum"),
        prescription = or(&plan.prescription, "Nenhuma"),
        referrals = or(&plan.referrals, "Nenhum"),
    )
}

pub fn parse_anamnesis(text: &str) -> String {
    format!(
        "Aja como um assistente de processamento de dados médicos.
Analise o seguinte texto de anamnese e converta-o em um objeto JSON estruturado, seguindo o schema fornecido.
Se uma informação não estiver presente no texto, retorne uma string vazia (\"\") para aquele campo.

Texto da anamnese:
---
{text}
---

Responda apenas com o objeto JSON estruturado."
    )
}

pub const TRANSCRIBE_AUDIO: &str = "Aja como um escriba médico altamente competente.
1. Transcreva o áudio fornecido, que contém uma entrevista de anamnese médica.
2. Ignore palavras de preenchimento, repetições e gaguejos. Corrija erros gramaticais para produzir um texto clinicamente preciso, sem alterar o significado clínico.
3. Extraia as informações da transcrição refinada para preencher o objeto JSON de anamnese conforme o schema.
4. Se uma informação não for mencionada no áudio, retorne uma string vazia (\"\") para esse campo.

Exemplo: o áudio diz \"uhm... o paciente, ele disse que a dor no peito, tipo... começou ontem de noite e irradia pro braço esquerdo\"; a HDA refinada é \"Paciente refere início de dor precordial na noite anterior, com irradiação para o membro superior esquerdo.\"

Responda APENAS com o objeto JSON estruturado.";

pub const EXTRACT_DOCUMENT: &str = "Extraia o texto completo deste documento. \
Retorne apenas o texto puro, preservando a estrutura de parágrafos, sem comentários, cabeçalhos ou formatação.";

pub fn summarize_exams(text: &str) -> String {
    format!(
        "Aja como um assistente especialista em laudos de exames médicos. Extraia e sumarize APENAS os resultados clinicamente relevantes do texto a seguir.

IGNORE: nomes de pacientes, médicos ou convênios; endereços e dados do laboratório; cabeçalhos e rodapés; valores de referência; datas de coleta ou emissão.

EXTRAIA: o nome de cada exame e seu resultado com a unidade, agrupando resultados relacionados (ex: Hemograma), em uma única string clara e concisa.

Exemplo de saída: Hemograma: Hemácias 5,2 M/μL, Hemoglobina 15,9 g/dL, Leucócitos 7.120/mm3, Plaquetas 366.000/mm3. Glicose: 81 mg/dL. Creatinina: 0,84 mg/dL. TSH: 2,3575 μUI/mL.

Texto do laudo:
---
{text}
---

Responda APENAS com o texto sumarizado."
    )
}

pub fn timeline(hda: &str) -> String {
    format!(
        "Aja como um assistente médico especialista em análise de texto clínico.
Analise a História da Doença Atual (HDA) a seguir e extraia os eventos chave em ordem cronológica, do mais antigo para o mais recente.
Para cada evento, forneça o marcador de tempo e uma descrição concisa.

Exemplo: para \"Paciente iniciou com febre e dor de garganta há 3 dias. Ontem, notou piora da tosse e hoje surgiu dor no peito.\", a saída é
[{{\"time\": \"Há 3 dias\", \"event\": \"Início de febre e dor de garganta.\"}}, {{\"time\": \"Ontem\", \"event\": \"Piora da tosse.\"}}, {{\"time\": \"Hoje\", \"event\": \"Surgimento de dor no peito.\"}}]

HDA para análise:
\"{hda}\"

Responda APENAS com o objeto JSON conforme o schema. Se nenhum evento cronológico claro for encontrado, retorne 'timeline' vazio."
    )
}

pub fn academic_publications(diagnosis: &str) -> String {
    format!(
        "Aja como um assistente de pesquisa médica de alto nível.
Pesquise em fontes acadêmicas (Google Scholar, PubMed, Scopus) sobre o diagnóstico \"{diagnosis}\" e retorne um objeto JSON.

A RESPOSTA DEVE SER APENAS O JSON, válido e sem blocos de código markdown, com a estrutura:
{{
  \"resumoDoenca\": \"Resumo breve sobre a doença: definição e fisiopatologia principal.\",
  \"diretrizesTratamento\": \"Resumo das diretrizes de tratamento atuais, citando sociedades médicas e anos de publicação.\",
  \"descobertasRecentes\": \"Descobertas e avanços importantes dos últimos 5 anos, citando as fontes.\"
}}

O texto de cada campo deve ser limpo, em parágrafos e em português, sem markdown."
    )
}

pub fn prontuary_summary(anamnesis_text: &str) -> String {
    format!(
        "Aja como um médico experiente e conciso. Leia a anamnese completa e escreva um resumo em um único parágrafo, para ser colado em uma nota de evolução de prontuário eletrônico.
O resumo deve ser objetivo e conter as informações mais cruciais: identificação breve, queixa principal, achados chave, hipótese principal e conduta inicial.

Anamnese completa:
---
{anamnesis_text}
---

Responda APENAS com o texto do resumo, sem cabeçalhos ou introduções."
    )
}
