//! Live calls against the Gemini API.
//!
//! These need a real key in `GEMINI_API_KEY`.
//!
//! Run with: `cargo test -p anamnesis-gemini --test live -- --ignored`

use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::reconcile::ReconciledDiagnoses;
use anamnesis_gemini::assistant::Assistant;
use anamnesis_gemini::client::{ClientSettings, GeminiClient};

fn assistant() -> Assistant<GeminiClient> {
    let key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");
    Assistant::new(GeminiClient::new(ClientSettings::new(key)).expect("client"))
}

#[tokio::test]
#[ignore]
async fn live_diagnoses_are_reconciled() {
    let data = AnamnesisData {
        age: "62".to_string(),
        sex: "Masculino".to_string(),
        chief_complaint: "Dor torácica".to_string(),
        hpi: "Dor retroesternal em aperto há 1 hora, com sudorese e náuseas.".to_string(),
        ..AnamnesisData::default()
    };

    let response = assistant().fetch_diagnoses(&data).await.unwrap();
    let reconciled = ReconciledDiagnoses::from(response);
    println!("{reconciled:#?}");
    assert!(!reconciled.is_empty());
}

#[tokio::test]
#[ignore]
async fn live_timeline() {
    let events = assistant()
        .fetch_timeline("Febre há 3 dias. Ontem iniciou tosse produtiva e hoje dispneia.")
        .await;
    println!("{events:#?}");
    assert!(!events.is_empty());
}
