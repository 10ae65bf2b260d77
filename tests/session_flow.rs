use std::io::Write;
use std::sync::Arc;

use inrep_rs::{
    EngineConfig, IrtError, ItemBank, ItemId, LikertScale, SessionState, StopReason,
};

const BFI_ITEMS: &str = include_str!("data/bfi_items.json");

const STUDY_CONFIG: &str = r#"
[estimator]
max_iter = 20
tol = 0.001
update_rule = "newton"

[population]
mean = 0.0
sd = 1.0

[design]
fixed_items = ["BFE_01", "BFV_01", "BFG_01", "BFN_01", "BFO_01"]

[design.stopping]
max_items = 10
min_items = 5
"#;

fn bfi_bank() -> Arc<ItemBank> {
    Arc::new(ItemBank::from_json_str(LikertScale::default(), BFI_ITEMS).unwrap())
}

#[test]
fn bank_fixture_loads() {
    let bank = bfi_bank();
    assert_eq!(bank.len(), 20);
    assert!(bank.get(&ItemId::from("BFE_01")).unwrap().reverse_coded());
    assert!(bank.get(&ItemId::from("BFO_04")).unwrap().text().is_some());
}

#[test]
fn bank_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BFI_ITEMS.as_bytes()).unwrap();
    let bank = ItemBank::load_json(LikertScale::default(), file.path()).unwrap();
    assert_eq!(bank.len(), 20);
}

#[test]
fn config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(STUDY_CONFIG.as_bytes()).unwrap();
    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.design.fixed_items.len(), 5);
    assert_eq!(config.design.stopping.max_items, 10);

    assert!(matches!(
        EngineConfig::load(file.path().with_extension("missing")),
        Err(IrtError::Io(_))
    ));
}

#[test]
fn five_fixed_then_five_adaptive() {
    let config = EngineConfig::from_toml_str(STUDY_CONFIG).unwrap();
    let mut session = config.session(bfi_bank()).unwrap();

    let mut administered = Vec::new();
    while let Some(id) = session.next_item() {
        let item = session.bank().require(&id).unwrap();
        let raw = if item.reverse_coded() { 2 } else { 4 };
        session.record_response(&id, raw).unwrap();
        administered.push(id);
    }

    let fixed: Vec<&str> = administered[..5].iter().map(|id| id.as_str()).collect();
    assert_eq!(fixed, ["BFE_01", "BFV_01", "BFG_01", "BFN_01", "BFO_01"]);
    assert_eq!(administered.len(), 10);
    assert_eq!(session.state(), SessionState::Done);
    assert_eq!(session.stop_reason(), Some(StopReason::MaxItems));
    assert_eq!(session.trace().len(), 10);
    assert_eq!(session.pool().len(), 10);

    // Every answer is keyed to 4, so the test-taker is above the middle.
    let summary = session.summary(&config.population).unwrap();
    assert!(summary.theta > 0.0);
    assert!(summary.percentile > 50.0);
    assert!((0.0..=1.0).contains(&summary.reliability));

    let classical = session.classical_score().unwrap();
    assert_eq!(classical.mean, 4.0);
    assert_eq!(classical.n_items, 10);
}

#[test]
fn standard_error_stopping_rule() {
    let config = EngineConfig::from_toml_str(
        r#"
        [design.stopping]
        max_items = 20
        min_items = 4
        min_sem = 0.6
        "#,
    )
    .unwrap();
    let mut session = config.session(bfi_bank()).unwrap();
    let est = session.run(|_| 3).unwrap();
    assert!(session.is_done());
    match session.stop_reason() {
        Some(StopReason::StandardError) => assert!(est.standard_error <= 0.6),
        Some(StopReason::MaxItems) => assert_eq!(session.responses().len(), 20),
        other => panic!("unexpected stop reason {other:?}"),
    }
    assert!(session.responses().len() >= 4);
}

#[test]
fn concurrent_sessions_share_a_bank() {
    let bank = bfi_bank();
    let config = EngineConfig::from_toml_str(STUDY_CONFIG).unwrap();

    let handles: Vec<_> = [1, 3, 5]
        .into_iter()
        .map(|answer| {
            let mut session = config.session(Arc::clone(&bank)).unwrap();
            std::thread::spawn(move || {
                session
                    .run(|item| {
                        if item.reverse_coded() {
                            6 - answer
                        } else {
                            answer
                        }
                    })
                    .unwrap()
            })
        })
        .collect();

    let thetas: Vec<f64> = handles
        .into_iter()
        .map(|h| h.join().unwrap().theta)
        .collect();
    assert_eq!(thetas[0], -3.0);
    assert!(thetas[1].abs() < 1.0);
    assert_eq!(thetas[2], 3.0);
}

#[test]
fn fixed_item_missing_from_bank_is_rejected() {
    let config = EngineConfig::from_toml_str(
        r#"
        [design]
        fixed_items = ["BFE_01", "XYZ_99"]
        "#,
    )
    .unwrap();
    assert!(matches!(
        config.session(bfi_bank()),
        Err(IrtError::UnknownItem(_))
    ));
}
