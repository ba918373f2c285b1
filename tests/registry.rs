// SPDX-License-Identifier: MIT OR Apache-2.0
use sillylog::{
    DefinitionKind, Error, FormatterOptions, InMemoryHandler, LevelFormatter, Logger, Rank, SeverityTable,
};
use std::sync::{Arc, Barrier};

#[test]
fn extension_severity_end_to_end() {
    let table = Arc::new(SeverityTable::with_defaults());
    let notice = table.register("NOTICE", Rank(25), None).unwrap();
    assert_eq!(notice.method_name, "notice");

    let options = FormatterOptions::default().with_default_template("[%(levelname)s] %(message)s");
    let formatter = Arc::new(LevelFormatter::new(&table, options).unwrap());
    let memory = Arc::new(InMemoryHandler::new(formatter));
    let logger = Logger::new("ext", table);
    logger.add_handler(memory.clone());

    logger.log_named("notice", format_args!("{} queued", 3)).unwrap();
    logger.set_level(Rank::WARNING);
    logger.log_named("notice", format_args!("filtered")).unwrap();
    assert_eq!(memory.drain_logs(), "[NOTICE] 3 queued");
}

#[test]
fn duplicates_are_rejected_by_kind() {
    let table = SeverityTable::with_defaults();
    table.register("AUDIT", Rank(35), Some("audit")).unwrap();

    let kind = |r: sillylog::Result<_>| match r {
        Err(Error::DuplicateDefinition { kind, .. }) => kind,
        other => panic!("expected duplicate, got {other:?}"),
    };
    assert_eq!(kind(table.register("audit", Rank(36), Some("audit2"))), DefinitionKind::SeverityName);
    assert_eq!(kind(table.register("AUDIT2", Rank(36), Some("audit"))), DefinitionKind::MethodName);
    assert_eq!(kind(table.register("FLUSHY", Rank(37), Some("flush"))), DefinitionKind::LoggerMethod);
    assert_eq!(kind(table.register("OTHER", Rank(35), Some("other"))), DefinitionKind::Rank);
    // nothing half-registered
    assert!(table.by_name("AUDIT2").is_none());
    assert!(table.by_method("audit2").is_none());
}

#[test]
fn default_registration_cannot_repeat() {
    let table = SeverityTable::with_defaults();
    assert!(matches!(
        table.register("STATUS", Rank::STATUS, Some("status")),
        Err(Error::DuplicateDefinition { .. })
    ));
}

#[test]
fn racing_registrations_have_one_winner() {
    let table = Arc::new(SeverityTable::with_defaults());
    let barrier = Arc::new(Barrier::new(8));
    let results: Vec<bool> = (0..8)
        .map(|i| {
            let table = table.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                table.register("RACE", Rank(100 + i), Some("race")).is_ok()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|t| t.join().unwrap())
        .collect();
    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(table.severities().iter().filter(|s| s.name == "RACE").count(), 1);
}

#[test]
fn global_table_is_shared() {
    let a = SeverityTable::global();
    let b = SeverityTable::global();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.contains_rank(Rank::TRACE));
    assert!(a.contains_rank(Rank::STATUS));
}
