//! Engine lifecycle tests
//!
//! Drive the poll-cycle engine end to end against the virtual PLC and a
//! scripted transport:
//! - state progression and termination on cancel
//! - no batches once cancellation is observed
//! - validation and transport faults
//! - supervisor wait

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use adssync::bootstrap;
use adssync::runtime::EngineConfig;
use adssync::{
    DataType, EngineOutcome, EngineState, PollEngine, SymbolMode, SymbolSpec, SymbolTable,
    SymbolValue, ValueStore, VirtualPlc,
};
use support::{example_store, example_values, wait_for_cycles, CallKind, ScriptedTransport};

#[tokio::test]
async fn test_states_progress_to_terminated() {
    let store = example_store();
    let plc = VirtualPlc::seeded_from("plc", &store);

    let handle = PollEngine::new(plc, store, EngineConfig::default()).spawn();
    let mut states = handle.subscribe();

    tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|s| *s == EngineState::Running),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(handle.is_connected());

    let outcome = handle.stop().await.unwrap();
    assert_eq!(outcome, EngineOutcome::Stopped);
    assert_eq!(*states.borrow(), EngineState::Terminated);
}

#[tokio::test]
async fn test_cancel_stops_batches_within_one_cycle() {
    let interval = Duration::from_millis(10);
    let token = CancellationToken::new();
    let transport = ScriptedTransport::new(example_values(), token.clone())
        .with_batch_latency(Duration::from_millis(3));
    let journal = transport.journal();

    let handle = PollEngine::new(
        transport,
        example_store(),
        EngineConfig {
            cycle_interval: interval,
        },
    )
    .spawn_with_token(token.clone());
    wait_for_cycles(&handle, 3).await;

    let cancelled_at = Instant::now();
    token.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(2), handle.wait())
        .await
        .expect("engine did not terminate after cancel")
        .unwrap();
    let stop_latency = cancelled_at.elapsed();

    assert_eq!(outcome, EngineOutcome::Stopped);
    // At most the rest of the cycle in flight when cancel arrived
    assert!(journal.batches_after_cancel() <= 2);
    assert!(
        stop_latency < Duration::from_millis(500),
        "stop took {:?}",
        stop_latency
    );

    let calls = journal.calls();
    assert_eq!(calls.last().map(|c| c.kind), Some(CallKind::Close));
    assert_eq!(journal.count(CallKind::Open), 1);
    assert_eq!(journal.count(CallKind::Close), 1);

    // Nothing touches the transport after termination
    let settled = calls.len();
    tokio::time::sleep(interval * 3).await;
    assert_eq!(journal.calls().len(), settled);
}

#[tokio::test]
async fn test_cycle_order_write_before_read() {
    let token = CancellationToken::new();
    let transport = ScriptedTransport::new(example_values(), token.clone());
    let journal = transport.journal();

    let handle =
        PollEngine::new(transport, example_store(), EngineConfig::default()).spawn_with_token(token);
    wait_for_cycles(&handle, 2).await;
    handle.stop().await.unwrap();

    let kinds: Vec<CallKind> = journal.calls().iter().map(|c| c.kind).collect();
    assert_eq!(
        &kinds[..5],
        &[
            CallKind::Open,
            CallKind::Lookup,
            CallKind::Lookup,
            CallKind::Write,
            CallKind::Read
        ]
    );
}

#[tokio::test]
async fn test_local_set_reaches_plc_and_plc_changes_reach_store() {
    let store = example_store();
    let plc = VirtualPlc::seeded_from("plc", &store);
    let plc_side = plc.handle();

    let handle = PollEngine::new(plc, store.clone(), EngineConfig::default()).spawn();
    wait_for_cycles(&handle, 1).await;

    store.set("GVL.a", true);
    plc_side.set_value("GVL.b", 1234i64);

    let seen = handle.stats().cycles_completed;
    wait_for_cycles(&handle, seen + 2).await;

    assert_eq!(plc_side.value("GVL.a"), Some(SymbolValue::Bool(true)));
    assert_eq!(store.get("GVL.b"), Some(SymbolValue::Int(1234)));
    assert_eq!(store.write_shadow()["GVL.a"], SymbolValue::Bool(true));

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_runtime_registration_joins_next_cycle() {
    let store = Arc::new(ValueStore::new(SymbolTable::build(vec![
        SymbolSpec::new("GVL.b", DataType::Int, SymbolMode::ReadOnly),
        SymbolSpec::new("GVL.late", DataType::Int, SymbolMode::Inactive),
    ])));
    let plc = VirtualPlc::seeded_from("plc", &store).with_symbol("GVL.late", 0i64);
    let plc_side = plc.handle();

    let handle = PollEngine::new(plc, store.clone(), EngineConfig::default()).spawn();
    wait_for_cycles(&handle, 1).await;
    assert_eq!(plc_side.counters().writes, 0);

    assert_eq!(store.register_write(&["GVL.late", "GVL.ghost"]), 1);
    store.set("GVL.late", 41i64);

    let seen = handle.stats().cycles_completed;
    wait_for_cycles(&handle, seen + 2).await;
    assert_eq!(plc_side.value("GVL.late"), Some(SymbolValue::Int(41)));

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_missing_symbol_faults_before_any_cycle() {
    let store = example_store();
    let plc = VirtualPlc::seeded_from("plc", &store).without_symbol("GVL.a");
    let plc_side = plc.handle();

    let handle = PollEngine::new(plc, store.clone(), EngineConfig::default()).spawn();
    let outcome = handle.wait().await.unwrap();

    assert_eq!(
        outcome,
        EngineOutcome::MissingSymbols(vec!["GVL.a".to_string()])
    );
    assert_eq!(plc_side.counters().batches(), 0);
    // Store keeps its defaults and stays usable
    assert_eq!(store.get("GVL.b"), Some(SymbolValue::Int(0)));
    assert!(store.set("GVL.a", true));
}

#[tokio::test]
async fn test_read_failure_is_terminal_without_reconnect() {
    let token = CancellationToken::new();
    let transport = ScriptedTransport::new(example_values(), token.clone()).fail_read_at(3);
    let journal = transport.journal();
    let store = example_store();

    let handle = PollEngine::new(transport, store.clone(), EngineConfig::default())
        .spawn_with_token(token);
    let mut states = handle.subscribe();
    let outcome = handle.wait().await.unwrap();

    assert!(matches!(outcome, EngineOutcome::TransportFailed(_)));
    assert_eq!(*states.borrow_and_update(), EngineState::Terminated);
    assert_eq!(journal.count(CallKind::Open), 1);
    assert_eq!(journal.count(CallKind::Read), 3);
    assert_eq!(journal.count(CallKind::Close), 1);
    // Values from the two good cycles are kept
    assert_eq!(store.get("GVL.b"), Some(SymbolValue::Int(7)));
}

#[tokio::test]
async fn test_engine_stats_track_cycles() {
    let store = example_store();
    let plc = VirtualPlc::seeded_from("plc", &store);

    let handle = PollEngine::new(plc, store, EngineConfig::default()).spawn();
    wait_for_cycles(&handle, 5).await;

    let stats = handle.stats();
    assert!(stats.cycles_completed >= 5);
    assert!(stats.last_error.is_none());

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_supervise_stops_after_duration() {
    let store = example_store();
    let plc = VirtualPlc::seeded_from("plc", &store);
    let plc_side = plc.handle();
    let handle = PollEngine::new(plc, store.clone(), EngineConfig::default()).spawn();

    let outcome = bootstrap::supervise(handle, Some(Duration::from_millis(60)))
        .await
        .unwrap();

    assert_eq!(outcome, EngineOutcome::Stopped);
    assert_eq!(plc_side.counters().closes, 1);
    assert!(plc_side.counters().reads > 0);

    let snapshot = bootstrap::final_snapshot(&store);
    assert_eq!(snapshot.len(), 2);
}

#[tokio::test]
async fn test_supervise_returns_when_engine_faults() {
    let store = example_store();
    let plc = VirtualPlc::seeded_from("plc", &store).refuse_open();
    let handle = PollEngine::new(plc, store, EngineConfig::default()).spawn();

    let outcome = tokio::time::timeout(Duration::from_secs(5), bootstrap::supervise(handle, None))
        .await
        .expect("supervisor did not notice the fault")
        .unwrap();

    assert!(matches!(outcome, EngineOutcome::ConnectFailed(_)));
}
