use crate::metrics::{
  record_contribution, record_elements_folded, record_failure, record_passthrough, record_round,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

#[test]
fn test_counters_are_recorded() {
  let recorder = DebuggingRecorder::new();
  let snapshotter = recorder.snapshotter();

  metrics::with_local_recorder(&recorder, || {
    record_elements_folded("op", 0, 5);
    record_elements_folded("op", 1, 2);
    record_contribution("op", 0);
    record_round("op");
    record_round("op");
    record_passthrough("op");
    record_failure("op", "fold");
  });

  let snapshot = snapshotter.snapshot().into_vec();
  let counter_total = |name: &str| -> u64 {
    snapshot
      .iter()
      .filter(|(key, _, _, _)| key.key().name() == name)
      .map(|(_, _, _, value)| match value {
        DebugValue::Counter(v) => *v,
        _ => 0,
      })
      .sum()
  };
  assert_eq!(counter_total("streamweave_aggregation_elements_total"), 7);
  assert_eq!(counter_total("streamweave_aggregation_contributions_total"), 1);
  assert_eq!(counter_total("streamweave_aggregation_rounds_total"), 2);
  assert_eq!(counter_total("streamweave_aggregation_passthrough_total"), 1);
  assert_eq!(counter_total("streamweave_aggregation_failures_total"), 1);
}

#[test]
fn test_recording_without_recorder_is_noop() {
  record_round("unobserved");
  record_failure("unobserved", "task");
}
