use crate::aggregation::AggregationSpec;
use crate::config::OperatorConfig;
use crate::emission::EmissionPolicy;
use crate::error::{AggregationError, ConfigurationError, Stage};
use crate::operator::AggregationOperator;
use crate::partitioning::{ElementStream, PartitionedStream};
use futures::StreamExt;

fn sum_spec() -> AggregationSpec<i64, i64> {
  AggregationSpec::new(0i64, |acc, value: &i64| acc + value).combine(|a, b| a + b)
}

fn end_of_stream() -> OperatorConfig {
  OperatorConfig::new("test").with_emission(EmissionPolicy::EndOfStream)
}

async fn collect_ok<T>(operator_output: crate::operator::AggregationStream<T>) -> Vec<T> {
  operator_output.map(|r| r.unwrap()).collect().await
}

#[tokio::test]
async fn test_two_partitions_emit_sum() {
  let operator = AggregationOperator::new(sum_spec());
  let output = operator
    .run(PartitionedStream::from_partitions(vec![vec![3], vec![5]]))
    .unwrap();
  assert_eq!(collect_ok(output).await, vec![8]);
}

#[tokio::test]
async fn test_transient_round_emits_single_contribution() {
  let operator = AggregationOperator::new(sum_spec().transient(true));
  let output = operator
    .run(PartitionedStream::from_partitions(vec![vec![3], vec![5]]))
    .unwrap();
  let outputs = collect_ok(output).await;
  // Only the contribution that completed the round survives the reset.
  assert_eq!(outputs.len(), 1);
  assert!(outputs[0] == 3 || outputs[0] == 5, "got {}", outputs[0]);
}

#[tokio::test]
async fn test_passthrough_preserves_arrival_order() {
  let spec = AggregationSpec::new(0i64, |_, value: &i64| *value);
  let operator = AggregationOperator::new(spec);
  let output = operator
    .run(PartitionedStream::from_partitions(vec![vec![7, 2, 9]]))
    .unwrap();
  assert_eq!(collect_ok(output).await, vec![7, 2, 9]);
}

#[tokio::test]
async fn test_passthrough_forwards_every_contribution() {
  let spec = AggregationSpec::new(0i64, |acc, value: &i64| acc + value);
  let operator = AggregationOperator::new(spec).with_config(end_of_stream());
  let output = operator
    .run(PartitionedStream::round_robin(1..=9, 3))
    .unwrap();
  let mut outputs = collect_ok(output).await;
  outputs.sort();
  assert_eq!(outputs, vec![12, 15, 18]);
}

#[tokio::test]
async fn test_end_of_stream_emits_one_round() {
  let operator = AggregationOperator::new(sum_spec()).with_config(end_of_stream());
  let output = operator
    .run(PartitionedStream::round_robin(1..=100, 4))
    .unwrap();
  assert_eq!(collect_ok(output).await, vec![5050]);
}

#[tokio::test]
async fn test_every_element_emits_one_result_per_round() {
  let operator = AggregationOperator::new(sum_spec());
  // Partitions [1, 4], [2, 5], [3, 6] each emit their running sum twice.
  let output = operator
    .run(PartitionedStream::round_robin(1..=6, 3))
    .unwrap();
  let outputs = collect_ok(output).await;
  assert_eq!(outputs.len(), 2);
  assert_eq!(outputs[1], 1 + 5 + 2 + 7 + 3 + 9);
}

#[tokio::test]
async fn test_count_window_rounds() {
  let config = OperatorConfig::new("windows").with_emission(EmissionPolicy::count_window(2).unwrap());
  let operator = AggregationOperator::new(sum_spec().project(|s| s * 2)).with_config(config);
  let output = operator
    .run(PartitionedStream::from_partitions(vec![vec![1, 1, 1, 1], vec![2, 2, 2, 2]]))
    .unwrap();
  // Each partition closes two windows; the second round covers every element.
  let outputs = collect_ok(output).await;
  assert_eq!(outputs.len(), 2);
  assert_eq!(outputs[1], 24);
}

#[tokio::test]
async fn test_operator_is_reusable() {
  let operator = AggregationOperator::new(sum_spec()).with_config(end_of_stream());
  let first = operator
    .run(PartitionedStream::from_partitions(vec![vec![1, 2], vec![3]]))
    .unwrap();
  let second = operator
    .run(PartitionedStream::from_partitions(vec![vec![10], vec![20], vec![30]]))
    .unwrap();
  assert_eq!(collect_ok(first).await, vec![6]);
  assert_eq!(collect_ok(second).await, vec![60]);
}

#[tokio::test]
async fn test_zero_partitions_rejected_before_run() {
  let operator = AggregationOperator::new(sum_spec());
  match operator.run(PartitionedStream::from_partitions(Vec::<Vec<i64>>::new())) {
    Err(AggregationError::Configuration(ConfigurationError::ZeroPartitions)) => {}
    Err(e) => panic!("unexpected error: {}", e),
    Ok(_) => panic!("expected configuration error"),
  }
}

#[tokio::test]
async fn test_zero_partitions_passthrough_is_empty() {
  let spec = AggregationSpec::new(0i64, |acc, value: &i64| acc + value);
  let operator = AggregationOperator::new(spec);
  let output = operator
    .run(PartitionedStream::from_partitions(Vec::<Vec<i64>>::new()))
    .unwrap();
  assert!(collect_ok(output).await.is_empty());
}

#[tokio::test]
async fn test_invalid_config_rejected() {
  let operator = AggregationOperator::new(sum_spec())
    .with_config(OperatorConfig::default().with_channel_capacity(0));
  let result = operator.run(PartitionedStream::from_partitions(vec![vec![1]]));
  assert!(matches!(
    result,
    Err(AggregationError::Configuration(
      ConfigurationError::ZeroChannelCapacity
    ))
  ));
}

#[tokio::test]
async fn test_fold_failure_aborts_run() {
  let spec = AggregationSpec::try_new(0i64, |acc, value: &i64| {
    if *value == 13 {
      Err("unlucky element".into())
    } else {
      Ok(acc + value)
    }
  })
  .combine(|a, b| a + b);
  let operator = AggregationOperator::new(spec).with_config(end_of_stream());
  let output = operator
    .run(PartitionedStream::from_partitions(vec![vec![1, 2], vec![13, 4]]))
    .unwrap();

  let results: Vec<_> = output.collect().await;
  let last = results.last().expect("run produced no output");
  match last {
    Err(AggregationError::UserFunction {
      stage, partition, ..
    }) => {
      assert_eq!(*stage, Stage::Fold);
      assert_eq!(*partition, Some(1));
    }
    other => panic!("expected fold failure, got {:?}", other),
  }
  assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
}

#[tokio::test]
async fn test_combine_failure_aborts_run() {
  let spec = AggregationSpec::new(0i64, |acc, value: &i64| acc + value)
    .try_combine(|_, _| Err("combine exploded".into()));
  let operator = AggregationOperator::new(spec).with_config(end_of_stream());
  let mut output = operator
    .run(PartitionedStream::from_partitions(vec![vec![1], vec![2]]))
    .unwrap();

  let first = output.next().await.expect("expected an error");
  assert_eq!(first.unwrap_err().stage(), Some(Stage::Combine));
  assert!(output.next().await.is_none());
  assert!(output.is_cancelled());
}

#[tokio::test]
async fn test_panicking_partition_is_reported() {
  let spec = AggregationSpec::new(0i64, |acc, value: &i64| {
    if *value < 0 {
      panic!("negative input");
    }
    acc + value
  })
  .combine(|a, b| a + b);
  let operator = AggregationOperator::new(spec).with_config(end_of_stream());
  let output = operator
    .run(PartitionedStream::from_partitions(vec![vec![1], vec![-1]]))
    .unwrap();

  let results: Vec<_> = output.collect().await;
  match results.last() {
    Some(Err(AggregationError::PartitionPanicked { partition, message })) => {
      assert_eq!(*partition, 1);
      assert!(message.contains("negative input"));
    }
    other => panic!("expected partition panic, got {:?}", other),
  }
}

#[tokio::test]
async fn test_cancel_stops_run() {
  let operator = AggregationOperator::new(sum_spec());
  let pending = PartitionedStream::from_streams(vec![
    Box::pin(futures::stream::pending::<i64>()) as ElementStream<i64>,
    Box::pin(futures::stream::pending::<i64>()) as ElementStream<i64>,
  ]);
  let mut output = operator.run(pending).unwrap();
  output.cancel();
  assert!(output.next().await.is_none());
}

fn count_spec() -> AggregationSpec<u32, u64> {
  AggregationSpec::new(0u64, |count, _: &u32| count + 1).combine(|a, b| a + b)
}

#[tokio::test]
async fn test_count_windows_count_each_element_once() {
  let config = OperatorConfig::new("count").with_emission(EmissionPolicy::count_window(5).unwrap());
  let operator = AggregationOperator::new(count_spec()).with_config(config);
  let output = operator
    .run(PartitionedStream::round_robin(0..100u32, 4))
    .unwrap();
  assert_eq!(collect_ok(output).await, vec![20, 40, 60, 80, 100]);
}

#[tokio::test]
async fn test_every_element_sum_combines_cumulative_states() {
  let operator = AggregationOperator::new(count_spec());
  // Partitions of four elements emit running counts 1, 2, 3, 4 each.
  let output = operator
    .run(PartitionedStream::round_robin(0..8u32, 2))
    .unwrap();
  let outputs = collect_ok(output).await;
  assert_eq!(outputs.len(), 4);
  assert_eq!(outputs[3], 2 * (1 + 2 + 3 + 4));
}

#[tokio::test]
async fn test_key_routed_partitions_feed_a_run() {
  let words = ["ant", "bee", "ant", "cat", "bee", "ant"];
  let input = futures::stream::iter(words.into_iter().map(|w| w.to_string()));
  let partitions = PartitionedStream::partition_by_key(input, 3, 2, |word: &String| word.clone());
  let spec = AggregationSpec::new(0u64, |count, _: &String| count + 1).combine(|a, b| a + b);
  let operator = AggregationOperator::new(spec).with_config(end_of_stream());
  let output = operator.run(partitions).unwrap();
  assert_eq!(collect_ok(output).await, vec![6]);
}
