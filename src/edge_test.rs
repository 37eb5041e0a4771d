use crate::edge::Edge;

#[test]
fn test_accessors_and_reverse() {
  let edge = Edge::new("a", "b", 3.5);
  assert_eq!(*edge.source(), "a");
  assert_eq!(*edge.target(), "b");
  assert_eq!(*edge.value(), 3.5);

  let reversed = edge.reverse();
  assert_eq!(reversed.into_parts(), ("b", "a", 3.5));
}

#[test]
fn test_from_tuple_and_display() {
  let edge: Edge<u32, u32> = (1, 2, 7).into();
  assert_eq!(edge, Edge::new(1, 2, 7));
  assert_eq!(edge.to_string(), "1 -> 2 (7)");
}

#[test]
fn test_serde_shape() {
  let edge = Edge::unweighted(4u64, 5u64);
  let json = serde_json::to_string(&edge).unwrap();
  assert_eq!(json, r#"{"source":4,"target":5,"value":null}"#);
  let parsed: Edge<u64, ()> = serde_json::from_str(&json).unwrap();
  assert_eq!(parsed, edge);
}
